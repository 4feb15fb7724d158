//! Balance Ledger: raw balances per (holder, asset) and the USD aggregate
//!
//! The aggregate moves by exactly the USD delta passed to each credit or
//! debit. Standing balances are never re-priced.
//!
//! Every mutation computes all new values with checked arithmetic before
//! writing any of them, so a failed call leaves the ledger untouched.

use bank_types::asset::Asset;
use bank_types::ids::HolderId;
use bank_types::numeric::{RawAmount, Usd6, U256};
use std::collections::HashMap;

use crate::errors::VaultError;

/// Snapshot of one entry and the aggregate, taken before a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerCheckpoint {
    asset: Asset,
    holder: HolderId,
    /// `None` if the entry did not exist yet
    balance: Option<RawAmount>,
    total_usd: Usd6,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceLedger {
    /// Balances: holder -> (asset -> raw amount)
    balances: HashMap<HolderId, HashMap<Asset, RawAmount>>,
    total_usd: Usd6,
    bank_cap: Usd6,
}

impl BalanceLedger {
    /// Create an empty ledger. The cap never changes afterwards.
    pub fn new(bank_cap: Usd6) -> Self {
        Self {
            balances: HashMap::new(),
            total_usd: U256::ZERO,
            bank_cap,
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn balance_of(&self, asset: &Asset, holder: &HolderId) -> RawAmount {
        self.balances
            .get(holder)
            .and_then(|assets| assets.get(asset))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// All entries of a holder, including zero balances.
    pub fn holder_balances(&self, holder: &HolderId) -> Option<&HashMap<Asset, RawAmount>> {
        self.balances.get(holder)
    }

    pub fn total_value(&self) -> Usd6 {
        self.total_usd
    }

    pub fn cap(&self) -> Usd6 {
        self.bank_cap
    }

    /// Aggregate after adding `usd_delta`, or `CapExceeded` if above the cap.
    pub fn check_cap(&self, usd_delta: Usd6) -> Result<Usd6, VaultError> {
        let attempted = self
            .total_usd
            .checked_add(usd_delta)
            .ok_or(VaultError::Overflow)?;
        if attempted > self.bank_cap {
            return Err(VaultError::CapExceeded {
                cap: self.bank_cap,
                attempted,
            });
        }
        Ok(attempted)
    }

    // ───────────────────────── Credit ─────────────────────────

    /// Dry run of [`credit`](Self::credit): fails exactly when `credit` would.
    pub fn check_credit(
        &self,
        asset: &Asset,
        holder: &HolderId,
        raw_amount: RawAmount,
        usd_delta: Usd6,
    ) -> Result<(RawAmount, Usd6), VaultError> {
        let new_balance = self
            .balance_of(asset, holder)
            .checked_add(raw_amount)
            .ok_or(VaultError::Overflow)?;
        let new_total = self
            .total_usd
            .checked_add(usd_delta)
            .ok_or(VaultError::Overflow)?;
        Ok((new_balance, new_total))
    }

    /// Add `raw_amount` to the entry and `usd_delta` to the aggregate.
    ///
    /// The cap is the caller's precondition; see [`check_cap`](Self::check_cap).
    pub fn credit(
        &mut self,
        asset: &Asset,
        holder: &HolderId,
        raw_amount: RawAmount,
        usd_delta: Usd6,
    ) -> Result<(), VaultError> {
        let (new_balance, new_total) = self.check_credit(asset, holder, raw_amount, usd_delta)?;
        self.balances
            .entry(*holder)
            .or_default()
            .insert(*asset, new_balance);
        self.total_usd = new_total;
        Ok(())
    }

    // ───────────────────────── Debit ─────────────────────────

    /// Subtract `raw_amount` from the entry and `usd_delta` from the aggregate.
    pub fn debit(
        &mut self,
        asset: &Asset,
        holder: &HolderId,
        raw_amount: RawAmount,
        usd_delta: Usd6,
    ) -> Result<(), VaultError> {
        let available = self.balance_of(asset, holder);
        let new_balance =
            available
                .checked_sub(raw_amount)
                .ok_or(VaultError::InsufficientBalance {
                    asset: *asset,
                    required: raw_amount,
                    available,
                })?;
        let new_total = self
            .total_usd
            .checked_sub(usd_delta)
            .ok_or(VaultError::Underflow)?;

        // A zero debit against a missing entry leaves it missing.
        if let Some(entry) = self
            .balances
            .get_mut(holder)
            .and_then(|assets| assets.get_mut(asset))
        {
            *entry = new_balance;
        }
        self.total_usd = new_total;
        Ok(())
    }

    // ───────────────────────── Rollback ─────────────────────────

    pub fn checkpoint(&self, asset: &Asset, holder: &HolderId) -> LedgerCheckpoint {
        LedgerCheckpoint {
            asset: *asset,
            holder: *holder,
            balance: self
                .balances
                .get(holder)
                .and_then(|assets| assets.get(asset))
                .copied(),
            total_usd: self.total_usd,
        }
    }

    /// Put the entry and aggregate back to what `checkpoint` captured.
    pub fn restore(&mut self, checkpoint: LedgerCheckpoint) {
        match checkpoint.balance {
            Some(balance) => {
                self.balances
                    .entry(checkpoint.holder)
                    .or_default()
                    .insert(checkpoint.asset, balance);
            }
            None => {
                if let Some(assets) = self.balances.get_mut(&checkpoint.holder) {
                    assets.remove(&checkpoint.asset);
                    if assets.is_empty() {
                        self.balances.remove(&checkpoint.holder);
                    }
                }
            }
        }
        self.total_usd = checkpoint.total_usd;
    }
}
