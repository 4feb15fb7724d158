//! Vault: deposit and withdraw orchestration
//!
//! Ties the valuation converter, the balance ledger and the external
//! collaborators together under one ordering discipline:
//!
//! - Deposits value the amount, check the bank cap and the credit, and only
//!   then pull tokens in. A rejected deposit never holds a taken token.
//! - Withdrawals debit the ledger before the transfer out. Anything that
//!   re-enters during the transfer sees the reduced balance. If the transfer
//!   fails, the debit is rolled back from a checkpoint.
//! - Every operation holds the reentrancy guard from its first read to its
//!   last write. Nested operations fail with `ReentrancyRejected`; reads
//!   stay available.
//!
//! State sits behind `RefCell`/`Cell` so that operations take `&self` and a
//! collaborator holding a handle to the vault can actually attempt to
//! re-enter it. No borrow is held across a collaborator call.

use bank_types::asset::{Asset, TokenAddress};
use bank_types::ids::HolderId;
use bank_types::numeric::{format_usd6, RawAmount, Usd6, U256};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::VaultConfig;
use crate::errors::{LimitUnit, TransferDirection, VaultError};
use crate::events::{
    AssetWithdrawLimitUpdated, ContractEvent, Deposit, OracleUpdated, PausedStateChanged,
    PriceSourceUpdated, WithdrawLimitUpdated, Withdrawal,
};
use crate::ledger::BalanceLedger;
use crate::oracle::{AssetTransfer, PriceOracle, TokenMetadata};
use crate::security::{Capability, ReentrancyGuard, ReentrancyLock, Role};
use crate::valuation::ValuationConverter;

/// Mutable settings changed through capability-gated entry points.
struct Settings {
    /// Default feed; also values tokens without their own source
    oracle: Rc<dyn PriceOracle>,
    price_sources: HashMap<TokenAddress, Rc<dyn PriceOracle>>,
    /// Zero means unlimited
    max_withdraw_usd: Usd6,
    /// Raw-unit limits; absent means unlimited
    asset_withdraw_limits: HashMap<Asset, RawAmount>,
    max_price_age_secs: Option<u64>,
    paused: bool,
}

impl Settings {
    fn oracle_for(&self, asset: &Asset) -> Rc<dyn PriceOracle> {
        asset
            .token_address()
            .and_then(|token| self.price_sources.get(token))
            .unwrap_or(&self.oracle)
            .clone()
    }
}

/// USD-capped custody vault.
pub struct Vault {
    ledger: RefCell<BalanceLedger>,
    settings: RefCell<Settings>,
    deposit_count: Cell<u64>,
    withdrawal_count: Cell<u64>,
    /// Emitted events log (append-only)
    events: RefCell<Vec<ContractEvent>>,
    guard: ReentrancyGuard,
    metadata: Rc<dyn TokenMetadata>,
    transfers: Rc<dyn AssetTransfer>,
}

impl Vault {
    /// Create a vault. The bank cap from `config` is fixed for its lifetime.
    pub fn new(
        config: &VaultConfig,
        oracle: Rc<dyn PriceOracle>,
        metadata: Rc<dyn TokenMetadata>,
        transfers: Rc<dyn AssetTransfer>,
    ) -> Result<Self, VaultError> {
        config.validate()?;
        let bank_cap = config.bank_cap_usd6()?;
        let max_withdraw_usd = config.max_withdraw_usd6()?;

        info!(
            bank_cap_usd = %format_usd6(bank_cap),
            max_withdraw_usd = %format_usd6(max_withdraw_usd),
            max_price_age_secs = ?config.max_price_age_secs,
            feed = %oracle.feed_id(),
            "Vault initialized"
        );

        Ok(Self {
            ledger: RefCell::new(BalanceLedger::new(bank_cap)),
            settings: RefCell::new(Settings {
                oracle,
                price_sources: HashMap::new(),
                max_withdraw_usd,
                asset_withdraw_limits: HashMap::new(),
                max_price_age_secs: config.max_price_age_secs,
                paused: false,
            }),
            deposit_count: Cell::new(0),
            withdrawal_count: Cell::new(0),
            events: RefCell::new(Vec::new()),
            guard: ReentrancyGuard::new(),
            metadata,
            transfers,
        })
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Deposit native currency that arrived with the call.
    pub fn deposit_native(&self, holder: HolderId, amount: RawAmount) -> Result<Deposit, VaultError> {
        self.deposit(holder, Asset::Native, amount)
    }

    /// Deposit a token, pulled from the holder once all checks pass.
    pub fn deposit_token(
        &self,
        holder: HolderId,
        token: TokenAddress,
        amount: RawAmount,
    ) -> Result<Deposit, VaultError> {
        self.deposit(holder, Asset::Token(token), amount)
    }

    /// Credit `amount` of `asset` to `holder`.
    ///
    /// Order: zero check, valuation, cap check, credit dry run, token pull,
    /// ledger credit, counter, event.
    pub fn deposit(
        &self,
        holder: HolderId,
        asset: Asset,
        amount: RawAmount,
    ) -> Result<Deposit, VaultError> {
        let _lock = self.enter("deposit")?;
        self.try_deposit(holder, asset, amount).inspect_err(|e| {
            warn!(%holder, %asset, %amount, error = %e, "Deposit rejected");
        })
    }

    fn try_deposit(
        &self,
        holder: HolderId,
        asset: Asset,
        amount: RawAmount,
    ) -> Result<Deposit, VaultError> {
        self.check_not_paused()?;
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }

        let usd_value = self.value_of(&asset, amount)?;
        {
            let ledger = self.ledger.borrow();
            ledger.check_cap(usd_value)?;
            ledger.check_credit(&asset, &holder, amount, usd_value)?;
        }
        let sequence = next_count(&self.deposit_count)?;

        if !asset.is_native() {
            self.transfers
                .transfer_in(&asset, &holder, amount)
                .map_err(|e| VaultError::TransferFailed {
                    direction: TransferDirection::In,
                    reason: e.reason,
                })?;
        }

        self.ledger
            .borrow_mut()
            .credit(&asset, &holder, amount, usd_value)?;
        self.deposit_count.set(sequence);

        let event = Deposit {
            event_id: Uuid::now_v7(),
            sequence,
            asset,
            holder,
            amount,
            usd_value,
        };
        self.emit(ContractEvent::Deposit(event.clone()));

        info!(
            %holder,
            %asset,
            %amount,
            usd = %format_usd6(usd_value),
            total_usd = %format_usd6(self.total_value()),
            sequence,
            "Deposit committed"
        );
        Ok(event)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Debit `amount` of `asset` from `holder` and send it out of custody.
    ///
    /// Order: zero check, balance check, valuation, limit checks, ledger
    /// debit, transfer out, counter, event.
    pub fn withdraw(
        &self,
        holder: HolderId,
        asset: Asset,
        amount: RawAmount,
    ) -> Result<Withdrawal, VaultError> {
        let _lock = self.enter("withdraw")?;
        self.try_withdraw(holder, asset, amount).inspect_err(|e| {
            warn!(%holder, %asset, %amount, error = %e, "Withdrawal rejected");
        })
    }

    fn try_withdraw(
        &self,
        holder: HolderId,
        asset: Asset,
        amount: RawAmount,
    ) -> Result<Withdrawal, VaultError> {
        self.check_not_paused()?;
        if amount.is_zero() {
            return Err(VaultError::ZeroAmount);
        }

        let available = self.balance_of(&asset, &holder);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                asset,
                required: amount,
                available,
            });
        }

        let usd_value = self.value_of(&asset, amount)?;
        self.check_withdraw_limits(&asset, amount, usd_value)?;
        let sequence = next_count(&self.withdrawal_count)?;

        // Debit before the transfer: re-entrant readers see the new balance.
        let checkpoint = {
            let mut ledger = self.ledger.borrow_mut();
            let checkpoint = ledger.checkpoint(&asset, &holder);
            ledger.debit(&asset, &holder, amount, usd_value)?;
            checkpoint
        };

        if let Err(e) = self.transfers.transfer_out(&asset, &holder, amount) {
            self.ledger.borrow_mut().restore(checkpoint);
            return Err(VaultError::TransferFailed {
                direction: TransferDirection::Out,
                reason: e.reason,
            });
        }

        self.withdrawal_count.set(sequence);

        let event = Withdrawal {
            event_id: Uuid::now_v7(),
            sequence,
            asset,
            holder,
            amount,
            usd_value,
        };
        self.emit(ContractEvent::Withdrawal(event.clone()));

        info!(
            %holder,
            %asset,
            %amount,
            usd = %format_usd6(usd_value),
            total_usd = %format_usd6(self.total_value()),
            sequence,
            "Withdrawal committed"
        );
        Ok(event)
    }

    fn check_withdraw_limits(
        &self,
        asset: &Asset,
        amount: RawAmount,
        usd_value: Usd6,
    ) -> Result<(), VaultError> {
        let settings = self.settings.borrow();

        let usd_limit = settings.max_withdraw_usd;
        if !usd_limit.is_zero() && usd_value > usd_limit {
            return Err(VaultError::WithdrawLimitExceeded {
                unit: LimitUnit::Usd6,
                limit: usd_limit,
                attempted: usd_value,
            });
        }

        if let Some(&raw_limit) = settings.asset_withdraw_limits.get(asset) {
            if amount > raw_limit {
                return Err(VaultError::WithdrawLimitExceeded {
                    unit: LimitUnit::Raw,
                    limit: raw_limit,
                    attempted: amount,
                });
            }
        }
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn balance_of(&self, asset: &Asset, holder: &HolderId) -> RawAmount {
        self.ledger.borrow().balance_of(asset, holder)
    }

    /// All balances recorded for `holder`, zero entries included.
    pub fn holder_balances(&self, holder: &HolderId) -> HashMap<Asset, RawAmount> {
        self.ledger
            .borrow()
            .holder_balances(holder)
            .cloned()
            .unwrap_or_default()
    }

    /// Aggregate USD6 value recorded across all deposits and withdrawals.
    pub fn total_value(&self) -> Usd6 {
        self.ledger.borrow().total_value()
    }

    pub fn cap(&self) -> Usd6 {
        self.ledger.borrow().cap()
    }

    /// Raw amount of `asset` the custody layer currently holds.
    pub fn held_balance(&self, asset: &Asset) -> Result<RawAmount, VaultError> {
        self.transfers
            .held_balance(asset)
            .map_err(|e| VaultError::UnsupportedAsset {
                asset: *asset,
                reason: e.reason,
            })
    }

    /// USD6 value `amount` of `asset` would be credited at right now.
    pub fn quote_usd6(&self, asset: &Asset, amount: RawAmount) -> Result<Usd6, VaultError> {
        self.value_of(asset, amount)
    }

    pub fn deposit_count(&self) -> u64 {
        self.deposit_count.get()
    }

    pub fn withdrawal_count(&self) -> u64 {
        self.withdrawal_count.get()
    }

    /// Global per-withdrawal USD6 limit; zero means unlimited.
    pub fn max_withdraw_usd(&self) -> Usd6 {
        self.settings.borrow().max_withdraw_usd
    }

    /// Per-asset raw withdraw limit; zero means unlimited.
    pub fn asset_withdraw_limit(&self, asset: &Asset) -> RawAmount {
        self.settings
            .borrow()
            .asset_withdraw_limits
            .get(asset)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn max_price_age_secs(&self) -> Option<u64> {
        self.settings.borrow().max_price_age_secs
    }

    /// Feed currently used to value `asset`.
    pub fn price_feed_for(&self, asset: &Asset) -> String {
        let oracle = self.settings.borrow().oracle_for(asset);
        oracle.feed_id()
    }

    pub fn is_paused(&self) -> bool {
        self.settings.borrow().paused
    }

    // ───────────────────────── Configuration ─────────────────────────

    /// Replace the default price feed.
    pub fn set_oracle(&self, cap: &Capability, oracle: Rc<dyn PriceOracle>) -> Result<(), VaultError> {
        let _lock = self.enter("set_oracle")?;
        require(cap, Role::Admin, "set_oracle")?;

        let new_feed = oracle.feed_id();
        let previous = std::mem::replace(&mut self.settings.borrow_mut().oracle, oracle);
        let previous_feed = previous.feed_id();

        info!(by = %cap.holder(), %previous_feed, %new_feed, "Price oracle replaced");
        self.emit(ContractEvent::OracleUpdated(OracleUpdated {
            previous_feed,
            new_feed,
        }));
        Ok(())
    }

    /// Give `token` its own price feed, or fall back to the default with `None`.
    pub fn set_price_source(
        &self,
        cap: &Capability,
        token: TokenAddress,
        oracle: Option<Rc<dyn PriceOracle>>,
    ) -> Result<(), VaultError> {
        let _lock = self.enter("set_price_source")?;
        require(cap, Role::Admin, "set_price_source")?;

        let feed = oracle.as_ref().map(|o| o.feed_id());
        // The replaced source is dropped only after the settings borrow ends.
        let replaced = {
            let mut settings = self.settings.borrow_mut();
            match oracle {
                Some(oracle) => settings.price_sources.insert(token, oracle),
                None => settings.price_sources.remove(&token),
            }
        };
        drop(replaced);

        info!(by = %cap.holder(), %token, feed = ?feed, "Token price source updated");
        self.emit(ContractEvent::PriceSourceUpdated(PriceSourceUpdated { token, feed }));
        Ok(())
    }

    /// Set the global per-withdrawal USD6 limit. Zero removes it.
    pub fn set_max_withdraw_usd(&self, cap: &Capability, limit: Usd6) -> Result<(), VaultError> {
        let _lock = self.enter("set_max_withdraw_usd")?;
        require(cap, Role::Admin, "set_max_withdraw_usd")?;

        let previous = std::mem::replace(&mut self.settings.borrow_mut().max_withdraw_usd, limit);

        info!(
            by = %cap.holder(),
            previous = %format_usd6(previous),
            new = %format_usd6(limit),
            "Withdraw limit updated"
        );
        self.emit(ContractEvent::WithdrawLimitUpdated(WithdrawLimitUpdated {
            previous,
            new: limit,
        }));
        Ok(())
    }

    /// Set a raw-unit per-withdrawal limit for `asset`. Zero removes it.
    pub fn set_asset_withdraw_limit(
        &self,
        cap: &Capability,
        asset: Asset,
        limit: RawAmount,
    ) -> Result<(), VaultError> {
        let _lock = self.enter("set_asset_withdraw_limit")?;
        require(cap, Role::Admin, "set_asset_withdraw_limit")?;

        let previous = {
            let mut settings = self.settings.borrow_mut();
            if limit.is_zero() {
                settings.asset_withdraw_limits.remove(&asset)
            } else {
                settings.asset_withdraw_limits.insert(asset, limit)
            }
        }
        .unwrap_or(U256::ZERO);

        info!(by = %cap.holder(), %asset, %previous, new = %limit, "Asset withdraw limit updated");
        self.emit(ContractEvent::AssetWithdrawLimitUpdated(
            AssetWithdrawLimitUpdated {
                asset,
                previous,
                new: limit,
            },
        ));
        Ok(())
    }

    /// Stop deposits and withdrawals.
    pub fn pause(&self, cap: &Capability) -> Result<(), VaultError> {
        self.set_paused(cap, true)
    }

    pub fn unpause(&self, cap: &Capability) -> Result<(), VaultError> {
        self.set_paused(cap, false)
    }

    fn set_paused(&self, cap: &Capability, paused: bool) -> Result<(), VaultError> {
        let _lock = self.enter("set_paused")?;
        require(cap, Role::Pauser, "set_paused")?;

        self.settings.borrow_mut().paused = paused;

        info!(by = %cap.holder(), paused, "Pause state changed");
        self.emit(ContractEvent::PausedStateChanged(PausedStateChanged { paused }));
        Ok(())
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.events.borrow().clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<ContractEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn emit(&self, event: ContractEvent) {
        self.events.borrow_mut().push(event);
    }

    // ───────────────────────── Internal ─────────────────────────

    fn enter(&self, operation: &'static str) -> Result<ReentrancyLock<'_>, VaultError> {
        self.guard.acquire().ok_or_else(|| {
            warn!(operation, "Reentrant call rejected");
            VaultError::ReentrancyRejected
        })
    }

    fn check_not_paused(&self) -> Result<(), VaultError> {
        if self.settings.borrow().paused {
            return Err(VaultError::Paused);
        }
        Ok(())
    }

    /// Value `amount` of `asset` with the feed configured for it.
    fn value_of(&self, asset: &Asset, amount: RawAmount) -> Result<Usd6, VaultError> {
        let (oracle, max_age) = {
            let settings = self.settings.borrow();
            (settings.oracle_for(asset), settings.max_price_age_secs)
        };
        ValuationConverter::new(oracle.as_ref(), self.metadata.as_ref(), max_age)
            .to_usd6(asset, amount)
    }
}

impl fmt::Debug for Vault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vault")
            .field("ledger", &self.ledger)
            .field("deposit_count", &self.deposit_count.get())
            .field("withdrawal_count", &self.withdrawal_count.get())
            .field("paused", &self.is_paused())
            .field("events", &self.events.borrow().len())
            .finish_non_exhaustive()
    }
}

fn require(cap: &Capability, role: Role, operation: &'static str) -> Result<(), VaultError> {
    if !cap.permits(role) {
        warn!(operation, holder = %cap.holder(), role = ?cap.role(), "Capability rejected");
        return Err(VaultError::Unauthorized);
    }
    Ok(())
}

fn next_count(counter: &Cell<u64>) -> Result<u64, VaultError> {
    counter.get().checked_add(1).ok_or(VaultError::Overflow)
}
