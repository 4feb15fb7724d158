//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use bank_types::asset::{Asset, TokenAddress};
use bank_types::ids::HolderId;
use bank_types::numeric::{RawAmount, U256};
use bank_vault::errors::{MetadataError, OracleError, TransferDirection, TransferError};
use bank_vault::oracle::{AssetTransfer, PriceObservation, PriceOracle, TokenMetadata};
use bank_vault::security::{AccessControl, Capability, Role};
use bank_vault::{Vault, VaultConfig};
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// $2000 with 8 decimals.
pub const ETH_USD_2000: i128 = 200_000_000_000;

/// Install a test subscriber once so `RUST_LOG`-style output shows up with
/// `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `hundredths / 100` whole native units in wei.
pub fn ether_hundredths(hundredths: u64) -> U256 {
    U256::from(hundredths) * U256::from(10_000_000_000_000_000u64)
}

pub fn usd6(dollars: u64) -> U256 {
    U256::from(dollars) * U256::from(1_000_000u64)
}

// ─── Price feed ───

pub struct ManualFeed {
    id: String,
    pub price: Cell<i128>,
    pub decimals: Cell<u8>,
    /// Seconds subtracted from "now" when stamping readings
    pub age_secs: Cell<i64>,
    pub offline: Cell<bool>,
    pub reads: Cell<u32>,
}

impl ManualFeed {
    pub fn new(id: &str, price: i128, decimals: u8) -> Rc<Self> {
        Rc::new(Self {
            id: id.to_string(),
            price: Cell::new(price),
            decimals: Cell::new(decimals),
            age_secs: Cell::new(0),
            offline: Cell::new(false),
            reads: Cell::new(0),
        })
    }
}

impl PriceOracle for ManualFeed {
    fn feed_id(&self) -> String {
        self.id.clone()
    }

    fn latest_price(&self) -> Result<PriceObservation, OracleError> {
        self.reads.set(self.reads.get() + 1);
        if self.offline.get() {
            return Err(OracleError::new("feed offline"));
        }
        Ok(PriceObservation {
            value: self.price.get(),
            decimals: self.decimals.get(),
            updated_at: chrono::Utc::now().timestamp() - self.age_secs.get(),
        })
    }
}

// ─── Token metadata ───

#[derive(Default)]
pub struct TokenRegistry {
    decimals: RefCell<HashMap<TokenAddress, u8>>,
    pub lookups: Cell<u32>,
}

impl TokenRegistry {
    pub fn register(&self, token: TokenAddress, decimals: u8) {
        self.decimals.borrow_mut().insert(token, decimals);
    }
}

impl TokenMetadata for TokenRegistry {
    fn decimals(&self, token: &TokenAddress) -> Result<u8, MetadataError> {
        self.lookups.set(self.lookups.get() + 1);
        self.decimals
            .borrow()
            .get(token)
            .copied()
            .ok_or_else(|| MetadataError::new("decimals() reverted"))
    }
}

// ─── Custody ───

type TransferHook = Box<dyn Fn(&Asset, &HolderId, RawAmount) -> Result<(), TransferError>>;

/// Wallet balances outside the vault plus the raw amounts held in custody.
#[derive(Default)]
pub struct Custody {
    wallets: RefCell<HashMap<(HolderId, Asset), RawAmount>>,
    held: RefCell<HashMap<Asset, RawAmount>>,
    pub fail_out: Cell<bool>,
    /// Runs inside `transfer_in`/`transfer_out` after funds moved; an error
    /// reverts the movement
    on_transfer_in: RefCell<Option<TransferHook>>,
    on_transfer_out: RefCell<Option<TransferHook>>,
}

impl Custody {
    pub fn mint(&self, holder: HolderId, asset: Asset, amount: RawAmount) {
        *self.wallets.borrow_mut().entry((holder, asset)).or_default() += amount;
    }

    pub fn wallet(&self, holder: &HolderId, asset: &Asset) -> RawAmount {
        self.wallets
            .borrow()
            .get(&(*holder, *asset))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Native value that arrived with a call.
    pub fn receive_native(&self, amount: RawAmount) {
        *self.held.borrow_mut().entry(Asset::Native).or_default() += amount;
    }

    pub fn set_on_transfer_in(&self, hook: TransferHook) {
        *self.on_transfer_in.borrow_mut() = Some(hook);
    }

    pub fn set_on_transfer_out(&self, hook: TransferHook) {
        *self.on_transfer_out.borrow_mut() = Some(hook);
    }
}

impl Custody {
    /// Move `amount` between `holder`'s wallet and custody.
    fn move_funds(
        &self,
        holder: &HolderId,
        asset: &Asset,
        amount: RawAmount,
        direction: TransferDirection,
    ) -> Result<(), TransferError> {
        let mut wallets = self.wallets.borrow_mut();
        let mut held = self.held.borrow_mut();
        let wallet = wallets.entry((*holder, *asset)).or_default();
        let custody = held.entry(*asset).or_default();
        let (source, target, short) = match direction {
            TransferDirection::In => (wallet, custody, "transfer amount exceeds balance"),
            TransferDirection::Out => (custody, wallet, "custody short"),
        };
        if *source < amount {
            return Err(TransferError::new(short));
        }
        *source -= amount;
        *target += amount;
        Ok(())
    }

    /// Run `hook` after the funds moved; a failing call reverts its own movement.
    fn settle(
        &self,
        hook: &RefCell<Option<TransferHook>>,
        holder: &HolderId,
        asset: &Asset,
        amount: RawAmount,
        reverse: TransferDirection,
    ) -> Result<(), TransferError> {
        let result = match hook.borrow().as_ref() {
            Some(hook) => hook(asset, holder, amount),
            None => Ok(()),
        };
        if result.is_err() {
            self.move_funds(holder, asset, amount, reverse)?;
        }
        result
    }
}

impl AssetTransfer for Custody {
    fn transfer_in(
        &self,
        asset: &Asset,
        from: &HolderId,
        amount: RawAmount,
    ) -> Result<(), TransferError> {
        self.move_funds(from, asset, amount, TransferDirection::In)?;
        self.settle(&self.on_transfer_in, from, asset, amount, TransferDirection::Out)
    }

    fn transfer_out(
        &self,
        asset: &Asset,
        to: &HolderId,
        amount: RawAmount,
    ) -> Result<(), TransferError> {
        if self.fail_out.get() {
            return Err(TransferError::new("recipient rejected transfer"));
        }
        self.move_funds(to, asset, amount, TransferDirection::Out)?;
        self.settle(&self.on_transfer_out, to, asset, amount, TransferDirection::In)
    }

    fn held_balance(&self, asset: &Asset) -> Result<RawAmount, TransferError> {
        Ok(self.held.borrow().get(asset).copied().unwrap_or(U256::ZERO))
    }
}

// ─── Harness ───

pub struct Harness {
    pub vault: Rc<Vault>,
    pub feed: Rc<ManualFeed>,
    pub tokens: Rc<TokenRegistry>,
    pub custody: Rc<Custody>,
    pub access: AccessControl,
    pub admin: HolderId,
}

impl Harness {
    /// Vault with the given cap, valued at $2000 (8 decimals).
    pub fn new(cap_usd: u64) -> Self {
        Self::with_config(VaultConfig::with_cap(Decimal::from(cap_usd)))
    }

    pub fn with_config(config: VaultConfig) -> Self {
        init_tracing();
        let feed = ManualFeed::new("eth-usd", ETH_USD_2000, 8);
        let tokens = Rc::new(TokenRegistry::default());
        let custody = Rc::new(Custody::default());
        let vault = Vault::new(&config, feed.clone(), tokens.clone(), custody.clone())
            .expect("valid config");
        let admin = HolderId::new();
        Self {
            vault: Rc::new(vault),
            feed,
            tokens,
            custody,
            access: AccessControl::new(admin),
            admin,
        }
    }

    pub fn admin_cap(&self) -> Capability {
        self.access
            .authorize(&self.admin, Role::Admin)
            .expect("admin role")
    }

    /// Register a token with the metadata source.
    pub fn token(&self, byte: u8, decimals: u8) -> TokenAddress {
        let token = TokenAddress::repeat_byte(byte);
        self.tokens.register(token, decimals);
        token
    }

    /// Native deposit including the value carried by the call.
    pub fn deposit_native(
        &self,
        holder: HolderId,
        amount: RawAmount,
    ) -> Result<bank_vault::events::Deposit, bank_vault::VaultError> {
        let event = self.vault.deposit_native(holder, amount)?;
        self.custody.receive_native(amount);
        Ok(event)
    }
}
