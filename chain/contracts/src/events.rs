//! Vault events
//!
//! Events are immutable records appended to the vault's log after an
//! operation commits. External indexers and auditors consume them; a failed
//! operation never emits anything.

use bank_types::asset::{Asset, TokenAddress};
use bank_types::ids::HolderId;
use bank_types::numeric::{RawAmount, Usd6, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asset credited to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub event_id: Uuid,
    /// Value of the deposit counter after this deposit
    pub sequence: u64,
    pub asset: Asset,
    pub holder: HolderId,
    pub amount: RawAmount,
    pub usd_value: Usd6,
}

/// Asset debited from a holder and sent out of custody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub event_id: Uuid,
    /// Value of the withdrawal counter after this withdrawal
    pub sequence: u64,
    pub asset: Asset,
    pub holder: HolderId,
    pub amount: RawAmount,
    pub usd_value: Usd6,
}

/// Default price feed replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleUpdated {
    pub previous_feed: String,
    pub new_feed: String,
}

/// Per-token price feed set (`Some`) or cleared back to the default (`None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSourceUpdated {
    pub token: TokenAddress,
    pub feed: Option<String>,
}

/// Global per-withdrawal USD limit changed. Zero means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawLimitUpdated {
    pub previous: Usd6,
    pub new: Usd6,
}

/// Per-asset raw withdraw limit changed. Zero means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetWithdrawLimitUpdated {
    pub asset: Asset,
    pub previous: U256,
    pub new: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PausedStateChanged {
    pub paused: bool,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Deposit(Deposit),
    Withdrawal(Withdrawal),
    OracleUpdated(OracleUpdated),
    PriceSourceUpdated(PriceSourceUpdated),
    WithdrawLimitUpdated(WithdrawLimitUpdated),
    AssetWithdrawLimitUpdated(AssetWithdrawLimitUpdated),
    PausedStateChanged(PausedStateChanged),
}

impl ContractEvent {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ContractEvent::Deposit(_) => "deposit",
            ContractEvent::Withdrawal(_) => "withdrawal",
            ContractEvent::OracleUpdated(_) => "oracle_updated",
            ContractEvent::PriceSourceUpdated(_) => "price_source_updated",
            ContractEvent::WithdrawLimitUpdated(_) => "withdraw_limit_updated",
            ContractEvent::AssetWithdrawLimitUpdated(_) => "asset_withdraw_limit_updated",
            ContractEvent::PausedStateChanged(_) => "paused_state_changed",
        }
    }
}
