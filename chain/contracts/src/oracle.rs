//! External collaborators
//!
//! The vault never prices assets, reads token metadata or moves funds by
//! itself. It calls out through these traits. Every call is a point where
//! control leaves the vault and may come back in through a nested call.

use bank_types::asset::{Asset, TokenAddress};
use bank_types::ids::HolderId;
use bank_types::numeric::RawAmount;
use serde::{Deserialize, Serialize};

use crate::errors::{MetadataError, OracleError, TransferError};

/// One price reading: `value / 10^decimals` USD per whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Signed, as reported by the feed. Non-positive values are invalid.
    pub value: i128,
    pub decimals: u8,
    /// Unix seconds of the last feed update
    pub updated_at: i64,
}

/// USD price feed.
pub trait PriceOracle {
    /// Identifier used in logs and configuration events.
    fn feed_id(&self) -> String;

    fn latest_price(&self) -> Result<PriceObservation, OracleError>;
}

/// Token decimal metadata. Read on every conversion, never cached.
pub trait TokenMetadata {
    fn decimals(&self, token: &TokenAddress) -> Result<u8, MetadataError>;
}

/// Moves assets between holders and the vault's custody.
pub trait AssetTransfer {
    /// Pull `amount` of a token from `from` into custody.
    fn transfer_in(
        &self,
        asset: &Asset,
        from: &HolderId,
        amount: RawAmount,
    ) -> Result<(), TransferError>;

    /// Send `amount` out of custody to `to`.
    fn transfer_out(
        &self,
        asset: &Asset,
        to: &HolderId,
        amount: RawAmount,
    ) -> Result<(), TransferError>;

    /// Raw amount of `asset` currently in custody.
    fn held_balance(&self, asset: &Asset) -> Result<RawAmount, TransferError>;
}
