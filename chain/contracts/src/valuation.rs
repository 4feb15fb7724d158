//! Valuation: raw asset amounts to USD6
//!
//! ```text
//! usd6 = floor(raw * price * 10^6 / (10^asset_decimals * 10^price_decimals))
//! ```
//!
//! Multiplication happens before division and every step is checked in
//! 256-bit arithmetic, so a result either is exact-to-the-floor or the
//! conversion fails with `Overflow`. A denominator past `U256::MAX` is
//! larger than any numerator and floors the value to zero.

use bank_types::asset::{Asset, NATIVE_DECIMALS};
use bank_types::numeric::{pow10, RawAmount, Usd6, U256, USD6_SCALE};
use tracing::{debug, warn};

use crate::errors::VaultError;
use crate::oracle::{PriceObservation, PriceOracle, TokenMetadata};

/// Pure conversion formula.
pub fn usd6_value(
    raw: RawAmount,
    price: U256,
    price_decimals: u8,
    asset_decimals: u8,
) -> Result<Usd6, VaultError> {
    let numerator = raw
        .checked_mul(price)
        .and_then(|v| v.checked_mul(USD6_SCALE))
        .ok_or(VaultError::Overflow)?;

    match pow10(u32::from(asset_decimals) + u32::from(price_decimals)) {
        Some(denominator) => numerator.checked_div(denominator).ok_or(VaultError::Overflow),
        None => Ok(U256::ZERO),
    }
}

/// Check a reading and return its value as an unsigned integer.
///
/// `now` and `max_age_secs` drive the staleness check; `None` disables it.
pub fn validate_price(
    observation: &PriceObservation,
    now: i64,
    max_age_secs: Option<u64>,
) -> Result<U256, VaultError> {
    if observation.value <= 0 {
        return Err(VaultError::InvalidPriceFeed {
            reason: format!("non-positive price {}", observation.value),
        });
    }

    if let Some(max_age) = max_age_secs {
        if observation.updated_at > now {
            return Err(VaultError::InvalidPriceFeed {
                reason: format!("price timestamp {} is in the future", observation.updated_at),
            });
        }
        let age = now.abs_diff(observation.updated_at);
        if age > max_age {
            return Err(VaultError::InvalidPriceFeed {
                reason: format!(
                    "stale price: updated at {}, max age {}s",
                    observation.updated_at, max_age
                ),
            });
        }
    }

    Ok(U256::from(observation.value.unsigned_abs()))
}

/// Converter bound to one price feed and one metadata source.
///
/// Each call re-reads the price and, for tokens, the token's decimals.
pub struct ValuationConverter<'a> {
    oracle: &'a dyn PriceOracle,
    metadata: &'a dyn TokenMetadata,
    max_price_age_secs: Option<u64>,
}

impl<'a> ValuationConverter<'a> {
    pub fn new(
        oracle: &'a dyn PriceOracle,
        metadata: &'a dyn TokenMetadata,
        max_price_age_secs: Option<u64>,
    ) -> Self {
        Self {
            oracle,
            metadata,
            max_price_age_secs,
        }
    }

    /// Decimal precision of `asset`.
    pub fn asset_decimals(&self, asset: &Asset) -> Result<u8, VaultError> {
        match asset {
            Asset::Native => Ok(NATIVE_DECIMALS),
            Asset::Token(token) => {
                self.metadata
                    .decimals(token)
                    .map_err(|e| VaultError::UnsupportedAsset {
                        asset: *asset,
                        reason: e.reason,
                    })
            }
        }
    }

    pub fn to_usd6(&self, asset: &Asset, raw: RawAmount) -> Result<Usd6, VaultError> {
        let observation = self.oracle.latest_price()?;
        let now = chrono::Utc::now().timestamp();
        let price = validate_price(&observation, now, self.max_price_age_secs).inspect_err(|e| {
            warn!(feed = %self.oracle.feed_id(), error = %e, "Rejected price reading");
        })?;

        let asset_decimals = self.asset_decimals(asset)?;
        let usd = usd6_value(raw, price, observation.decimals, asset_decimals)?;

        debug!(
            %asset,
            %raw,
            %price,
            price_decimals = observation.decimals,
            asset_decimals,
            usd6 = %usd,
            "Valued asset amount"
        );
        Ok(usd)
    }
}
