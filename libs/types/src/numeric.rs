//! Scaled integer amounts
//!
//! Raw asset amounts and USD values are unsigned 256-bit integers. A raw
//! amount counts the asset's smallest indivisible unit; a USD6 value counts
//! millionths of a dollar. `rust_decimal` is only used at the edges, to
//! read configured dollar amounts and to render values for humans.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::errors::NumericError;

pub use alloy_primitives::U256;

/// Amount in an asset's smallest unit.
pub type RawAmount = U256;

/// USD value scaled by 10^6.
pub type Usd6 = U256;

/// Fractional digits carried by a [`Usd6`] value.
pub const USD6_DECIMALS: u32 = 6;

/// 10^6 as a 256-bit integer.
pub const USD6_SCALE: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// `10^exp`, or `None` if it does not fit in 256 bits.
pub fn pow10(exp: u32) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(exp))
}

/// Convert a dollar amount such as `100.25` into USD6 units.
///
/// Rejects negative values and values with more than six fractional digits
/// rather than rounding them.
pub fn usd6_from_decimal(value: Decimal) -> Result<Usd6, NumericError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(NumericError::Negative {
            value: value.to_string(),
        });
    }

    let scaled = value
        .checked_mul(Decimal::from(1_000_000u64))
        .ok_or(NumericError::OutOfRange)?;

    if !scaled.fract().is_zero() {
        return Err(NumericError::TooPrecise {
            value: value.to_string(),
            max_scale: USD6_DECIMALS,
        });
    }

    let units = scaled.trunc().to_u128().ok_or(NumericError::OutOfRange)?;
    Ok(U256::from(units))
}

/// Convert USD6 units back into a dollar amount with six fractional digits.
pub fn usd6_to_decimal(value: Usd6) -> Result<Decimal, NumericError> {
    let units = u128::try_from(value).map_err(|_| NumericError::OutOfRange)?;
    let units = i128::try_from(units).map_err(|_| NumericError::OutOfRange)?;
    Decimal::try_from_i128_with_scale(units, USD6_DECIMALS).map_err(|_| NumericError::OutOfRange)
}

/// Render a USD6 value for logs, e.g. `"100.000000"`.
///
/// Values too large for a `Decimal` fall back to the raw integer.
pub fn format_usd6(value: Usd6) -> String {
    match usd6_to_decimal(value) {
        Ok(dollars) => dollars.to_string(),
        Err(_) => format!("{} (usd6)", value),
    }
}
