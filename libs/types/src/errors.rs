//! Error types for numeric conversions

use thiserror::Error;

/// Failure converting between human-readable decimals and scaled integers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Negative value not allowed: {value}")]
    Negative { value: String },

    #[error("Too many fractional digits in {value}: at most {max_scale} allowed")]
    TooPrecise { value: String, max_scale: u32 },

    #[error("Value out of representable range")]
    OutOfRange,
}
