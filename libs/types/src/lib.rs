//! Types library for the custody bank
//!
//! Shared identifiers and numeric primitives used by the vault contracts
//! and by anything that indexes their events.
//!
//! # Modules
//! - `ids`: Holder identifiers
//! - `asset`: Native/token asset discriminant and token addresses
//! - `numeric`: 256-bit raw amounts, USD6 values and decimal bridging
//! - `errors`: Numeric conversion errors

pub mod asset;
pub mod errors;
pub mod ids;
pub mod numeric;

pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::asset::*;
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
