//! Asset identifiers
//!
//! An asset is either the chain's native currency or a fungible token
//! identified by its contract address. Equality and hashing cover both the
//! discriminant and the address, so two tokens never collide with each
//! other or with the native asset.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal precision of the native asset (smallest unit = 10^-18).
pub const NATIVE_DECIMALS: u8 = 18;

/// Contract address of a fungible token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenAddress(Address);

impl TokenAddress {
    pub const fn new(address: Address) -> Self {
        Self(address)
    }

    /// Address with every byte set to `byte`. Handy for fixtures.
    pub fn repeat_byte(byte: u8) -> Self {
        Self(Address::repeat_byte(byte))
    }

    pub fn as_address(&self) -> &Address {
        &self.0
    }
}

impl From<Address> for TokenAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset held by the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum Asset {
    /// Native currency of the host chain
    Native,
    /// Fungible token at the given address
    Token(TokenAddress),
}

impl Asset {
    pub fn token(address: impl Into<TokenAddress>) -> Self {
        Asset::Token(address.into())
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Token address, or `None` for the native asset.
    pub fn token_address(&self) -> Option<&TokenAddress> {
        match self {
            Asset::Native => None,
            Asset::Token(address) => Some(address),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "native"),
            Asset::Token(address) => write!(f, "token:{}", address),
        }
    }
}
