//! Contract-specific error types
//!
//! One taxonomy for every vault operation, plus the narrower errors that
//! collaborators (oracle, token metadata, transfer layer) report. Every
//! error aborts the whole operation; nothing here is retried internally.

use bank_types::asset::Asset;
use bank_types::errors::NumericError;
use bank_types::numeric::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Unit a withdraw limit is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitUnit {
    /// USD scaled by 10^6 (global limit)
    Usd6,
    /// Smallest unit of the asset being withdrawn (per-asset limit)
    Raw,
}

impl fmt::Display for LimitUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitUnit::Usd6 => write!(f, "usd6"),
            LimitUnit::Raw => write!(f, "raw units"),
        }
    }
}

/// Direction of an external asset movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    In,
    Out,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferDirection::In => write!(f, "in"),
            TransferDirection::Out => write!(f, "out"),
        }
    }
}

/// Vault operation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaultError {
    #[error("Amount must be non-zero")]
    ZeroAmount,

    #[error("Bank cap exceeded: cap {cap}, attempted total {attempted}")]
    CapExceeded { cap: U256, attempted: U256 },

    #[error("Insufficient balance for {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: Asset,
        required: U256,
        available: U256,
    },

    #[error("Withdraw limit exceeded: limit {limit} {unit}, attempted {attempted} {unit}")]
    WithdrawLimitExceeded {
        unit: LimitUnit,
        limit: U256,
        attempted: U256,
    },

    #[error("Invalid price feed: {reason}")]
    InvalidPriceFeed { reason: String },

    #[error("Unsupported asset {asset}: {reason}")]
    UnsupportedAsset { asset: Asset, reason: String },

    #[error("Transfer {direction} failed: {reason}")]
    TransferFailed {
        direction: TransferDirection,
        reason: String,
    },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Reentrant call rejected")]
    ReentrancyRejected,

    #[error("Vault is paused")]
    Paused,

    #[error("Unauthorized: capability lacks the required role")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Malformed configuration: {0}")]
    Parse(String),

    #[error("Invalid USD amount for {field}: {source}")]
    InvalidUsd {
        field: &'static str,
        #[source]
        source: NumericError,
    },

    #[error("Bank cap must be positive")]
    ZeroBankCap,
}

/// Price oracle failure
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Oracle unavailable: {reason}")]
pub struct OracleError {
    pub reason: String,
}

impl OracleError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Token metadata lookup failure
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Token metadata unavailable: {reason}")]
pub struct MetadataError {
    pub reason: String,
}

impl MetadataError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Asset transfer failure
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Transfer rejected: {reason}")]
pub struct TransferError {
    pub reason: String,
}

impl TransferError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<OracleError> for VaultError {
    fn from(err: OracleError) -> Self {
        VaultError::InvalidPriceFeed { reason: err.reason }
    }
}
