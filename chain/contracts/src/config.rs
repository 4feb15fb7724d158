//! Vault configuration
//!
//! Dollar amounts are written as decimal strings (`"100.00"`) and converted
//! to USD6 integers exactly; anything finer than a micro-dollar is rejected.

use bank_types::numeric::{usd6_from_decimal, Usd6};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Maximum aggregate USD value the vault may hold. Fixed at construction.
    pub bank_cap_usd: Decimal,

    /// Maximum USD value of a single withdrawal; zero means unlimited.
    #[serde(default)]
    pub max_withdraw_usd: Decimal,

    /// Reject oracle readings older than this many seconds.
    #[serde(default)]
    pub max_price_age_secs: Option<u64>,
}

impl VaultConfig {
    /// Config with the given cap, no withdraw limit and no staleness bound.
    pub fn with_cap(bank_cap_usd: Decimal) -> Self {
        Self {
            bank_cap_usd,
            max_withdraw_usd: Decimal::ZERO,
            max_price_age_secs: None,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bank_cap_usd6()?.is_zero() {
            return Err(ConfigError::ZeroBankCap);
        }
        self.max_withdraw_usd6()?;
        Ok(())
    }

    pub fn bank_cap_usd6(&self) -> Result<Usd6, ConfigError> {
        usd6_from_decimal(self.bank_cap_usd).map_err(|source| ConfigError::InvalidUsd {
            field: "bank_cap_usd",
            source,
        })
    }

    pub fn max_withdraw_usd6(&self) -> Result<Usd6, ConfigError> {
        usd6_from_decimal(self.max_withdraw_usd).map_err(|source| ConfigError::InvalidUsd {
            field: "max_withdraw_usd",
            source,
        })
    }
}
