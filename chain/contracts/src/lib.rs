//! USD-capped custody vault
//!
//! Principals deposit native currency or tokens into per-holder balances.
//! Every unit is valued in USD (six decimals) through an external price
//! feed, and the vault refuses any deposit that would lift its recorded
//! USD total above a cap fixed at construction.
//!
//! # Modules
//! - `errors`: Operation and collaborator error types
//! - `events`: Deposit, withdrawal and configuration events
//! - `security`: Reentrancy guard, roles and capabilities
//! - `config`: JSON-loadable vault configuration
//! - `oracle`: Price feed, token metadata and transfer collaborator traits
//! - `valuation`: Raw amount to USD6 conversion
//! - `ledger`: Balances per (holder, asset) and the USD aggregate
//! - `vault`: Deposit/withdraw engine

pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod oracle;
pub mod security;
pub mod valuation;
pub mod vault;

pub use config::VaultConfig;
pub use errors::VaultError;
pub use vault::Vault;
