//! Host configuration for ptylink.
//!
//! [`reconcile()`] loads the JSON config file, upgrading files written before
//! the whitelist existed. [`WhitelistStore`] manages the authorized keys.

pub mod config;
pub mod error;
pub mod platform;
pub mod reconcile;
pub mod whitelist;

pub use config::{CliEndpoint, HostConfig, PublicView, SecretKey};
pub use error::ConfigError;
pub use reconcile::{LoadOutcome, Reconciled, reconcile, write_config};
pub use whitelist::{FileWhitelist, MemoryWhitelist, WhitelistStore};
