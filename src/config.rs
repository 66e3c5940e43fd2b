//! Bridge and poller configuration
//!
//! Loaded from environment variables (optionally seeded from a `.env` file).
//! Variable names are prefixed so a deposit and a withdrawal bridge can be
//! configured side by side, e.g. `DEPOSIT_LOCAL_CHAIN_SELECTOR`.

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::types::ChainSelector;

/// Per-direction reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BridgeConfig {
    /// Chain the transfers are sent from
    pub local_selector: ChainSelector,
    /// Chain the transfers are received on
    pub remote_selector: ChainSelector,
    /// Liquidity manager emitting sent events
    pub local_liquidity_manager: Address,
    /// Liquidity manager emitting received (and step) events
    pub remote_liquidity_manager: Address,
    /// How far back sent events are considered in flight
    #[serde(default = "default_lookback", with = "duration_secs")]
    pub lookback: Duration,
    /// Confirmation depth required on every fetched log
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Retention requested for registered log filters
    #[serde(default = "default_filter_retention", with = "duration_secs")]
    pub filter_retention: Duration,
}

/// RPC-backed log poller settings
#[derive(Clone, Deserialize)]
pub struct PollerConfig {
    pub rpc_url: String,
    #[serde(default = "default_lookback_blocks")]
    pub lookback_blocks: u64,
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,
}

/// Custom Debug that redacts the RPC URL (may embed an API key).
impl fmt::Debug for PollerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollerConfig")
            .field("rpc_url", &"<redacted>")
            .field("lookback_blocks", &self.lookback_blocks)
            .field("max_block_range", &self.max_block_range)
            .finish()
    }
}

/// Default functions
fn default_lookback() -> Duration {
    Duration::from_secs(7 * 24 * 60 * 60)
}

fn default_confirmations() -> u64 {
    1
}

fn default_filter_retention() -> Duration {
    Duration::from_secs(30 * 24 * 60 * 60)
}

fn default_lookback_blocks() -> u64 {
    50_000
}

fn default_max_block_range() -> u64 {
    10_000
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

fn required(prefix: &str, name: &str) -> Result<String> {
    let key = format!("{}_{}", prefix, name);
    env::var(&key).map_err(|_| eyre!("{} environment variable is required", key))
}

fn optional<T: FromStr>(prefix: &str, name: &str) -> Option<T> {
    env::var(format!("{}_{}", prefix, name))
        .ok()
        .and_then(|v| v.parse().ok())
}

fn parse_address(value: &str, what: &str) -> Result<Address> {
    Address::from_str(value).wrap_err_with(|| format!("{} must be a valid hex address", what))
}

/// Load a `.env` file if present; environment variables still win
fn load_dotenv(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        dotenvy::from_filename(path)
            .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
    }
    Ok(())
}

impl BridgeConfig {
    /// Load configuration for `prefix` from `.env` (if present) and the environment
    pub fn load(prefix: &str) -> Result<Self> {
        load_dotenv(".env")?;
        Self::from_env(prefix)
    }

    /// Load configuration for `prefix` from environment variables
    pub fn from_env(prefix: &str) -> Result<Self> {
        let config = BridgeConfig {
            local_selector: ChainSelector(
                required(prefix, "LOCAL_CHAIN_SELECTOR")?
                    .parse()
                    .wrap_err_with(|| format!("{}_LOCAL_CHAIN_SELECTOR must be a valid u64", prefix))?,
            ),
            remote_selector: ChainSelector(
                required(prefix, "REMOTE_CHAIN_SELECTOR")?
                    .parse()
                    .wrap_err_with(|| format!("{}_REMOTE_CHAIN_SELECTOR must be a valid u64", prefix))?,
            ),
            local_liquidity_manager: parse_address(
                &required(prefix, "LOCAL_LIQUIDITY_MANAGER")?,
                "local liquidity manager",
            )?,
            remote_liquidity_manager: parse_address(
                &required(prefix, "REMOTE_LIQUIDITY_MANAGER")?,
                "remote liquidity manager",
            )?,
            lookback: optional(prefix, "LOOKBACK_SECS")
                .map(Duration::from_secs)
                .unwrap_or_else(default_lookback),
            confirmations: optional(prefix, "CONFIRMATIONS").unwrap_or_else(default_confirmations),
            filter_retention: optional(prefix, "FILTER_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or_else(default_filter_retention),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.local_selector == self.remote_selector {
            return Err(eyre!(
                "local and remote chain selectors must differ (both {})",
                self.local_selector
            ));
        }

        if self.local_liquidity_manager == Address::ZERO {
            return Err(eyre!("local liquidity manager cannot be the zero address"));
        }

        if self.remote_liquidity_manager == Address::ZERO {
            return Err(eyre!("remote liquidity manager cannot be the zero address"));
        }

        if self.lookback.is_zero() {
            return Err(eyre!("lookback window cannot be zero"));
        }

        Ok(())
    }
}

impl PollerConfig {
    /// Load configuration for `prefix` from `.env` (if present) and the environment
    pub fn load(prefix: &str) -> Result<Self> {
        load_dotenv(".env")?;
        Self::from_env(prefix)
    }

    /// Load configuration for `prefix` from environment variables
    pub fn from_env(prefix: &str) -> Result<Self> {
        let config = PollerConfig {
            rpc_url: required(prefix, "RPC_URL")?,
            lookback_blocks: optional(prefix, "LOOKBACK_BLOCKS")
                .unwrap_or_else(default_lookback_blocks),
            max_block_range: optional(prefix, "MAX_BLOCK_RANGE")
                .unwrap_or_else(default_max_block_range),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(eyre!("rpc_url cannot be empty"));
        }

        if self.max_block_range == 0 {
            return Err(eyre!("max_block_range must be at least 1"));
        }

        Ok(())
    }
}
