//! Environment-based Configuration
//!
//! Defaults for the CLI. The library itself never reads the environment;
//! every core operation takes its network, keys and fee rate as arguments.
//!
//! # Environment Variables
//!
//! - `ZBTC_NETWORK` - "mainnet", "testnet", "signet" or "regtest" (default: "testnet")
//! - `ZBTC_FEE_RATE` - Fee rate in sat/vbyte (default: 10 mainnet, 2 otherwise)
//! - `ZBTC_LOCK_TIME` - CSV lock value for the user path (default: 144 mainnet, 6 otherwise)
//! - `ZBTC_OPERATOR_KEY` - Hex-encoded operator internal key (optional)
//! - `ZBTC_LOG_LEVEL` - Logging level (trace, debug, info, warn, error)

use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::taproot::{RESERVE_LOCK_BLOCKS, RESERVE_LOCK_BLOCKS_TESTNET};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Bitcoin network selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet" | "test" | "testnet3" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(ConfigError::InvalidValue(
                "ZBTC_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Get bitcoin network enum
    pub fn bitcoin_network(&self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
            Network::Signet => bitcoin::Network::Signet,
            Network::Regtest => bitcoin::Network::Regtest,
        }
    }

    pub fn default_fee_rate(&self) -> u64 {
        match self {
            Network::Mainnet => 10,
            _ => 2,
        }
    }

    pub fn default_lock_time(&self) -> i64 {
        match self {
            Network::Mainnet => RESERVE_LOCK_BLOCKS as i64,
            _ => RESERVE_LOCK_BLOCKS_TESTNET as i64,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct ReserveConfig {
    /// Network environment
    pub network: Network,

    /// Fee rate in sat/vbyte
    pub fee_rate: u64,

    /// CSV lock value for the user recovery leaf
    pub lock_time: i64,

    /// Operator internal key (hex), if configured
    pub operator_key: Option<String>,

    /// Log level
    pub log_level: String,
}

impl ReserveConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let network: Network = lookup("ZBTC_NETWORK")
            .unwrap_or_else(|| "testnet".to_string())
            .parse()?;

        let fee_rate = match lookup("ZBTC_FEE_RATE") {
            Some(value) => parse_fee_rate(&value)?,
            None => network.default_fee_rate(),
        };

        let lock_time = match lookup("ZBTC_LOCK_TIME") {
            Some(value) => value.trim().parse().map_err(|_| {
                ConfigError::InvalidValue("ZBTC_LOCK_TIME".to_string(), "must be a number".to_string())
            })?,
            None => network.default_lock_time(),
        };

        let operator_key = lookup("ZBTC_OPERATOR_KEY").filter(|key| !key.trim().is_empty());

        let log_level = lookup("ZBTC_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            network,
            fee_rate,
            lock_time,
            operator_key,
            log_level,
        })
    }

    /// Operator key, or an error naming the variable to set
    pub fn require_operator_key(&self) -> Result<&str, ConfigError> {
        self.operator_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("ZBTC_OPERATOR_KEY".to_string()))
    }
}

fn parse_fee_rate(value: &str) -> Result<u64, ConfigError> {
    let rate: u64 = value.trim().parse().map_err(|_| {
        ConfigError::InvalidValue("ZBTC_FEE_RATE".to_string(), "must be a number".to_string())
    })?;

    if rate < 1 {
        return Err(ConfigError::InvalidValue(
            "ZBTC_FEE_RATE".to_string(),
            "must be at least 1 sat/vbyte".to_string(),
        ));
    }

    Ok(rate)
}
