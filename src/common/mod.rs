//! Common Infrastructure Module
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ConfigError, Network, ReserveConfig};
pub use error::{ReserveError, Result};
pub use logging::{
    init_from_config, init_logging, log_address_event, log_deposit_event, EventCategory,
    LogEvent, LogLevel, LoggingError,
};
