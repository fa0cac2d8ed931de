//! Core utilities shared by the Pinmap crates
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration for clustering, filtering, sync and logging
//! - **Retry policy**: delays for re-establishing live subscriptions
//!
//! # Example
//!
//! ```rust,no_run
//! use pinmap_core::config::Config;
//!
//! let config = Config::load(None).expect("Failed to load config");
//! config.validate().expect("Invalid config");
//!
//! println!("debounce: {:?}", config.schema.sync.debounce());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, MapConfig, SyncConfig, TelemetrySettings};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::RetryConfig;
}
