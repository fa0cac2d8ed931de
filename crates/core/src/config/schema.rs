//! Configuration schema definitions

use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Category filter values accepted in `[map].category`.
pub const CATEGORY_FILTERS: [&str; 5] = ["all", "event", "hazard", "lost", "found"];

/// Unit names accepted in `[map].units`.
pub const UNIT_NAMES: [&str; 3] = ["km", "mi", "miles"];

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    /// `[map]` section
    #[serde(default)]
    pub map: MapConfig,

    /// `[sync]` section
    #[serde(default)]
    pub sync: SyncConfig,

    /// `[telemetry]` section
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl ConfigSchema {
    /// Check every section for values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        self.map.validate()?;
        self.sync.validate()
    }
}

/// Clustering and proximity filter configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapConfig {
    /// Maximum distance in meters between a report and its cluster centroid
    #[serde(default = "default_cluster_threshold_m")]
    pub cluster_threshold_m: f64,

    /// Radius around the viewer beyond which reports are hidden
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,

    /// `"all"` or a single report category
    #[serde(default = "default_category")]
    pub category: String,

    /// Unit used in distance labels
    #[serde(default = "default_units")]
    pub units: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            cluster_threshold_m: default_cluster_threshold_m(),
            radius_km: default_radius_km(),
            category: default_category(),
            units: default_units(),
        }
    }
}

impl MapConfig {
    fn validate(&self) -> Result<()> {
        if !(self.cluster_threshold_m.is_finite() && self.cluster_threshold_m > 0.0) {
            return Err(Error::invalid_config_value(
                "map.cluster_threshold_m",
                "must be a positive number",
            ));
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(Error::invalid_config_value("map.radius_km", "must be a positive number"));
        }
        let category = self.category.to_lowercase();
        if !CATEGORY_FILTERS.contains(&category.as_str()) && category != "safety" {
            return Err(Error::invalid_config_value(
                "map.category",
                format!("expected one of {:?}, got {:?}", CATEGORY_FILTERS, self.category),
            ));
        }
        if !UNIT_NAMES.contains(&self.units.to_lowercase().as_str()) {
            return Err(Error::invalid_config_value(
                "map.units",
                format!("expected one of {:?}, got {:?}", UNIT_NAMES, self.units),
            ));
        }
        Ok(())
    }
}

fn default_cluster_threshold_m() -> f64 {
    2.0
}

fn default_radius_km() -> f64 {
    100.0
}

fn default_category() -> String {
    "all".to_string()
}

fn default_units() -> String {
    "km".to_string()
}

/// Live sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Quiet period after the last change notification before refreshing
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Wait before re-opening a failed subscription
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Growth factor of the retry delay per consecutive failure; 1.0 keeps it fixed
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: f64,

    /// Upper bound on a single retry delay
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Stop after this many consecutive subscribe failures; unset retries forever
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Fetch once on mount, before the first notification arrives
    #[serde(default = "default_true")]
    pub initial_fetch: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_backoff: default_retry_backoff(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            max_attempts: None,
            initial_fetch: true,
        }
    }
}

impl SyncConfig {
    /// Debounce window as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Subscription retry policy
    pub fn retry(&self) -> RetryConfig {
        let delay = Duration::from_millis(self.retry_delay_ms);
        let policy = if self.retry_backoff > 1.0 {
            RetryConfig::exponential(
                delay,
                Duration::from_millis(self.retry_max_delay_ms),
                self.retry_backoff,
            )
        } else {
            RetryConfig::fixed(delay)
        };

        match self.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(Error::invalid_config_value(
                "sync.debounce_ms",
                "must be greater than zero",
            ));
        }
        if self.retry_delay_ms == 0 {
            return Err(Error::invalid_config_value(
                "sync.retry_delay_ms",
                "must be greater than zero",
            ));
        }
        if !(self.retry_backoff.is_finite() && self.retry_backoff >= 1.0) {
            return Err(Error::invalid_config_value(
                "sync.retry_backoff",
                "must be a number no smaller than 1.0",
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::invalid_config_value(
                "sync.max_attempts",
                "must be at least 1; omit it to retry forever",
            ));
        }
        Ok(())
    }
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_retry_backoff() -> f64 {
    1.0
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySettings {
    /// Default level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,

    /// Optional directory for a daily rolling log file
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            log_dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let schema = ConfigSchema::default();
        assert_eq!(schema.map.cluster_threshold_m, 2.0);
        assert_eq!(schema.map.category, "all");
        assert_eq!(schema.sync.debounce(), Duration::from_millis(300));
        assert_eq!(schema.sync.retry().initial_delay, Duration::from_secs(2));
        assert!(schema.sync.retry().max_attempts.is_none());
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [map]
            radius_km = 25.0
            category = "hazard"

            [sync]
            debounce_ms = 150
            "#,
        )
        .unwrap();

        assert_eq!(schema.map.radius_km, 25.0);
        assert_eq!(schema.map.category, "hazard");
        assert_eq!(schema.map.cluster_threshold_m, 2.0);
        assert_eq!(schema.sync.debounce_ms, 150);
        assert_eq!(schema.sync.retry_delay_ms, 2000);
        assert_eq!(schema.telemetry.log_level, "info");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut schema = ConfigSchema::default();
        schema.map.radius_km = 0.0;
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.map.category = "parade".into();
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.map.units = "leagues".into();
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.sync.debounce_ms = 0;
        let err = schema.validate().unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::InvalidConfigValue);

        let mut schema = ConfigSchema::default();
        schema.sync.retry_backoff = 0.5;
        assert!(schema.validate().is_err());

        let mut schema = ConfigSchema::default();
        schema.sync.max_attempts = Some(0);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_sync_retry_policy_from_toml() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [sync]
            retry_delay_ms = 500
            retry_backoff = 2.0
            retry_max_delay_ms = 1500
            max_attempts = 4
            "#,
        )
        .unwrap();
        assert!(schema.validate().is_ok());

        let retry = schema.sync.retry();
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(1500));
        assert!(retry.allows_attempt(3));
        assert!(!retry.allows_attempt(4));
    }
}
