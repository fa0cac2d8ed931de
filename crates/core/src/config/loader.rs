//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed settings
    pub schema: ConfigSchema,
    /// File the settings came from, if any
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path must exist; without one, the standard locations are
    /// searched and defaults are used when none is found.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Validate the loaded settings
    pub fn validate(&self) -> Result<()> {
        self.schema.validate().context(match &self.path {
            Some(p) => format!("In configuration file {}", p),
            None => "In default configuration".to_string(),
        })
    }
}

impl Default for Config {
    /// Defaults only (no file)
    fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [".pinmap.toml", "pinmap.toml", ".config/pinmap.toml"];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {}: {}", path, e)))?;

    let schema: ConfigSchema = toml::from_str(&content)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.sync.debounce_ms, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map]\nunits = \"miles\"\n[sync]\nretry_delay_ms = 500").unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        assert_eq!(config.schema.map.units, "miles");
        assert_eq!(config.schema.sync.retry_delay_ms, 500);
        assert!(config.path.is_some());
    }

    #[test]
    fn test_config_load_missing_explicit_file() {
        let err = Config::load(Some("/definitely/not/here/pinmap.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map\nradius_km = ").unwrap();

        let err = Config::load(file.path().to_str()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_validate_reports_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map]\nradius_km = -1.0").unwrap();

        let config = Config::load(file.path().to_str()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.context.unwrap().contains("In configuration file"));
    }
}
