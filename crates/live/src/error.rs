//! Error types for the live map engine

use pinmap_core::{Error as CoreError, ErrorCode};
use thiserror::Error;

/// Result type alias for live map operations
pub type LiveResult<T> = Result<T, LiveError>;

/// Live map errors
#[derive(Error, Debug)]
pub enum LiveError {
    /// Reading from the report store failed
    #[error("Report store error: {0}")]
    Store(String),

    /// Opening or keeping a change subscription failed
    #[error("Subscription failed: {0}")]
    Subscription(String),

    /// The device could not produce a position
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The user declined location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// A map setting could not be interpreted
    #[error("Invalid {field}: {value}")]
    InvalidSetting {
        /// Setting name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error code for integration with pinmap-core error handling.
/// Range: 11xxx for live map errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveErrorCode {
    /// Store read failure
    Store = 11001,
    /// Subscription failure
    Subscription = 11002,
    /// No position available
    LocationUnavailable = 11003,
    /// Location permission denied
    PermissionDenied = 11004,
    /// Bad setting value
    InvalidSetting = 11005,
    /// JSON parsing error
    Json = 11006,
}

impl LiveError {
    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a subscription error
    pub fn subscription(msg: impl Into<String>) -> Self {
        Self::Subscription(msg.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> LiveErrorCode {
        match self {
            Self::Store(_) => LiveErrorCode::Store,
            Self::Subscription(_) => LiveErrorCode::Subscription,
            Self::LocationUnavailable(_) => LiveErrorCode::LocationUnavailable,
            Self::PermissionDenied => LiveErrorCode::PermissionDenied,
            Self::InvalidSetting { .. } => LiveErrorCode::InvalidSetting,
            Self::Json(_) => LiveErrorCode::Json,
        }
    }
}

impl From<LiveError> for CoreError {
    fn from(err: LiveError) -> Self {
        let code = match err.code() {
            LiveErrorCode::Store => ErrorCode::FetchFailed,
            LiveErrorCode::Subscription => ErrorCode::SubscriptionFailed,
            LiveErrorCode::LocationUnavailable => ErrorCode::LocationUnavailable,
            LiveErrorCode::PermissionDenied => ErrorCode::LocationDenied,
            LiveErrorCode::InvalidSetting => ErrorCode::InvalidInput,
            LiveErrorCode::Json => ErrorCode::InvalidFormat,
        };
        let suggestion = match &err {
            LiveError::PermissionDenied => Some("Allow location access to filter by distance"),
            LiveError::InvalidSetting { .. } => {
                Some("Check the [map] section of the config file and the command flags")
            }
            LiveError::Json(_) => Some("Reports must be a JSON array of report objects"),
            _ => None,
        };

        let mut core = CoreError::new(code, err.to_string());
        if let Some(suggestion) = suggestion {
            core = core.with_suggestion(suggestion);
        }
        core.with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(LiveError::store("down").code() as u32, 11001);
        assert_eq!(
            LiveError::subscription("closed").code(),
            LiveErrorCode::Subscription
        );
    }

    #[test]
    fn test_into_core_error() {
        let core: CoreError = LiveError::PermissionDenied.into();
        assert_eq!(core.code, ErrorCode::LocationDenied);
        assert_eq!(core.code.category(), "Location");
        assert!(core.source.is_some());
        assert!(core.suggestion.is_some());

        let core: CoreError = LiveError::InvalidSetting {
            field: "units",
            value: "leagues".to_string(),
        }
        .into();
        assert_eq!(core.code, ErrorCode::InvalidInput);
        assert_eq!(core.exit_code(), pinmap_core::error::exit_codes::VALIDATION_ERROR);
    }
}
