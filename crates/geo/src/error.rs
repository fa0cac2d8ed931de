//! Error types for the geo crate.

use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur while turning stored locations into coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// The text does not look like `(lat,lng)`
    #[error("Invalid point format: {0}")]
    InvalidPoint(String),

    /// A component parsed to NaN or infinity
    #[error("Non-finite coordinate component: {0}")]
    NonFinite(String),

    /// Parsed values fall outside latitude/longitude bounds, even after axis swap
    #[error("Coordinate out of bounds: latitude {latitude}, longitude {longitude}")]
    OutOfBounds {
        /// Latitude after any axis-swap correction
        latitude: f64,
        /// Longitude after any axis-swap correction
        longitude: f64,
    },
}

/// Error code for integration with pinmap-core error handling.
/// Range: 10xxx for geo errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoErrorCode {
    /// Invalid point text
    InvalidPoint = 10001,
    /// Non-finite number
    NonFinite = 10002,
    /// Out-of-range coordinate
    OutOfBounds = 10003,
}

impl GeoError {
    /// Returns the error code for this error.
    pub fn code(&self) -> GeoErrorCode {
        match self {
            GeoError::InvalidPoint(_) => GeoErrorCode::InvalidPoint,
            GeoError::NonFinite(_) => GeoErrorCode::NonFinite,
            GeoError::OutOfBounds { .. } => GeoErrorCode::OutOfBounds,
        }
    }
}
