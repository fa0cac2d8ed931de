//! Geospatial utilities for the Pinmap live report map.
//!
//! This crate provides:
//! - Parsing of stored `"(lat,lng)"` location strings, with axis-swap recovery
//! - Haversine distance calculations and km/mile formatting
//! - Greedy proximity clustering of geotagged items
//! - Deterministic radial displacement so overlapping markers stay tappable
//! - Batch distance helpers for radius filtering
//!
//! # Example
//!
//! ```
//! use pinmap_geo::{haversine_distance, parse_point, Coordinate};
//!
//! let ottawa = parse_point("(45.4215,-75.6972)").unwrap();
//! let toronto = Coordinate::new(43.6532, -79.3832);
//!
//! let distance_km = haversine_distance(&ottawa, &toronto);
//! assert!((distance_km - 352.0).abs() < 10.0);
//! ```

mod displacement;
mod error;
mod haversine;
mod point;
mod units;
pub mod batch;
pub mod cluster;

pub use batch::{calculate_distances, DistanceResult, LocatedItem};
pub use cluster::{build_clusters, Cluster, ClusterSet, DEFAULT_CLUSTER_THRESHOLD_M};
pub use displacement::{display_coordinate, separation_radius_m, METERS_PER_DEGREE_LAT};
pub use error::{GeoError, GeoErrorCode, Result};
pub use haversine::{
    approximate_distance, distance_km, haversine_distance, haversine_distance_meters,
    EARTH_RADIUS_KM, EARTH_RADIUS_M,
};
pub use point::{parse_point, try_parse_point};
pub use units::{
    format_distance, format_distance_compact, km_to_miles, miles_to_km, DistanceUnit,
    KM_TO_MILES,
};

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    ///
    /// No validation happens here; use [`Coordinate::is_valid`] or build
    /// coordinates through [`parse_point`].
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Returns true if the coordinate has finite, in-range values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.latitude, self.longitude)
    }
}

/// Anything that can take part in clustering and radius filtering.
///
/// `coordinate` returns `None` for items whose stored location is malformed;
/// those items are left off the map entirely.
pub trait Geotagged {
    /// Stable identifier assigned by the report store.
    fn id(&self) -> i64;

    /// The validated coordinate, if the stored location parses.
    fn coordinate(&self) -> Option<Coordinate>;
}

impl<T: Geotagged + ?Sized> Geotagged for &T {
    fn id(&self) -> i64 {
        (**self).id()
    }

    fn coordinate(&self) -> Option<Coordinate> {
        (**self).coordinate()
    }
}
