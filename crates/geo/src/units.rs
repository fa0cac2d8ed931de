//! Distance units and human-readable formatting.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kilometers to statute miles.
pub const KM_TO_MILES: f64 = 0.621371;

const FEET_PER_MILE: f64 = 5280.0;

/// Unit preference for displayed distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    /// Kilometers (meters for short distances)
    #[default]
    #[serde(alias = "kilometers", alias = "metric")]
    Km,
    /// Miles (feet for short distances)
    #[serde(alias = "mi", alias = "imperial")]
    Miles,
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "km" | "kilometers" | "metric" => Ok(Self::Km),
            "mi" | "miles" | "imperial" => Ok(Self::Miles),
            other => Err(format!("Unknown distance unit: {other}")),
        }
    }
}

/// Convert kilometers to miles.
#[inline]
pub fn km_to_miles(km: f64) -> f64 {
    km * KM_TO_MILES
}

/// Convert miles to kilometers (exact inverse of [`km_to_miles`]).
#[inline]
pub fn miles_to_km(miles: f64) -> f64 {
    miles / KM_TO_MILES
}

/// Map-facing distance label, e.g. `"1.5 km away"` or `"621 mi away"`.
///
/// Values below 10 keep one decimal place; larger values are rounded.
///
/// # Example
/// ```
/// use pinmap_geo::{format_distance, DistanceUnit};
///
/// assert_eq!(format_distance(1.5, DistanceUnit::Km), "1.5 km away");
/// assert_eq!(format_distance(1000.0, DistanceUnit::Miles), "621 mi away");
/// ```
pub fn format_distance(distance_km: f64, unit: DistanceUnit) -> String {
    let (value, suffix) = match unit {
        DistanceUnit::Km => (distance_km, "km"),
        DistanceUnit::Miles => (km_to_miles(distance_km), "mi"),
    };
    format!("{} {} away", format_magnitude(value), suffix)
}

/// Short-form label for detail views, e.g. `"350 m"`, `"2.4 km"`, `"820 ft"`.
///
/// Below one kilometer (or mile) the smaller unit is used, rounded.
pub fn format_distance_compact(distance_km: f64, unit: DistanceUnit) -> String {
    match unit {
        DistanceUnit::Km if distance_km < 1.0 => {
            format!("{:.0} m", distance_km * 1000.0)
        }
        DistanceUnit::Km => format!("{} km", format_magnitude(distance_km)),
        DistanceUnit::Miles => {
            let miles = km_to_miles(distance_km);
            if miles < 1.0 {
                format!("{:.0} ft", miles * FEET_PER_MILE)
            } else {
                format!("{} mi", format_magnitude(miles))
            }
        }
    }
}

fn format_magnitude(value: f64) -> String {
    if value < 10.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.0}", value.round())
    }
}
