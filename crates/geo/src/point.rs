//! Parsing of stored report locations.
//!
//! Reports carry their position as text shaped like `(lat,lng)`. Some producers
//! emit `(lng,lat)` instead; when the first value cannot be a latitude but the
//! second can, the pair is swapped before validation.

use crate::{Coordinate, GeoError, Result};
use tracing::warn;

/// Parse a stored `"(lat,lng)"` location into a validated coordinate.
///
/// Returns `None` for anything malformed or out of range; the anomaly is logged
/// at warning level and the caller should leave the item off the map.
///
/// # Example
/// ```
/// use pinmap_geo::parse_point;
///
/// let coord = parse_point("(45.4215, -75.6972)").unwrap();
/// assert_eq!(coord.latitude, 45.4215);
///
/// // Axis-swapped input is recovered
/// let swapped = parse_point("(-122.4194,37.7749)").unwrap();
/// assert_eq!(swapped.latitude, 37.7749);
///
/// assert!(parse_point("invalid").is_none());
/// ```
pub fn parse_point(text: &str) -> Option<Coordinate> {
    match try_parse_point(text) {
        Ok(coord) => Some(coord),
        Err(err) => {
            warn!(location = %text, error = %err, "Ignoring malformed location");
            None
        }
    }
}

/// Parse a stored location, reporting why it was rejected.
pub fn try_parse_point(text: &str) -> Result<Coordinate> {
    let inner = strip_delimiters(text);

    let mut parts = inner.split(',').map(str::trim);
    let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
        return Err(GeoError::InvalidPoint(format!("Expected two values, got: {}", text)));
    };

    let mut a = parse_component(first)?;
    let mut b = parse_component(second)?;

    if a.abs() > 90.0 && b.abs() <= 90.0 {
        std::mem::swap(&mut a, &mut b);
    }

    let coord = Coordinate::new(a, b);
    if !coord.is_valid() {
        return Err(GeoError::OutOfBounds { latitude: a, longitude: b });
    }

    Ok(coord)
}

/// Trim whitespace and at most one pair of surrounding parentheses.
fn strip_delimiters(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('(').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(')').unwrap_or(trimmed);
    trimmed.trim()
}

fn parse_component(part: &str) -> Result<f64> {
    let value: f64 = part
        .parse()
        .map_err(|_| GeoError::InvalidPoint(format!("Not a number: {:?}", part)))?;

    if !value.is_finite() {
        return Err(GeoError::NonFinite(part.to_string()));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_point() {
        let coord = parse_point("(45.4215,-75.6972)").unwrap();
        assert_eq!(coord, Coordinate::new(45.4215, -75.6972));
    }

    #[test]
    fn test_parse_with_whitespace_and_no_parens() {
        assert_eq!(parse_point("  ( 12.5 , 7.25 ) "), Some(Coordinate::new(12.5, 7.25)));
        assert_eq!(parse_point("12.5,7.25"), Some(Coordinate::new(12.5, 7.25)));
    }

    #[test]
    fn test_parse_swapped_axes() {
        let coord = parse_point("(-122.4194,37.7749)").unwrap();
        assert_eq!(coord, Coordinate::new(37.7749, -122.4194));
    }

    #[test]
    fn test_both_axes_large_is_rejected() {
        assert!(parse_point("(200,300)").is_none());
        assert_eq!(
            try_parse_point("(200,300)"),
            Err(GeoError::OutOfBounds { latitude: 200.0, longitude: 300.0 })
        );
    }

    #[test]
    fn test_swap_that_still_fails_bounds() {
        assert_eq!(parse_point("(150,45)"), Some(Coordinate::new(45.0, 150.0)));
        // Swapped, but 190 is still not a valid longitude
        assert!(parse_point("(190,45)").is_none());
        // Neither value can be a latitude, so no swap happens
        assert!(parse_point("(95,190)").is_none());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_point("invalid").is_none());
        assert!(parse_point("(abc,def)").is_none());
        assert!(parse_point("(45.0)").is_none());
        assert!(parse_point("").is_none());
        assert!(parse_point("(,)").is_none());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            try_parse_point("(NaN,10)").unwrap_err().code(),
            crate::GeoErrorCode::NonFinite
        );
        assert!(parse_point("(inf,10)").is_none());
    }

    #[test]
    fn test_extra_components_use_first_two() {
        assert_eq!(parse_point("(10,20,30)"), Some(Coordinate::new(10.0, 20.0)));
    }

    proptest! {
        #[test]
        fn prop_valid_pairs_round_trip(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            let text = format!("({},{})", lat, lng);
            prop_assert_eq!(parse_point(&text), Some(Coordinate::new(lat, lng)));
        }

        #[test]
        fn prop_swapped_pairs_are_recovered(
            lng in prop_oneof![-180.0f64..-90.001, 90.001f64..180.0],
            lat in -90.0f64..=90.0,
        ) {
            let text = format!("({},{})", lng, lat);
            prop_assert_eq!(parse_point(&text), Some(Coordinate::new(lat, lng)));
        }
    }
}
