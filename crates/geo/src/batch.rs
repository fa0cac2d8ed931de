//! Batch distance calculations.
//!
//! Distances from one reference point (usually the viewer's location) to many
//! geotagged items. Items with malformed locations get an infinite distance so
//! they sort last and fall outside every radius.

use crate::{haversine_distance, parse_point, Coordinate, Geotagged};
use serde::{Deserialize, Serialize};

/// Result of a distance calculation for a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceResult {
    /// The item ID
    pub id: i64,
    /// Calculated distance in kilometers (Infinity if location is invalid)
    pub distance: f64,
}

/// Minimal geotagged record: an id plus its stored location text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatedItem {
    /// Item ID
    pub id: i64,
    /// Location in `(lat,lng)` text form
    pub location: String,
}

impl LocatedItem {
    /// Create an item from an id and a stored location.
    pub fn new(id: i64, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
        }
    }
}

impl Geotagged for LocatedItem {
    fn id(&self) -> i64 {
        self.id
    }

    fn coordinate(&self) -> Option<Coordinate> {
        parse_point(&self.location)
    }
}

/// Calculate distances from `reference` to every item, in input order.
///
/// # Example
/// ```
/// use pinmap_geo::{calculate_distances, Coordinate, LocatedItem};
///
/// let items = vec![
///     LocatedItem::new(1, "(52.5200,13.4050)"),
///     LocatedItem::new(2, "garbage"),
/// ];
///
/// let results = calculate_distances(&Coordinate::new(50.0, 10.0), &items);
/// assert_eq!(results.len(), 2);
/// assert!(results[1].distance.is_infinite());
/// ```
pub fn calculate_distances<T: Geotagged>(
    reference: &Coordinate,
    items: &[T],
) -> Vec<DistanceResult> {
    items
        .iter()
        .map(|item| calculate_single_distance(reference, item))
        .collect()
}

/// Calculate distances and return items sorted by distance.
///
/// # Arguments
/// * `reference` - Point to measure from
/// * `items` - Slice of geotagged items
/// * `max_results` - Maximum number of results to return (None for all)
pub fn calculate_distances_sorted<T: Geotagged>(
    reference: &Coordinate,
    items: &[T],
    max_results: Option<usize>,
) -> Vec<DistanceResult> {
    let mut results = calculate_distances(reference, items);

    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    if let Some(max) = max_results {
        results.truncate(max);
    }

    results
}

/// Calculate distances for items within `radius_km`, sorted closest first.
pub fn calculate_distances_within_radius<T: Geotagged>(
    reference: &Coordinate,
    items: &[T],
    radius_km: f64,
) -> Vec<DistanceResult> {
    let mut results = calculate_distances(reference, items);

    results.retain(|r| r.distance <= radius_km);
    results.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    results
}

/// Distance for a single item, or infinity when its location is malformed.
#[inline]
pub fn calculate_single_distance<T: Geotagged>(reference: &Coordinate, item: &T) -> DistanceResult {
    let distance = item
        .coordinate()
        .map(|coord| haversine_distance(reference, &coord))
        .unwrap_or(f64::INFINITY);

    DistanceResult {
        id: item.id(),
        distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // User in Ottawa
    const OTTAWA: Coordinate = Coordinate { latitude: 45.4215, longitude: -75.6972 };

    fn create_test_items() -> Vec<LocatedItem> {
        vec![
            // Toronto, ~350 km
            LocatedItem::new(1, "(43.6532,-79.3832)"),
            // Montreal, ~165 km
            LocatedItem::new(2, "(45.5019,-73.5674)"),
            // Vancouver, ~3550 km
            LocatedItem::new(3, "(49.2827,-123.1207)"),
            // Invalid location
            LocatedItem::new(4, "(abc,def)"),
        ]
    }

    #[test]
    fn test_batch_distances() {
        let items = create_test_items();
        let results = calculate_distances(&OTTAWA, &items);

        assert_eq!(results.len(), 4);

        let montreal = results.iter().find(|r| r.id == 2).unwrap();
        assert!(montreal.distance > 100.0 && montreal.distance < 250.0);

        let invalid = results.iter().find(|r| r.id == 4).unwrap();
        assert!(invalid.distance.is_infinite());
    }

    #[test]
    fn test_sorted_distances() {
        let items = create_test_items();
        let results = calculate_distances_sorted(&OTTAWA, &items, None);

        let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_radius_filter() {
        let items = create_test_items();
        let results = calculate_distances_within_radius(&OTTAWA, &items, 400.0);

        let ids: Vec<i64> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_max_results() {
        let items = create_test_items();
        let results = calculate_distances_sorted(&OTTAWA, &items, Some(2));

        assert_eq!(results.len(), 2);
    }
}
