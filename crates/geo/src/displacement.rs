//! Radial displacement of clustered markers.
//!
//! Members of a multi-item cluster are spread on a circle around the cluster
//! centroid ("starburst"), one slot per member, in member order. The output is a
//! pure function of the cluster set, so unchanged data always lays out the same.

use crate::{ClusterSet, Coordinate};
use std::f64::consts::PI;

/// Meters per degree of latitude (equirectangular approximation).
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

const BASE_RADIUS_M: f64 = 6.0;
const RADIUS_PER_MEMBER_M: f64 = 2.0;
const MAX_RADIUS_M: f64 = 40.0;

/// Floor for cos(latitude) so longitude offsets stay finite at the poles.
const MIN_LON_SCALE: f64 = 1e-6;

/// Separation radius in meters for a cluster of `count` members.
#[inline]
pub fn separation_radius_m(count: usize) -> f64 {
    (BASE_RADIUS_M + count as f64 * RADIUS_PER_MEMBER_M).min(MAX_RADIUS_M)
}

/// Where to draw the item `id` whose true position is `true_coord`.
///
/// Singletons, and ids that are not in any cluster, are drawn at their true
/// position. Offsets never leave the valid range: latitude is clamped at the
/// poles and longitude wraps across the antimeridian.
///
/// # Example
/// ```
/// use pinmap_geo::{build_clusters, display_coordinate, haversine_distance_meters, LocatedItem};
///
/// let items = vec![LocatedItem::new(1, "(45.0,-75.0)"), LocatedItem::new(2, "(45.0,-75.0)")];
/// let clusters = build_clusters(&items, 2.0);
///
/// let truth = clusters.clusters()[0].center();
/// let a = display_coordinate(1, truth, &clusters);
/// let b = display_coordinate(2, truth, &clusters);
/// assert!(haversine_distance_meters(&a, &b) > 1.0);
/// ```
pub fn display_coordinate(id: i64, true_coord: Coordinate, clusters: &ClusterSet) -> Coordinate {
    let Some((cluster, index)) = clusters.locate(id) else {
        return true_coord;
    };

    let count = cluster.len();
    if count <= 1 {
        return true_coord;
    }

    let center = cluster.center();
    let radius = separation_radius_m(count);
    let angle = 2.0 * PI * index as f64 / count as f64;

    let meters_per_degree_lon =
        METERS_PER_DEGREE_LAT * center.latitude.to_radians().cos().max(MIN_LON_SCALE);

    let d_lat = radius * angle.cos() / METERS_PER_DEGREE_LAT;
    let d_lon = radius * angle.sin() / meters_per_degree_lon;

    Coordinate::new(
        (center.latitude + d_lat).clamp(-90.0, 90.0),
        wrap_longitude(center.longitude + d_lon),
    )
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_clusters, haversine_distance_meters, Geotagged, LocatedItem};

    fn stacked(n: i64) -> Vec<LocatedItem> {
        (1..=n).map(|id| LocatedItem::new(id, "(45.4215,-75.6972)")).collect()
    }

    #[test]
    fn test_radius_grows_and_caps() {
        assert_eq!(separation_radius_m(2), 10.0);
        assert_eq!(separation_radius_m(5), 16.0);
        assert_eq!(separation_radius_m(17), 40.0);
        assert_eq!(separation_radius_m(500), 40.0);
    }

    #[test]
    fn test_singleton_is_unchanged() {
        let items = vec![LocatedItem::new(1, "(10.0,20.0)"), LocatedItem::new(2, "(30.0,40.0)")];
        let set = build_clusters(&items, 2.0);
        let truth = items[0].coordinate().unwrap();
        assert_eq!(display_coordinate(1, truth, &set), truth);
    }

    #[test]
    fn test_unknown_id_is_unchanged() {
        let set = build_clusters(&stacked(3), 2.0);
        let truth = Coordinate::new(1.0, 2.0);
        assert_eq!(display_coordinate(99, truth, &set), truth);
    }

    #[test]
    fn test_members_are_spread_and_bounded() {
        for n in [2, 3, 8, 30] {
            let items = stacked(n);
            let set = build_clusters(&items, 2.0);
            assert_eq!(set.len(), 1);
            let center = set.clusters()[0].center();

            let points: Vec<Coordinate> = items
                .iter()
                .map(|item| display_coordinate(item.id, item.coordinate().unwrap(), &set))
                .collect();

            for p in &points {
                let d = haversine_distance_meters(&center, p);
                assert!(d <= MAX_RADIUS_M + 0.5, "n={} d={}", n, d);
                assert!((d - separation_radius_m(n as usize)).abs() < 0.5);
            }
            for (i, a) in points.iter().enumerate() {
                for b in &points[i + 1..] {
                    assert!(haversine_distance_meters(a, b) > 0.5, "n={}", n);
                }
            }
        }
    }

    #[test]
    fn test_first_member_points_north() {
        let items = stacked(4);
        let set = build_clusters(&items, 2.0);
        let center = set.clusters()[0].center();
        let first = display_coordinate(1, center, &set);
        assert!(first.latitude > center.latitude);
        assert!((first.longitude - center.longitude).abs() < 1e-12);
    }

    #[test]
    fn test_layout_is_stable_across_runs() {
        let items = stacked(5);
        let a = build_clusters(&items, 2.0);
        let b = build_clusters(&items, 2.0);
        for item in &items {
            let truth = item.coordinate().unwrap();
            assert_eq!(
                display_coordinate(item.id, truth, &a),
                display_coordinate(item.id, truth, &b)
            );
        }
    }

    #[test]
    fn test_pole_stays_finite() {
        let items = vec![LocatedItem::new(1, "(90.0,0.0)"), LocatedItem::new(2, "(90.0,0.0)")];
        let set = build_clusters(&items, 2.0);
        let p = display_coordinate(2, Coordinate::new(90.0, 0.0), &set);
        assert!(p.latitude.is_finite() && p.longitude.is_finite());
    }

    #[test]
    fn test_offsets_stay_in_bounds_at_pole_and_antimeridian() {
        for location in ["(89.99999,179.99999)", "(-89.99999,-179.99999)"] {
            for n in [2, 3, 7] {
                let items: Vec<LocatedItem> =
                    (1..=n).map(|id| LocatedItem::new(id, location)).collect();
                let set = build_clusters(&items, 2.0);
                for item in &items {
                    let p = display_coordinate(item.id, item.coordinate().unwrap(), &set);
                    assert!(p.is_valid(), "{location} n={n} id={} -> {p:?}", item.id);
                }
            }
        }
    }

    #[test]
    fn test_longitude_wraps_across_antimeridian() {
        let items: Vec<LocatedItem> =
            (1..=3).map(|id| LocatedItem::new(id, "(0.0,179.99999)")).collect();
        let set = build_clusters(&items, 2.0);
        let center = set.clusters()[0].center();

        // Second member sits east of the centroid, past 180
        let east = display_coordinate(2, center, &set);
        assert!(east.is_valid());
        assert!(east.longitude < 0.0, "{east:?}");
        let d = haversine_distance_meters(&center, &east);
        assert!((d - separation_radius_m(3)).abs() < 0.5, "d={d}");
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(180.0), 180.0);
        assert_eq!(wrap_longitude(-180.0), -180.0);
        assert!((wrap_longitude(181.0) - -179.0).abs() < 1e-9);
        assert!((wrap_longitude(-181.0) - 179.0).abs() < 1e-9);
        assert!((wrap_longitude(540.5) + 179.5).abs() < 1e-9);
    }
}
