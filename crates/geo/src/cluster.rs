//! Greedy proximity clustering.
//!
//! Items are visited once, in input order. Each item joins the first existing
//! cluster whose running centroid lies within the threshold, or starts a new
//! cluster. The first-match tie-break (rather than nearest-match) is kept on
//! purpose: member order inside a cluster drives the radial layout in
//! [`crate::display_coordinate`], so changing it would move markers.
//!
//! Cost is O(n·k) for n items and k clusters; reports are usually spread out,
//! so k stays small.

use crate::{haversine_distance_meters, Coordinate, Geotagged};
use serde::Serialize;
use std::collections::HashMap;

/// Default clustering threshold in meters.
pub const DEFAULT_CLUSTER_THRESHOLD_M: f64 = 2.0;

/// A group of items whose true positions are within the threshold of its centroid.
#[derive(Debug, Clone, Serialize)]
pub struct Cluster {
    center: Coordinate,
    members: Vec<i64>,
    #[serde(skip)]
    lat_sum: f64,
    #[serde(skip)]
    lng_sum: f64,
}

impl Cluster {
    fn new(id: i64, coord: Coordinate) -> Self {
        Self {
            center: coord,
            members: vec![id],
            lat_sum: coord.latitude,
            lng_sum: coord.longitude,
        }
    }

    /// O(1) centroid update from the running sums.
    fn push(&mut self, id: i64, coord: Coordinate) {
        self.members.push(id);
        self.lat_sum += coord.latitude;
        self.lng_sum += coord.longitude;
        let n = self.members.len() as f64;
        self.center = Coordinate::new(self.lat_sum / n, self.lng_sum / n);
    }

    /// Running average of member coordinates.
    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// Member ids in insertion order.
    pub fn members(&self) -> &[i64] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Clusters always hold at least one member; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Clusters built from one refresh, with an id index for O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
    /// id -> (cluster index, position within that cluster)
    index: HashMap<i64, (usize, usize)>,
}

impl ClusterSet {
    /// All clusters in creation order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True when no item had a valid coordinate.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Iterate over clusters.
    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    /// The cluster containing `id` and the item's position in it.
    pub fn locate(&self, id: i64) -> Option<(&Cluster, usize)> {
        let (cluster_idx, member_idx) = *self.index.get(&id)?;
        Some((&self.clusters[cluster_idx], member_idx))
    }

    /// Total number of clustered items.
    pub fn member_count(&self) -> usize {
        self.index.len()
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Group items whose coordinates lie within `threshold_m` meters of a cluster centroid.
///
/// Items without a valid coordinate are skipped. A repeated id keeps its first
/// placement.
///
/// # Example
/// ```
/// use pinmap_geo::{build_clusters, LocatedItem};
///
/// let items = vec![
///     LocatedItem::new(1, "(45.0,-75.0)"),
///     LocatedItem::new(2, "(45.0,-75.0)"),
///     LocatedItem::new(3, "(46.0,-75.0)"),
/// ];
///
/// let clusters = build_clusters(&items, 2.0);
/// assert_eq!(clusters.len(), 2);
/// assert_eq!(clusters.clusters()[0].members(), &[1, 2]);
/// ```
pub fn build_clusters<T: Geotagged>(items: &[T], threshold_m: f64) -> ClusterSet {
    let mut set = ClusterSet::default();

    for item in items {
        let id = item.id();
        if set.index.contains_key(&id) {
            continue;
        }
        let Some(coord) = item.coordinate() else {
            continue;
        };

        let existing = set
            .clusters
            .iter()
            .position(|c| haversine_distance_meters(&c.center, &coord) <= threshold_m);

        match existing {
            Some(cluster_idx) => {
                let cluster = &mut set.clusters[cluster_idx];
                let member_idx = cluster.members.len();
                cluster.push(id, coord);
                set.index.insert(id, (cluster_idx, member_idx));
            }
            None => {
                set.index.insert(id, (set.clusters.len(), 0));
                set.clusters.push(Cluster::new(id, coord));
            }
        }
    }

    set
}
