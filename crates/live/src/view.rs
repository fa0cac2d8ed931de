//! Marker layout for the current report set
//!
//! [`MapView::render`] runs the whole pipeline: parse locations, cluster,
//! spread cluster members, then filter by category and radius.
//! [`follow_location`] re-runs it whenever the viewer moves.

use crate::error::{LiveError, LiveResult};
use crate::location::{LocationStatus, LocationWatch};
use crate::model::{Category, CategoryFilter, ReportEntity};
use crate::proximity::{ProximityFilter, Verdict};
use crate::render::{RenderMode, RenderStabilizer};
use pinmap_core::config::MapConfig;
use pinmap_geo::{
    build_clusters, display_coordinate, format_distance, Coordinate, DistanceUnit, Geotagged,
    DEFAULT_CLUSTER_THRESHOLD_M,
};
use pinmap_telemetry::Timer;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;

/// Layout and filter settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSettings {
    pub cluster_threshold_m: f64,
    pub radius_km: f64,
    pub category: CategoryFilter,
    pub units: DistanceUnit,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            cluster_threshold_m: DEFAULT_CLUSTER_THRESHOLD_M,
            radius_km: 100.0,
            category: CategoryFilter::All,
            units: DistanceUnit::Km,
        }
    }
}

impl TryFrom<&MapConfig> for MapSettings {
    type Error = LiveError;

    fn try_from(config: &MapConfig) -> LiveResult<Self> {
        let units = config
            .units
            .parse::<DistanceUnit>()
            .map_err(|_| LiveError::InvalidSetting {
                field: "units",
                value: config.units.clone(),
            })?;

        Ok(Self {
            cluster_threshold_m: config.cluster_threshold_m,
            radius_km: config.radius_km,
            category: config.category.parse()?,
            units,
        })
    }
}

/// One pin to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: i64,
    pub category: Category,
    pub description: String,
    /// Where the report actually is
    pub position: Coordinate,
    /// Where the pin is drawn
    pub display: Coordinate,
    pub cluster_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_label: Option<String>,
    pub mode: RenderMode,
}

/// A report whose location already parsed
struct Located<'a> {
    report: &'a ReportEntity,
    coord: Coordinate,
}

impl Geotagged for Located<'_> {
    fn id(&self) -> i64 {
        self.report.id
    }

    fn coordinate(&self) -> Option<Coordinate> {
        Some(self.coord)
    }
}

/// Current reports, viewer position and marker readiness
#[derive(Debug, Clone, Default)]
pub struct MapView {
    reports: Vec<ReportEntity>,
    reference: Option<Coordinate>,
    settings: MapSettings,
    stabilizer: RenderStabilizer,
}

impl MapView {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replace the report set with a freshly fetched one
    pub fn apply_refresh(&mut self, reports: Vec<ReportEntity>) {
        let ids: HashSet<i64> = reports.iter().map(|r| r.id).collect();
        self.stabilizer.retain(&ids);
        debug!(count = reports.len(), "Applied report refresh");
        self.reports = reports;
    }

    pub fn set_location(&mut self, status: &LocationStatus) {
        self.reference = status.reference();
    }

    pub fn set_reference(&mut self, reference: Option<Coordinate>) {
        self.reference = reference;
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.settings.category = category;
    }

    pub fn set_radius_km(&mut self, radius_km: f64) {
        self.settings.radius_km = radius_km;
    }

    /// Record that a marker's visual rendered
    pub fn mark_ready(&mut self, id: i64) -> bool {
        self.stabilizer.mark_ready(id)
    }

    pub fn reports(&self) -> &[ReportEntity] {
        &self.reports
    }

    pub fn reference(&self) -> Option<Coordinate> {
        self.reference
    }

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn stabilizer(&self) -> &RenderStabilizer {
        &self.stabilizer
    }

    /// Markers to draw, in report order.
    ///
    /// Readiness flags of reports that are no longer drawn are dropped.
    pub fn render(&mut self) -> Vec<Marker> {
        let _timer = Timer::start("map.pipeline");

        let mut seen = HashSet::new();
        let located: Vec<Located<'_>> = self
            .reports
            .iter()
            .filter(|report| seen.insert(report.id))
            .filter_map(|report| report.coordinate().map(|coord| Located { report, coord }))
            .collect();

        let clusters = build_clusters(&located, self.settings.cluster_threshold_m);
        let filter = ProximityFilter::new(
            self.reference,
            self.settings.radius_km,
            self.settings.category,
        );

        let markers: Vec<Marker> = located
            .iter()
            .filter_map(|item| {
                let verdict = filter.evaluate(item.report.category, &item.coord);
                let Verdict::Keep { distance_km } = verdict else {
                    return None;
                };
                let id = item.report.id;

                Some(Marker {
                    id,
                    category: item.report.category,
                    description: item.report.description.clone(),
                    position: item.coord,
                    display: display_coordinate(id, item.coord, &clusters),
                    cluster_size: clusters.locate(id).map_or(1, |(cluster, _)| cluster.len()),
                    distance_km,
                    distance_label: distance_km.map(|d| format_distance(d, self.settings.units)),
                    mode: self.stabilizer.mode(id),
                })
            })
            .collect();

        let visible: HashSet<i64> = markers.iter().map(|m| m.id).collect();
        self.stabilizer.retain(&visible);

        debug!(
            reports = self.reports.len(),
            located = located.len(),
            clusters = clusters.len(),
            markers = markers.len(),
            "Rendered markers"
        );
        markers
    }
}

/// Feed every new reading from `watch` into `view` and hand the re-rendered
/// markers to `on_markers`.
///
/// The task ends when the watch stops; aborting it stops the watch.
pub fn follow_location<F>(
    view: Arc<Mutex<MapView>>,
    mut watch: LocationWatch,
    mut on_markers: F,
) -> JoinHandle<()>
where
    F: FnMut(Vec<Marker>) + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(status) = watch.changed().await {
            let markers = {
                let mut view = view.lock().unwrap_or_else(PoisonError::into_inner);
                view.set_location(&status);
                view.render()
            };
            debug!(markers = markers.len(), "Re-rendered after location change");
            on_markers(markers);
        }
    })
}
