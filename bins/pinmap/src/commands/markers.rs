//! `pinmap markers`

use super::load_entities;
use crate::output::{format_coordinate, print_json, Status};
use crate::{AreaArgs, Format};
use anyhow::{anyhow, Result};
use owo_colors::OwoColorize;
use pinmap_core::config::Config;
use pinmap_core::error::exit_codes;
use pinmap_geo::Coordinate;
use pinmap_live::{locate, FixedLocation, LocationStatus, MapSettings, MapView, Marker};
use std::path::Path;

pub async fn run(file: &Path, area: &AreaArgs, config: &Config, format: Format) -> Result<i32> {
    let (markers, status) = build_markers(file, area, config).await?;

    if let Some(message) = status.user_message() {
        if format == Format::Text {
            Status::warning(message);
        }
    }

    match format {
        Format::Json => print_json(&markers)?,
        Format::Text => print_markers(&markers),
    }

    Ok(exit_codes::SUCCESS)
}

/// Load the file and lay out markers around the optional viewer position
pub async fn build_markers(
    file: &Path,
    area: &AreaArgs,
    config: &Config,
) -> Result<(Vec<Marker>, LocationStatus)> {
    let mut settings = MapSettings::try_from(&config.schema.map)?;
    if let Some(radius) = area.radius {
        settings.radius_km = radius;
    }
    if let Some(category) = &area.category {
        settings.category = category.parse()?;
    }
    if let Some(units) = &area.units {
        settings.units = units.parse().map_err(|e: String| anyhow!(e))?;
    }

    let provider = match (area.lat, area.lng) {
        (Some(lat), Some(lng)) => FixedLocation::at(Coordinate::new(lat, lng)),
        _ => FixedLocation::unavailable(),
    };
    let status = locate(&provider).await;

    let mut view = MapView::new(settings);
    view.apply_refresh(load_entities(file)?);
    view.set_location(&status);

    Ok((view.render(), status))
}

fn print_markers(markers: &[Marker]) {
    Status::header(&format!("{} markers", markers.len()));

    for marker in markers {
        let cluster = if marker.cluster_size > 1 {
            format!(" [stack of {}]", marker.cluster_size)
        } else {
            String::new()
        };
        let distance = marker.distance_label.as_deref().unwrap_or("");

        println!(
            "  #{:<5} {:<7} {} {}{} {}",
            marker.id,
            marker.category.to_string().cyan(),
            format_coordinate(&marker.display),
            marker.description,
            cluster.dimmed(),
            distance.dimmed(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[tokio::test]
    async fn test_markers_around_viewer() {
        let file = fixtures::report_file();
        let area = AreaArgs {
            lat: Some(45.4215),
            lng: Some(-75.6972),
            radius: Some(100.0),
            ..AreaArgs::default()
        };

        let (markers, status) = build_markers(file.path(), &area, &Config::default())
            .await
            .unwrap();

        assert!(matches!(status, LocationStatus::Located(_)));
        assert_eq!(markers.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(markers.iter().all(|m| m.cluster_size == 3));
        assert!(markers.iter().all(|m| m.distance_label.is_some()));
    }

    #[tokio::test]
    async fn test_markers_without_position_show_all_valid() {
        let file = fixtures::report_file();
        let (markers, status) = build_markers(file.path(), &AreaArgs::default(), &Config::default())
            .await
            .unwrap();

        assert!(status.user_message().is_some());
        assert_eq!(markers.len(), 4);
        assert!(markers.iter().all(|m| m.distance_km.is_none()));
    }

    #[tokio::test]
    async fn test_category_override() {
        let file = fixtures::report_file();
        let area = AreaArgs {
            category: Some("safety".to_string()),
            ..AreaArgs::default()
        };
        let (markers, _) = build_markers(file.path(), &area, &Config::default())
            .await
            .unwrap();

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].id, 3);
        // Still spread: clustering runs before the category filter
        assert_eq!(markers[0].cluster_size, 3);
        assert_ne!(markers[0].display, markers[0].position);
    }
}
