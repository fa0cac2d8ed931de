//! `pinmap nearby`

use super::load_entities;
use crate::output::{print_json, Status};
use crate::Format;
use anyhow::Result;
use pinmap_core::error::exit_codes;
use pinmap_geo::batch::{calculate_distances_sorted, calculate_distances_within_radius};
use pinmap_geo::{format_distance, Coordinate, DistanceResult, DistanceUnit};
use pinmap_live::ReportEntity;
use std::path::Path;

pub fn run(
    file: &Path,
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
    limit: Option<usize>,
    format: Format,
) -> Result<i32> {
    let reference = Coordinate::new(lat, lng);
    if !reference.is_valid() {
        Status::error(&format!("Invalid reference point {reference}"));
        return Ok(exit_codes::VALIDATION_ERROR);
    }

    let reports = load_entities(file)?;
    let ranked = rank(&reference, &reports, radius_km, limit);

    match format {
        Format::Json => print_json(&ranked)?,
        Format::Text => {
            Status::header(&format!("{} reports near {reference}", ranked.len()));
            for result in &ranked {
                let description = reports
                    .iter()
                    .find(|r| r.id == result.id)
                    .map_or("", |r| r.description.as_str());
                println!(
                    "  #{:<5} {:<14} {}",
                    result.id,
                    format_distance(result.distance, DistanceUnit::Km),
                    description
                );
            }
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// Nearest first; malformed locations are left out
fn rank(
    reference: &Coordinate,
    reports: &[ReportEntity],
    radius_km: Option<f64>,
    limit: Option<usize>,
) -> Vec<DistanceResult> {
    let mut ranked = match radius_km {
        Some(radius) => calculate_distances_within_radius(reference, reports, radius),
        None => calculate_distances_sorted(reference, reports, None),
    };
    ranked.retain(|r| r.distance.is_finite());
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;

    #[test]
    fn test_rank_from_calgary() {
        let file = fixtures::report_file();
        let reports = load_entities(file.path()).unwrap();
        let calgary = Coordinate::new(51.0447, -114.0719);

        let ranked = rank(&calgary, &reports, None, None);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].id, 4);
        assert!(ranked[0].distance < 0.001);

        let limited = rank(&calgary, &reports, None, Some(2));
        assert_eq!(limited.len(), 2);

        let close = rank(&calgary, &reports, Some(10.0), None);
        assert_eq!(close.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4]);
    }
}
