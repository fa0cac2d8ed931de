//! `pinmap distance`

use crate::output::print_json;
use crate::Format;
use anyhow::{anyhow, Result};
use pinmap_core::config::Config;
use pinmap_core::error::exit_codes;
use pinmap_geo::{
    format_distance, format_distance_compact, haversine_distance, try_parse_point, DistanceUnit,
};
use serde_json::json;

pub fn run(
    from: &str,
    to: &str,
    units: Option<&str>,
    config: &Config,
    format: Format,
) -> Result<i32> {
    let unit: DistanceUnit = units
        .unwrap_or(&config.schema.map.units)
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let a = try_parse_point(from)?;
    let b = try_parse_point(to)?;
    let km = haversine_distance(&a, &b);

    match format {
        Format::Json => print_json(&json!({
            "from": a,
            "to": b,
            "distance_km": km,
            "label": format_distance(km, unit),
            "compact": format_distance_compact(km, unit),
        }))?,
        Format::Text => println!(
            "{} ({})",
            format_distance(km, unit),
            format_distance_compact(km, unit)
        ),
    }

    Ok(exit_codes::SUCCESS)
}
