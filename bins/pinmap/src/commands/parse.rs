//! `pinmap parse`

use crate::output::{format_coordinate, print_json, Status};
use crate::Format;
use anyhow::Result;
use pinmap_core::error::exit_codes;
use pinmap_geo::try_parse_point;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ParseOutcome<'a> {
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Parse each location; exits with a validation error if any is malformed
pub fn run(locations: &[String], format: Format) -> Result<i32> {
    let outcomes: Vec<ParseOutcome<'_>> = locations
        .iter()
        .map(|input| match try_parse_point(input) {
            Ok(coord) => ParseOutcome {
                input,
                latitude: Some(coord.latitude),
                longitude: Some(coord.longitude),
                error: None,
            },
            Err(err) => ParseOutcome {
                input,
                latitude: None,
                longitude: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    match format {
        Format::Json => print_json(&outcomes)?,
        Format::Text => {
            for outcome in &outcomes {
                match (&outcome.error, outcome.latitude.zip(outcome.longitude)) {
                    (None, Some((lat, lng))) => Status::success(&format!(
                        "{} → {}",
                        outcome.input,
                        format_coordinate(&pinmap_geo::Coordinate::new(lat, lng))
                    )),
                    (Some(err), _) => Status::error(&format!("{}: {}", outcome.input, err)),
                    (None, None) => {}
                }
            }
        }
    }

    Ok(if failed == 0 {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_ERROR
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_reflects_failures() {
        let good = vec!["(45.0,-75.0)".to_string()];
        assert_eq!(run(&good, Format::Json).unwrap(), exit_codes::SUCCESS);

        let mixed = vec!["(45.0,-75.0)".to_string(), "nowhere".to_string()];
        assert_eq!(run(&mixed, Format::Json).unwrap(), exit_codes::VALIDATION_ERROR);
    }
}
