//! Terminal output helpers

use crate::Format;
use owo_colors::OwoColorize;
use pinmap_core::{Error as CoreError, ErrorCode};
use pinmap_geo::GeoError;
use pinmap_live::LiveError;

/// Status message helpers
pub struct Status;

impl Status {
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// Print `value` as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Give a command failure its error code, keeping the full message chain as
/// context
pub fn classify_failure(err: anyhow::Error) -> CoreError {
    let chain = format!("{err:#}");
    let core = into_core_error(err);
    if core.context.is_none() && core.message != chain {
        core.with_context(chain)
    } else {
        core
    }
}

fn into_core_error(err: anyhow::Error) -> CoreError {
    let err = match err.downcast::<CoreError>() {
        Ok(core) => return core,
        Err(err) => err,
    };
    let err = match err.downcast::<LiveError>() {
        Ok(live) => return live.into(),
        Err(err) => err,
    };
    let err = match err.downcast::<GeoError>() {
        Ok(geo) => {
            return CoreError::validation(geo.to_string())
                .with_suggestion("Locations look like \"(45.4215,-75.6972)\"")
                .with_source(geo)
        }
        Err(err) => err,
    };
    let err = match err.downcast::<serde_json::Error>() {
        Ok(json) => return json.into(),
        Err(err) => err,
    };
    match err.downcast::<std::io::Error>() {
        Ok(io) => io.into(),
        Err(err) => CoreError::new(ErrorCode::Unknown, err.to_string()),
    }
}

/// Print a failure in the selected format; JSON goes to stdout as an error report
pub fn report_failure(err: &CoreError, format: Format) {
    match format {
        Format::Json => {
            if let Err(print_err) = print_json(&serde_json::json!({ "error": err.to_report() })) {
                Status::error(&format!("{err} ({print_err})"));
            }
        }
        Format::Text => Status::error(&err.to_string()),
    }
}

/// Coordinate with a fixed number of decimals
pub fn format_coordinate(coord: &pinmap_geo::Coordinate) -> String {
    format!("({:.6}, {:.6})", coord.latitude, coord.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::load_reports;
    use anyhow::Context;
    use pinmap_core::error::exit_codes;
    use pinmap_geo::{try_parse_point, Coordinate};
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn test_classify_bad_point_as_validation() {
        let err = anyhow::Error::from(try_parse_point("north pole").unwrap_err());
        let core = classify_failure(err);

        assert_eq!(core.code, ErrorCode::ValidationError);
        assert_eq!(core.exit_code(), exit_codes::VALIDATION_ERROR);
        assert!(core.suggestion.is_some());
    }

    #[test]
    fn test_classify_live_error_keeps_context() {
        let result: anyhow::Result<()> = Err(LiveError::InvalidSetting {
            field: "units",
            value: "leagues".to_string(),
        })
        .context("Reading map settings");
        let core = classify_failure(result.unwrap_err());

        assert_eq!(core.code, ErrorCode::InvalidInput);
        assert!(core.context.as_deref().unwrap().starts_with("Reading map settings"));

        let report = serde_json::to_value(core.to_report()).unwrap();
        assert_eq!(report["category"], "Validation");
        assert_eq!(report["code_str"], "E6001");
    }

    #[test]
    fn test_classify_missing_and_malformed_files() {
        let missing = load_reports(Path::new("/definitely/not/here.json")).unwrap_err();
        let core = classify_failure(missing);
        assert_eq!(core.code, ErrorCode::FileNotFound);
        assert!(core.context.unwrap().contains("Failed to read"));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"not\": \"a list\"}}").unwrap();
        let core = classify_failure(load_reports(file.path()).unwrap_err());
        assert_eq!(core.code, ErrorCode::InvalidFormat);
        assert_eq!(core.exit_code(), exit_codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_classify_plain_message() {
        let core = classify_failure(anyhow::anyhow!("Live sync closed before subscribing"));
        assert_eq!(core.code, ErrorCode::Unknown);
        assert_eq!(core.exit_code(), exit_codes::FAILURE);
        assert!(core.context.is_none());
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(
            format_coordinate(&Coordinate::new(45.4215, -75.6972)),
            "(45.421500, -75.697200)"
        );
    }
}
