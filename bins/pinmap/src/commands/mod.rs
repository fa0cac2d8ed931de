//! Subcommand implementations

pub mod distance;
pub mod markers;
pub mod nearby;
pub mod parse;
pub mod watch;

use anyhow::{Context, Result};
use pinmap_live::{RawReport, ReportEntity};
use std::path::Path;

/// Read a JSON array of reports
pub fn load_reports(path: &Path) -> Result<Vec<RawReport>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let reports: Vec<RawReport> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid report file {}", path.display()))?;

    tracing::debug!(path = %path.display(), count = reports.len(), "Loaded reports");
    Ok(reports)
}

/// Read and join a JSON array of reports
pub fn load_entities(path: &Path) -> Result<Vec<ReportEntity>> {
    Ok(load_reports(path)?
        .into_iter()
        .map(RawReport::into_entity)
        .collect())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Three stacked reports in Ottawa, one in Calgary, one malformed
    pub const REPORTS: &str = r#"[
        {"id": 1, "category": "lost", "description": "wallet", "location": "(45.4215,-75.6972)", "created_at": "2026-03-01T10:00:00Z",
         "details": {"kind": "lost", "item_type": "wallet", "contact": "555-0100"}},
        {"id": 2, "category": "found", "description": "keys", "location": "(45.4215,-75.6972)", "created_at": "2026-03-01T11:00:00Z"},
        {"id": 3, "category": "safety", "description": "ice", "location": "( 45.4215 , -75.6972 )", "created_at": "2026-03-01T12:00:00Z"},
        {"id": 4, "category": "event", "description": "market", "location": "(51.0447,-114.0719)", "created_at": "2026-03-02T09:00:00Z"},
        {"id": 5, "category": "lost", "description": "cat", "location": "downtown", "created_at": "2026-03-02T10:00:00Z"}
    ]"#;

    pub fn report_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(REPORTS.as_bytes()).unwrap();
        file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinmap_live::{Category, CategoryDetails};

    #[test]
    fn test_load_entities() {
        let file = fixtures::report_file();
        let entities = load_entities(file.path()).unwrap();

        assert_eq!(entities.len(), 5);
        assert_eq!(entities[2].category, Category::Hazard);
        assert_eq!(entities[1].details, CategoryDetails::empty(Category::Found));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_reports(Path::new("/no/such/reports.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
