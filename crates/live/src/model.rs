//! Report records as the map sees them
//!
//! A report is stored as a base row plus an optional per-category extension
//! row. [`ReportEntity::enrich`] joins the two; a missing extension row yields
//! empty details rather than an error.

use crate::error::LiveError;
use chrono::{DateTime, Utc};
use pinmap_geo::{parse_point, Coordinate, Geotagged};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Report category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Event,
    #[serde(alias = "safety")]
    Hazard,
    Lost,
    Found,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 4] = [Self::Event, Self::Hazard, Self::Lost, Self::Found];

    /// Lowercase name used in storage and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Hazard => "hazard",
            Self::Lost => "lost",
            Self::Found => "found",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = LiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "event" => Ok(Self::Event),
            "hazard" | "safety" => Ok(Self::Hazard),
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            _ => Err(LiveError::InvalidSetting {
                field: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// Category selection for the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Whether a report of `category` passes the filter
    #[inline]
    pub fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = LiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => category.fmt(f),
        }
    }
}

/// Category-specific fields from the extension row.
///
/// Absent fields deserialize as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CategoryDetails {
    Event {
        #[serde(default)]
        event_time: String,
        #[serde(default)]
        event_type: String,
    },
    #[serde(alias = "safety")]
    Hazard {
        #[serde(default)]
        hazard_type: String,
    },
    Lost {
        #[serde(default)]
        item_type: String,
        #[serde(default)]
        contact: String,
    },
    Found {
        #[serde(default)]
        item_type: String,
        #[serde(default)]
        contact: String,
    },
}

impl CategoryDetails {
    /// Details with every field empty
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Event => Self::Event {
                event_time: String::new(),
                event_type: String::new(),
            },
            Category::Hazard => Self::Hazard {
                hazard_type: String::new(),
            },
            Category::Lost => Self::Lost {
                item_type: String::new(),
                contact: String::new(),
            },
            Category::Found => Self::Found {
                item_type: String::new(),
                contact: String::new(),
            },
        }
    }

    /// The category these details belong to
    pub fn category(&self) -> Category {
        match self {
            Self::Event { .. } => Category::Event,
            Self::Hazard { .. } => Category::Hazard,
            Self::Lost { .. } => Category::Lost,
            Self::Found { .. } => Category::Found,
        }
    }
}

/// Fields common to every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseReport {
    pub id: i64,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    /// Stored location text, `(lat,lng)`; may be malformed
    pub location: String,
    pub created_at: DateTime<Utc>,
}

/// A base row with its extension row, as read from an export or seed file
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    #[serde(flatten)]
    pub base: BaseReport,
    #[serde(default)]
    pub details: Option<CategoryDetails>,
}

impl RawReport {
    /// Join into a full entity
    pub fn into_entity(self) -> ReportEntity {
        ReportEntity::enrich(self.base, self.details)
    }
}

/// A report joined with its category details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntity {
    pub id: i64,
    pub category: Category,
    pub description: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub details: CategoryDetails,
}

impl ReportEntity {
    /// Join a base row with its extension row.
    ///
    /// Missing rows, and rows recorded under another category, give empty
    /// details for the base row's category.
    pub fn enrich(base: BaseReport, extension: Option<CategoryDetails>) -> Self {
        let details = match extension {
            Some(details) if details.category() == base.category => details,
            Some(details) => {
                warn!(
                    report_id = base.id,
                    expected = %base.category,
                    found = %details.category(),
                    "Extension row has mismatched category; ignoring it"
                );
                CategoryDetails::empty(base.category)
            }
            None => CategoryDetails::empty(base.category),
        };

        Self {
            id: base.id,
            category: base.category,
            description: base.description,
            location: base.location,
            created_at: base.created_at,
            details,
        }
    }
}

impl Geotagged for ReportEntity {
    fn id(&self) -> i64 {
        self.id
    }

    fn coordinate(&self) -> Option<Coordinate> {
        parse_point(&self.location)
    }
}
