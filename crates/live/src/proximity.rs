//! Category and radius filtering around the viewer
//!
//! The category filter is applied first. Distance filtering only happens when
//! the viewer's position is known; otherwise every valid report is kept.

use crate::model::{Category, CategoryFilter, ReportEntity};
use pinmap_geo::{haversine_distance, Coordinate, Geotagged};

/// Decision for a single report
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// Shown; distance is present when the viewer's position is known
    Keep { distance_km: Option<f64> },
    WrongCategory,
    OutOfRange { distance_km: f64 },
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep { .. })
    }
}

/// Filter settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityFilter {
    pub reference: Option<Coordinate>,
    pub radius_km: f64,
    pub category: CategoryFilter,
}

impl ProximityFilter {
    pub fn new(reference: Option<Coordinate>, radius_km: f64, category: CategoryFilter) -> Self {
        Self {
            reference,
            radius_km,
            category,
        }
    }

    /// Judge one report at an already-validated coordinate
    pub fn evaluate(&self, category: Category, coord: &Coordinate) -> Verdict {
        if !self.category.matches(category) {
            return Verdict::WrongCategory;
        }

        match self.reference {
            None => Verdict::Keep { distance_km: None },
            Some(reference) => {
                let distance_km = haversine_distance(&reference, coord);
                if distance_km <= self.radius_km {
                    Verdict::Keep {
                        distance_km: Some(distance_km),
                    }
                } else {
                    Verdict::OutOfRange { distance_km }
                }
            }
        }
    }

    /// Reports that pass, in input order; malformed locations never pass
    pub fn apply<'a>(&self, reports: &'a [ReportEntity]) -> Vec<&'a ReportEntity> {
        reports
            .iter()
            .filter(|report| self.category.matches(report.category))
            .filter(|report| {
                report
                    .coordinate()
                    .is_some_and(|coord| self.evaluate(report.category, &coord).is_keep())
            })
            .collect()
    }
}

/// Filter `reports` by category and, when `reference` is known, by radius
pub fn filter_reports<'a>(
    reports: &'a [ReportEntity],
    reference: Option<&Coordinate>,
    radius_km: f64,
    category: CategoryFilter,
) -> Vec<&'a ReportEntity> {
    ProximityFilter::new(reference.copied(), radius_km, category).apply(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseReport, CategoryDetails};
    use chrono::Utc;

    const OTTAWA: Coordinate = Coordinate {
        latitude: 45.4215,
        longitude: -75.6972,
    };

    fn report(id: i64, category: Category, location: &str) -> ReportEntity {
        ReportEntity {
            id,
            category,
            description: String::new(),
            location: location.to_string(),
            created_at: Utc::now(),
            details: CategoryDetails::empty(category),
        }
    }

    fn ids(reports: &[&ReportEntity]) -> Vec<i64> {
        reports.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_radius_filter() {
        let reports = vec![
            // ~42 km north of Ottawa
            report(1, Category::Lost, "(45.80,-75.6972)"),
            // Calgary, ~2,900 km away
            report(2, Category::Lost, "(51.0447,-114.0719)"),
        ];

        let kept = filter_reports(&reports, Some(&OTTAWA), 100.0, CategoryFilter::All);
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_category_applies_before_distance() {
        let reports = vec![
            report(1, Category::Lost, "(45.42,-75.70)"),
            report(2, Category::Found, "(45.42,-75.70)"),
        ];

        let kept = filter_reports(
            &reports,
            Some(&OTTAWA),
            100.0,
            CategoryFilter::Only(Category::Found),
        );
        assert_eq!(ids(&kept), vec![2]);
    }

    #[test]
    fn test_no_reference_keeps_everything_valid() {
        let reports = vec![
            report(1, Category::Event, "(51.0447,-114.0719)"),
            report(2, Category::Event, "not a place"),
            report(3, Category::Hazard, "(-33.86,151.21)"),
        ];

        let kept = filter_reports(&reports, None, 1.0, CategoryFilter::All);
        assert_eq!(ids(&kept), vec![1, 3]);
    }

    #[test]
    fn test_evaluate_reports_distance() {
        let filter = ProximityFilter::new(Some(OTTAWA), 10.0, CategoryFilter::All);

        assert_eq!(
            filter.evaluate(Category::Lost, &OTTAWA),
            Verdict::Keep {
                distance_km: Some(0.0)
            }
        );
        assert!(matches!(
            filter.evaluate(Category::Lost, &Coordinate::new(46.5, -75.6972)),
            Verdict::OutOfRange { distance_km } if distance_km > 100.0
        ));

        let lost_only = ProximityFilter::new(None, 10.0, CategoryFilter::Only(Category::Lost));
        assert_eq!(
            lost_only.evaluate(Category::Event, &OTTAWA),
            Verdict::WrongCategory
        );
    }
}
