//! Turns normalized capsule filters into count and page pipelines.
//!
//! Both pipelines are built from one shared prefix, so the reported total
//! always describes the same set the page is cut from.

use chrono::{DateTime, Utc};

use crate::defaults::{DEFAULT_PAGE, DEFAULT_PER_PAGE};
use crate::geo::GeoPoint;
use crate::pipeline::{Pipeline, Predicate, SortSpec, Stage};

/// Normalized capsule filter criteria. Absent fields are not applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapsuleFilter {
    pub user_id: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    /// Inclusive lower bound on `timeToOpen`.
    pub available_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timeToOpen`.
    pub available_before: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Search radius in kilometers.
    pub distance: Option<f64>,
}

impl CapsuleFilter {
    /// Origin and radius, when all three are present and the radius is positive.
    pub fn geo(&self) -> Option<(GeoPoint, f64)> {
        match (self.lat, self.lon, self.distance) {
            (Some(lat), Some(lon), Some(km)) if km > 0.0 => Some((GeoPoint::new(lat, lon), km)),
            _ => None,
        }
    }

    fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(user_id) = &self.user_id {
            predicates.push(Predicate::UserIdEquals(user_id.clone()));
        }
        if let Some(country) = &self.country {
            predicates.push(Predicate::CountryContains(country.clone()));
        }
        if let Some(city) = &self.city {
            predicates.push(Predicate::CityContains(city.clone()));
        }
        if let Some(after) = self.available_after {
            predicates.push(Predicate::TimeToOpenAtOrAfter(after));
        }
        if let Some(before) = self.available_before {
            predicates.push(Predicate::TimeToOpenAtOrBefore(before));
        }
        predicates
    }
}

/// A capsule list request: filter, page window and sort.
#[derive(Debug, Clone, PartialEq)]
pub struct CapsuleQuery {
    pub filter: CapsuleFilter,
    /// 1-based page number.
    pub page: u64,
    pub per_page: u64,
    pub sort: SortSpec,
}

impl Default for CapsuleQuery {
    fn default() -> Self {
        Self {
            filter: CapsuleFilter::default(),
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
            sort: SortSpec::default(),
        }
    }
}

impl CapsuleQuery {
    /// Number of documents skipped before the page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn plan(&self) -> CapsuleQueryPlan {
        CapsuleQueryPlan::new(self)
    }
}

/// The shared match/geo prefix plus the page window.
#[derive(Debug, Clone, PartialEq)]
pub struct CapsuleQueryPlan {
    prefix: Vec<Stage>,
    sort: SortSpec,
    skip: u64,
    limit: u64,
}

impl CapsuleQueryPlan {
    pub fn new(query: &CapsuleQuery) -> Self {
        let mut prefix = vec![Stage::Match(query.filter.predicates())];
        if let Some((origin, km)) = query.filter.geo() {
            prefix.push(Stage::AddDistance(origin));
            prefix.push(Stage::Match(vec![Predicate::DistanceAtMost(km)]));
        }
        Self {
            prefix,
            sort: query.sort,
            skip: query.offset(),
            limit: query.per_page,
        }
    }

    /// Stages shared by both executions.
    pub fn prefix(&self) -> &[Stage] {
        &self.prefix
    }

    /// Counts every match, ignoring the page window.
    pub fn count_pipeline(&self) -> Pipeline {
        Pipeline::new(self.prefix.clone()).then(Stage::Count)
    }

    /// Sorted, skipped and limited page of matches.
    pub fn page_pipeline(&self) -> Pipeline {
        Pipeline::new(self.prefix.clone())
            .then(Stage::Sort(self.sort))
            .then(Stage::Skip(self.skip))
            .then(Stage::Limit(self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capsule, CapsuleHit, Location};
    use crate::pipeline::{CapsuleField, PipelineOutput, SortDirection};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn capsule(n: u128, lat: f64, lon: f64, open: DateTime<Utc>) -> CapsuleHit {
        CapsuleHit::from(Capsule {
            id: Uuid::from_u128(n),
            user_id: "user-1".to_string(),
            location: Location {
                lat,
                lon,
                country: "Somewhere".to_string(),
                city: "Somecity".to_string(),
            },
            time_to_open: open,
            message: String::new(),
            media: vec![],
            files: vec![],
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, n as u32).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, n as u32).unwrap(),
        })
    }

    fn run_both(query: &CapsuleQuery, docs: Vec<CapsuleHit>) -> (u64, Vec<CapsuleHit>) {
        let plan = query.plan();
        let count = match plan.count_pipeline().run(docs.clone()) {
            PipelineOutput::Count(n) => n,
            PipelineOutput::Documents(_) => panic!("expected count"),
        };
        let page = match plan.page_pipeline().run(docs) {
            PipelineOutput::Documents(d) => d,
            PipelineOutput::Count(_) => panic!("expected documents"),
        };
        (count, page)
    }

    #[test]
    fn test_kyiv_radius_excludes_london() {
        let open = Utc::now();
        let docs = vec![capsule(1, 50.45, 30.52, open), capsule(2, 51.50, -0.12, open)];
        let query = CapsuleQuery {
            filter: CapsuleFilter {
                lat: Some(50.45),
                lon: Some(30.52),
                distance: Some(10.0),
                ..Default::default()
            },
            ..Default::default()
        };

        let (total, page) = run_both(&query, docs);
        assert_eq!(total, 1);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].capsule.id, Uuid::from_u128(1));
        assert_eq!(page[0].distance, Some(0.0));
    }

    #[test]
    fn test_geo_requires_all_three_and_positive_radius() {
        let base = CapsuleFilter {
            lat: Some(1.0),
            lon: Some(2.0),
            distance: Some(5.0),
            ..Default::default()
        };
        assert!(base.geo().is_some());
        assert!(CapsuleFilter { lat: None, ..base.clone() }.geo().is_none());
        assert!(CapsuleFilter { lon: None, ..base.clone() }.geo().is_none());
        assert!(CapsuleFilter { distance: None, ..base.clone() }.geo().is_none());
        assert!(CapsuleFilter { distance: Some(0.0), ..base.clone() }.geo().is_none());
        assert!(CapsuleFilter { distance: Some(-3.0), ..base }.geo().is_none());
    }

    #[test]
    fn test_without_geo_no_distance_is_attached() {
        let open = Utc::now();
        let docs = vec![capsule(1, 50.45, 30.52, open)];
        let (_, page) = run_both(&CapsuleQuery::default(), docs);
        assert_eq!(page[0].distance, None);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let after = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2027, 12, 31, 0, 0, 0).unwrap();
        let docs = vec![
            capsule(1, 0.0, 0.0, after),
            capsule(2, 0.0, 0.0, before),
            capsule(3, 0.0, 0.0, after - chrono::Duration::seconds(1)),
            capsule(4, 0.0, 0.0, before + chrono::Duration::seconds(1)),
        ];
        let query = CapsuleQuery {
            filter: CapsuleFilter {
                available_after: Some(after),
                available_before: Some(before),
                ..Default::default()
            },
            ..Default::default()
        };
        let (total, page) = run_both(&query, docs);
        assert_eq!(total, 2);
        let mut ids: Vec<u128> = page.iter().map(|h| h.capsule.id.as_u128()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_count_ignores_page_window() {
        let open = Utc::now();
        let docs: Vec<_> = (1..=25).map(|n| capsule(n, 0.0, 0.0, open)).collect();
        let query = CapsuleQuery {
            page: 3,
            per_page: 10,
            ..Default::default()
        };
        let (total, page) = run_both(&query, docs);
        assert_eq!(total, 25);
        assert_eq!(page.len(), 5);
        // createdAt descending: the oldest five land on page 3
        assert_eq!(page[0].capsule.id.as_u128(), 5);
        assert_eq!(page[4].capsule.id.as_u128(), 1);
    }

    #[test]
    fn test_page_beyond_last_is_empty() {
        let open = Utc::now();
        let docs: Vec<_> = (1..=3).map(|n| capsule(n, 0.0, 0.0, open)).collect();
        let query = CapsuleQuery {
            page: 9,
            ..Default::default()
        };
        let (total, page) = run_both(&query, docs);
        assert_eq!(total, 3);
        assert!(page.is_empty());
    }

    #[test]
    fn test_pipelines_share_prefix() {
        let query = CapsuleQuery {
            filter: CapsuleFilter {
                user_id: Some("user-1".to_string()),
                lat: Some(1.0),
                lon: Some(1.0),
                distance: Some(1.0),
                ..Default::default()
            },
            sort: SortSpec {
                field: CapsuleField::Distance,
                direction: SortDirection::Ascending,
            },
            ..Default::default()
        };
        let plan = query.plan();
        let prefix = plan.prefix().to_vec();
        assert_eq!(prefix.len(), 3);
        assert_eq!(&plan.count_pipeline().stages[..3], prefix.as_slice());
        assert_eq!(&plan.page_pipeline().stages[..3], prefix.as_slice());
        assert!(plan.count_pipeline().is_count());
    }

    #[test]
    fn test_offset() {
        let q = CapsuleQuery {
            page: 1,
            per_page: 10,
            ..Default::default()
        };
        assert_eq!(q.offset(), 0);
        let q = CapsuleQuery {
            page: 4,
            per_page: 7,
            ..Default::default()
        };
        assert_eq!(q.offset(), 21);
    }
}
