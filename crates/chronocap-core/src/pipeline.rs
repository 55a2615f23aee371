//! Capsule aggregation pipelines.
//!
//! A [`Pipeline`] is an ordered list of stage descriptors. The Postgres
//! repository compiles it into nested SQL; the in-memory repository runs it
//! directly through [`Pipeline::run`]. Both must produce the same result for
//! the same stages.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{great_circle_distance_km, GeoPoint};
use crate::models::CapsuleHit;

/// A capsule field a pipeline can sort on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapsuleField {
    UserId,
    Country,
    City,
    TimeToOpen,
    CreatedAt,
    UpdatedAt,
    Message,
    /// Computed by [`Stage::AddDistance`]; only present in geo queries.
    Distance,
}

impl CapsuleField {
    /// Parse a client-facing field name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "userId" => Some(Self::UserId),
            "location.country" | "country" => Some(Self::Country),
            "location.city" | "city" => Some(Self::City),
            "timeToOpen" => Some(Self::TimeToOpen),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "message" => Some(Self::Message),
            "distance" => Some(Self::Distance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserId => "userId",
            Self::Country => "location.country",
            Self::City => "location.city",
            Self::TimeToOpen => "timeToOpen",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Message => "message",
            Self::Distance => "distance",
        }
    }
}

/// Sort direction; `1` ascending, `-1` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `"asc"` selects ascending; anything else is descending.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("asc") => Self::Ascending,
            _ => Self::Descending,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Field and direction for a sort stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: CapsuleField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: CapsuleField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Resolve raw `sortField` / `sortOrder` values.
    ///
    /// Unknown fields sort by `createdAt` with the requested direction.
    /// `distance` is only honored when `geo` is true.
    pub fn resolve(field: Option<&str>, order: Option<&str>, geo: bool) -> Self {
        let direction = SortDirection::from_token(order);
        let field = match field.and_then(CapsuleField::parse) {
            Some(CapsuleField::Distance) if !geo => CapsuleField::CreatedAt,
            Some(f) => f,
            None => CapsuleField::CreatedAt,
        };
        Self { field, direction }
    }
}

/// A single match condition; a [`Stage::Match`] requires all of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    UserIdEquals(String),
    /// Case-insensitive substring of `location.country`.
    CountryContains(String),
    /// Case-insensitive substring of `location.city`.
    CityContains(String),
    /// `timeToOpen >= bound`
    TimeToOpenAtOrAfter(DateTime<Utc>),
    /// `timeToOpen <= bound`
    TimeToOpenAtOrBefore(DateTime<Utc>),
    /// Computed `distance <= km`; requires a preceding [`Stage::AddDistance`].
    DistanceAtMost(f64),
}

impl Predicate {
    pub fn matches(&self, hit: &CapsuleHit) -> bool {
        let capsule = &hit.capsule;
        match self {
            Predicate::UserIdEquals(id) => capsule.user_id == *id,
            Predicate::CountryContains(needle) => contains_ignore_case(&capsule.location.country, needle),
            Predicate::CityContains(needle) => contains_ignore_case(&capsule.location.city, needle),
            Predicate::TimeToOpenAtOrAfter(bound) => capsule.time_to_open >= *bound,
            Predicate::TimeToOpenAtOrBefore(bound) => capsule.time_to_open <= *bound,
            Predicate::DistanceAtMost(km) => hit.distance.is_some_and(|d| d <= *km),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keep documents matching every predicate. An empty list keeps all.
    Match(Vec<Predicate>),
    /// Attach the great-circle distance (km) from the given point.
    AddDistance(GeoPoint),
    Sort(SortSpec),
    Skip(u64),
    Limit(u64),
    /// Replace the stream with the number of documents in it. Must be last.
    Count,
}

/// An ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

/// Result of running a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    Documents(Vec<CapsuleHit>),
    Count(u64),
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Append a stage.
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Whether the pipeline ends in a count stage.
    pub fn is_count(&self) -> bool {
        matches!(self.stages.last(), Some(Stage::Count))
    }

    /// Evaluate the pipeline over an in-memory collection.
    pub fn run(&self, docs: Vec<CapsuleHit>) -> PipelineOutput {
        let mut docs = docs;
        for stage in &self.stages {
            match stage {
                Stage::Match(predicates) => {
                    docs.retain(|d| predicates.iter().all(|p| p.matches(d)));
                }
                Stage::AddDistance(origin) => {
                    for d in docs.iter_mut() {
                        let point = GeoPoint::new(d.capsule.location.lat, d.capsule.location.lon);
                        d.distance = Some(great_circle_distance_km(*origin, point));
                    }
                }
                Stage::Sort(spec) => sort_hits(&mut docs, spec),
                Stage::Skip(n) => {
                    let n = usize::try_from(*n).unwrap_or(usize::MAX).min(docs.len());
                    docs.drain(..n);
                }
                Stage::Limit(n) => {
                    docs.truncate(usize::try_from(*n).unwrap_or(usize::MAX));
                }
                Stage::Count => return PipelineOutput::Count(docs.len() as u64),
            }
        }
        PipelineOutput::Documents(docs)
    }
}

/// Stable sort on the requested field, ties broken by id.
fn sort_hits(docs: &mut [CapsuleHit], spec: &SortSpec) {
    docs.sort_by(|a, b| {
        let ord = compare_field(a, b, spec.field);
        let ord = match spec.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
        ord.then_with(|| a.capsule.id.cmp(&b.capsule.id))
    });
}

fn compare_field(a: &CapsuleHit, b: &CapsuleHit, field: CapsuleField) -> Ordering {
    let (x, y) = (&a.capsule, &b.capsule);
    match field {
        CapsuleField::UserId => x.user_id.cmp(&y.user_id),
        CapsuleField::Country => x.location.country.cmp(&y.location.country),
        CapsuleField::City => x.location.city.cmp(&y.location.city),
        CapsuleField::TimeToOpen => x.time_to_open.cmp(&y.time_to_open),
        CapsuleField::CreatedAt => x.created_at.cmp(&y.created_at),
        CapsuleField::UpdatedAt => x.updated_at.cmp(&y.updated_at),
        CapsuleField::Message => x.message.cmp(&y.message),
        CapsuleField::Distance => a
            .distance
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance.unwrap_or(f64::INFINITY)),
    }
}
