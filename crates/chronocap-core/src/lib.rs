//! # chronocap-core
//!
//! Core types, traits, and abstractions for the chronocap time capsule service.
//!
//! This crate provides the data model, the repository and identity-provider
//! traits that the storage and identity crates implement, and the pure
//! query-building pieces: geo distance, capsule aggregation pipelines and
//! pagination metadata.

pub mod capsule_query;
pub mod defaults;
pub mod error;
pub mod geo;
pub mod logging;
pub mod models;
pub mod news_query;
pub mod pagination;
pub mod pipeline;
pub mod traits;

// Re-export commonly used types at crate root
pub use capsule_query::{CapsuleFilter, CapsuleQuery, CapsuleQueryPlan};
pub use error::{Error, Result};
pub use geo::{great_circle_distance_km, GeoPoint, EARTH_RADIUS_KM};
pub use models::*;
pub use news_query::{NewsFilter, NewsQuery, NewsSortField};
pub use pagination::{calculate_pagination_data, PaginationMeta};
pub use pipeline::{CapsuleField, Pipeline, PipelineOutput, Predicate, SortDirection, SortSpec, Stage};
pub use traits::*;

/// Generate a new time-ordered (v7) identifier.
pub fn new_v7() -> uuid::Uuid {
    uuid::Uuid::now_v7()
}
