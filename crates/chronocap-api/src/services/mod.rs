//! Service layer: request-level operations over the repositories and the
//! identity provider.

pub mod auth_service;
pub mod capsule_service;
pub mod news_service;
pub mod user_service;

pub use auth_service::{AuthService, AuthUser, LoginOutcome, RegisterOutcome};
pub use capsule_service::CapsuleService;
pub use news_service::NewsService;
pub use user_service::UserService;

use uuid::Uuid;

/// Parse a path id; anything that is not a UUID cannot name a record.
pub(crate) fn parse_record_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Saturating `u64` to `i64` for pagination arithmetic.
pub(crate) fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
