//! Core traits for chronocap abstractions.
//!
//! Storage and identity backends implement these; the API layer only sees
//! trait objects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::news_query::NewsQuery;
use crate::pipeline::Pipeline;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Capsule storage.
#[async_trait]
pub trait CapsuleRepository: Send + Sync {
    /// Run a pipeline ending in [`Stage::Count`](crate::Stage::Count).
    async fn count(&self, pipeline: &Pipeline) -> Result<u64>;

    /// Run a pipeline that yields documents.
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<CapsuleHit>>;

    /// Fetch a capsule by id.
    async fn fetch(&self, id: Uuid) -> Result<Option<Capsule>>;

    /// Insert a new capsule, assigning id and timestamps.
    async fn insert(&self, capsule: NewCapsule) -> Result<Capsule>;

    /// Apply a partial update. Returns `None` when the id is unknown.
    async fn update(&self, id: Uuid, patch: CapsulePatch) -> Result<Option<Capsule>>;

    /// Delete a capsule, returning the removed record.
    async fn delete(&self, id: Uuid) -> Result<Option<Capsule>>;
}

/// News storage.
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Number of items matching the query filter.
    async fn count(&self, query: &NewsQuery) -> Result<u64>;

    /// One sorted page of items matching the query.
    async fn find(&self, query: &NewsQuery) -> Result<Vec<News>>;

    async fn fetch(&self, id: Uuid) -> Result<Option<News>>;

    async fn insert(&self, news: NewNews) -> Result<News>;

    async fn delete(&self, id: Uuid) -> Result<Option<News>>;
}

/// Local user profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Fails with `Conflict` on a duplicate subject or nickname.
    async fn insert(&self, user: NewUser) -> Result<User>;

    async fn find_by_cognito_sub(&self, sub: &str) -> Result<Option<User>>;

    async fn fetch(&self, id: Uuid) -> Result<Option<User>>;

    /// Add an award id unless already present. Returns `None` for an unknown user.
    async fn add_award(&self, id: Uuid, award_id: &str) -> Result<Option<User>>;
}

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// Result of a sign-up call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpOutcome {
    pub user_sub: String,
    pub user_confirmed: bool,
}

/// Tokens issued by a successful authentication.
///
/// `refresh_token` is absent on refresh; the provider keeps the old one valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
}

/// Account details resolved from an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub sub: String,
    pub username: String,
    pub email: Option<String>,
    /// Group membership; the first group is the account type.
    pub groups: Vec<String>,
}

impl IdentityUser {
    /// Account type taken from the first group, if it names one.
    pub fn account_type(&self) -> Option<AccountType> {
        self.groups.first().and_then(|g| g.parse().ok())
    }
}

/// External identity provider. Every call resolves once or fails once.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<SignUpOutcome>;

    async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession>;

    /// Send a password reset code.
    async fn forgot_password(&self, email: &str) -> Result<()>;

    /// Set a new password using a reset code.
    async fn confirm_password(&self, email: &str, code: &str, new_password: &str) -> Result<()>;

    /// Confirm a registration with the emailed code.
    async fn confirm_registration(&self, email: &str, code: &str) -> Result<()>;

    /// Resolve the account behind an access token.
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser>;

    /// Invalidate every token issued for the account.
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}
