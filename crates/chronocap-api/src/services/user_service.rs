//! Local user profiles and awards.

use std::sync::Arc;

use tracing::info;

use chronocap_core::{Error, Result, User, UserRepository};

use super::parse_record_id;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Add an award to a user. Adding one the user already holds is a no-op.
    pub async fn add_award(&self, user_id: &str, award_id: Option<&str>) -> Result<User> {
        let id = parse_record_id(user_id)
            .ok_or_else(|| Error::InvalidInput("Invalid user id".to_string()))?;
        let award_id = award_id
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| Error::InvalidInput("awardId is required".to_string()))?;

        let user = self
            .repo
            .add_award(id, award_id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        info!(
            subsystem = "api",
            component = "users",
            op = "add_award",
            user_id = %user.id,
            award_id,
            "Award added"
        );
        Ok(user)
    }
}
