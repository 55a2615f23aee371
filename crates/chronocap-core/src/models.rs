//! Data model for capsules, news items and users.
//!
//! Wire representations use camelCase field names and expose the record
//! identifier as `_id`, matching what existing clients of the service read.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::pagination::PaginationMeta;

// =============================================================================
// CAPSULES
// =============================================================================

/// Where a capsule was left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in decimal degrees (-180 to 180)
    pub lon: f64,
    pub country: String,
    pub city: String,
}

impl Location {
    /// Check coordinate ranges and required place names.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::InvalidInput(
                "location.lat must be between -90 and 90".to_string(),
            ));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(Error::InvalidInput(
                "location.lon must be between -180 and 180".to_string(),
            ));
        }
        if self.country.trim().is_empty() {
            return Err(Error::InvalidInput("location.country is required".to_string()));
        }
        if self.city.trim().is_empty() {
            return Err(Error::InvalidInput("location.city is required".to_string()));
        }
        Ok(())
    }
}

/// Location as submitted by a client; every part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl LocationInput {
    /// Require every part and validate the resulting location.
    pub fn into_location(self) -> Result<Location> {
        let required = |name: &str| Error::InvalidInput(format!("location.{} is required", name));
        let location = Location {
            lat: self.lat.ok_or_else(|| required("lat"))?,
            lon: self.lon.ok_or_else(|| required("lon"))?,
            country: self.country.ok_or_else(|| required("country"))?,
            city: self.city.ok_or_else(|| required("city"))?,
        };
        location.validate()?;
        Ok(location)
    }
}

impl From<Location> for LocationInput {
    fn from(location: Location) -> Self {
        Self {
            lat: Some(location.lat),
            lon: Some(location.lon),
            country: Some(location.country),
            city: Some(location.city),
        }
    }
}

/// A time-locked, geotagged message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capsule {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Owner: identity-provider subject or local user id.
    pub user_id: String,
    pub location: Location,
    /// The capsule is meant to stay locked until this instant.
    pub time_to_open: DateTime<Utc>,
    pub message: String,
    pub media: Vec<String>,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A capsule returned by a list query.
///
/// `distance` (kilometers from the query point) is only present when the
/// query applied a geo-distance filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsuleHit {
    #[serde(flatten)]
    pub capsule: Capsule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<Capsule> for CapsuleHit {
    fn from(capsule: Capsule) -> Self {
        Self {
            capsule,
            distance: None,
        }
    }
}

/// Request body for creating a capsule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCapsuleRequest {
    pub user_id: Option<String>,
    pub location: Option<LocationInput>,
    pub time_to_open: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub media: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
}

impl CreateCapsuleRequest {
    /// Validate required fields and apply defaults.
    pub fn validate(self) -> Result<NewCapsule> {
        let user_id = self
            .user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("userId is required".to_string()))?;
        let location = self
            .location
            .ok_or_else(|| Error::InvalidInput("location is required".to_string()))?
            .into_location()?;
        let time_to_open = self
            .time_to_open
            .ok_or_else(|| Error::InvalidInput("timeToOpen is required".to_string()))?;

        Ok(NewCapsule {
            user_id,
            location,
            time_to_open,
            message: self.message.unwrap_or_default(),
            media: self.media.unwrap_or_default(),
            files: self.files.unwrap_or_default(),
        })
    }
}

/// A validated capsule ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCapsule {
    pub user_id: String,
    pub location: Location,
    pub time_to_open: DateTime<Utc>,
    pub message: String,
    pub media: Vec<String>,
    pub files: Vec<String>,
}

/// Partial update: every present field replaces the stored one.
///
/// `location` is replaced as a whole and must be complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapsuleRequest {
    pub user_id: Option<String>,
    pub location: Option<LocationInput>,
    pub time_to_open: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub media: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
}

impl UpdateCapsuleRequest {
    /// Validate the fields that are present.
    pub fn validate(self) -> Result<CapsulePatch> {
        if let Some(user_id) = &self.user_id {
            if user_id.trim().is_empty() {
                return Err(Error::InvalidInput("userId cannot be empty".to_string()));
            }
        }
        let location = self.location.map(LocationInput::into_location).transpose()?;

        Ok(CapsulePatch {
            user_id: self.user_id,
            location,
            time_to_open: self.time_to_open,
            message: self.message,
            media: self.media,
            files: self.files,
        })
    }
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapsulePatch {
    pub user_id: Option<String>,
    pub location: Option<Location>,
    pub time_to_open: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub media: Option<Vec<String>>,
    pub files: Option<Vec<String>>,
}

impl CapsulePatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &CapsulePatch::default()
    }

    /// Merge the patch into a stored capsule and bump `updated_at`.
    pub fn apply(self, capsule: &mut Capsule, now: DateTime<Utc>) {
        if let Some(user_id) = self.user_id {
            capsule.user_id = user_id;
        }
        if let Some(location) = self.location {
            capsule.location = location;
        }
        if let Some(time_to_open) = self.time_to_open {
            capsule.time_to_open = time_to_open;
        }
        if let Some(message) = self.message {
            capsule.message = message;
        }
        if let Some(media) = self.media {
            capsule.media = media;
        }
        if let Some(files) = self.files {
            capsule.files = files;
        }
        capsule.updated_at = now;
    }
}

/// Response for `GET /capsules`: pagination fields plus the page of capsules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCapsulesResponse {
    #[serde(flatten)]
    pub pagination: PaginationMeta,
    pub capsules: Vec<CapsuleHit>,
}

// =============================================================================
// NEWS
// =============================================================================

/// Kind of news item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewsType {
    #[serde(rename = "updates")]
    Updates,
    #[serde(rename = "news")]
    News,
    #[serde(rename = "testimonials")]
    Testimonials,
    #[serde(rename = "video stories")]
    VideoStories,
}

impl NewsType {
    pub const ALL: [NewsType; 4] = [
        NewsType::Updates,
        NewsType::News,
        NewsType::Testimonials,
        NewsType::VideoStories,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NewsType::Updates => "updates",
            NewsType::News => "news",
            NewsType::Testimonials => "testimonials",
            NewsType::VideoStories => "video stories",
        }
    }
}

impl fmt::Display for NewsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        NewsType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("`{}` is not a valid news type", s)))
    }
}

/// Subscription tier of the account that authored something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountType {
    FreeUser,
    PaidUser,
    AgencyUser,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [
        AccountType::FreeUser,
        AccountType::PaidUser,
        AccountType::AgencyUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::FreeUser => "freeUser",
            AccountType::PaidUser => "paidUser",
            AccountType::AgencyUser => "agencyUser",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("`{}` is not a valid account type", s)))
    }
}

/// A news item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct News {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub news_type: NewsType,
    pub type_account: AccountType,
    pub topic: String,
    pub text: String,
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a news item.
///
/// `userId` and `typeAccount` fall back to the authenticated caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub news_type: Option<String>,
    pub type_account: Option<String>,
    pub topic: Option<String>,
    pub text: Option<String>,
    pub files: Option<Vec<String>>,
}

impl CreateNewsRequest {
    /// Validate required fields, filling author fields from the caller.
    pub fn validate(
        self,
        caller_id: Option<&str>,
        caller_account: Option<AccountType>,
    ) -> Result<NewNews> {
        let user_id = self
            .user_id
            .filter(|u| !u.trim().is_empty())
            .or_else(|| caller_id.map(str::to_string))
            .ok_or_else(|| Error::InvalidInput("userId is required".to_string()))?;
        let news_type = self
            .news_type
            .ok_or_else(|| Error::InvalidInput("type is required".to_string()))?
            .parse()?;
        let type_account = match self.type_account {
            Some(raw) => raw.parse()?,
            None => caller_account
                .ok_or_else(|| Error::InvalidInput("typeAccount is required".to_string()))?,
        };
        let topic = self
            .topic
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("topic is required".to_string()))?;
        let text = self
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput("text is required".to_string()))?;

        Ok(NewNews {
            user_id,
            news_type,
            type_account,
            topic,
            text,
            files: self.files.unwrap_or_default(),
        })
    }
}

/// A validated news item ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNews {
    pub user_id: String,
    pub news_type: NewsType,
    pub type_account: AccountType,
    pub topic: String,
    pub text: String,
    pub files: Vec<String>,
}

/// Response for `GET /news`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListNewsResponse {
    #[serde(flatten)]
    pub pagination: PaginationMeta,
    pub news: Vec<News>,
}

// =============================================================================
// USERS
// =============================================================================

/// Local profile of an identity-provider account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Subject of the account at the identity provider.
    pub cognito_sub: String,
    pub nickname: String,
    pub name: String,
    pub avatar: String,
    /// Award ids; no duplicates.
    pub awards: Vec<String>,
}

/// Data for creating a local user after registration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub cognito_sub: String,
    pub nickname: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
}
