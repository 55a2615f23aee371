//! `/users` handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::auth::RequireAuth;
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAwardRequest {
    pub award_id: Option<String>,
}

pub async fn add_award(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(user_id): Path<String>,
    ApiJson(body): ApiJson<AddAwardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .add_award(&user_id, body.award_id.as_deref())
        .await?;
    Ok(Json(user))
}
