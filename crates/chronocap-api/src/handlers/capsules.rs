//! `/capsules` handlers.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use chronocap_core::{CreateCapsuleRequest, UpdateCapsuleRequest};

use crate::error::{ApiError, ApiJson};
use crate::query_types::{capsule_query, QueryParams};
use crate::state::AppState;

pub async fn list_capsules(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let query = capsule_query(&QueryParams::parse(raw.as_deref()));
    let response = state.capsules.get_capsules(&query).await?;
    Ok(Json(response))
}

pub async fn get_capsule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.capsules.get_capsule_by_id(&id).await?))
}

pub async fn create_capsule(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCapsuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let capsule = state.capsules.create_capsule(body).await?;
    Ok((StatusCode::CREATED, Json(capsule)))
}

pub async fn update_capsule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCapsuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.capsules.update_capsule(&id, body).await?))
}

pub async fn delete_capsule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.capsules.delete_capsule(&id).await?))
}
