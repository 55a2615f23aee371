//! `/news` handlers.

use axum::extract::{Path, RawQuery, State};
use axum::response::IntoResponse;
use axum::Json;

use chronocap_core::CreateNewsRequest;

use crate::auth::RequireAuth;
use crate::error::{ApiError, ApiJson};
use crate::query_types::{news_query, QueryParams};
use crate::state::AppState;

pub async fn list_news(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, ApiError> {
    let parsed = news_query(&QueryParams::parse(raw.as_deref()));
    Ok(Json(state.news.list(&parsed).await?))
}

pub async fn get_news(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.news.get(&id).await?))
}

pub async fn create_news(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<CreateNewsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.news.create(body, &caller).await?))
}

pub async fn delete_news(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.news.delete(&id).await?))
}
