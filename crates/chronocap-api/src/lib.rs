//! # chronocap-api
//!
//! HTTP API for the chronocap time capsule service: capsule listing with
//! geo-distance filtering, capsule CRUD, news, user awards and
//! authentication through the identity provider.

pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod query_types;
pub mod services;
pub mod state;
pub mod telemetry;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::{ApiConfig, StorageBackend};
pub use error::{ApiError, ApiJson};
pub use state::{AppState, Repositories};

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// All routes with middleware applied.
pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Capsules
        .route(
            "/capsules",
            get(handlers::capsules::list_capsules).post(handlers::capsules::create_capsule),
        )
        .route(
            "/capsules/:id",
            get(handlers::capsules::get_capsule)
                .patch(handlers::capsules::update_capsule)
                .delete(handlers::capsules::delete_capsule),
        )
        // Auth
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/reset/request", post(handlers::auth::request_password_reset))
        .route("/auth/reset/confirm", post(handlers::auth::confirm_password_reset))
        .route("/auth/confirm", post(handlers::auth::confirm_email))
        // News
        .route(
            "/news",
            get(handlers::news::list_news).post(handlers::news::create_news),
        )
        .route(
            "/news/:id",
            get(handlers::news::get_news).delete(handlers::news::delete_news),
        )
        // Users
        .route("/users/:id/awards", post(handlers::users::add_award))
        // Middleware
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .with_state(state)
}
