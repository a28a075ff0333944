//! HTTP adapter over [`CatalogService`].
//!
//! Handlers parse the request, resolve the principal, call exactly one
//! catalog operation and wrap its [`Outcome`] in an [`ApiResponse`].

mod comments;
mod extract;
mod likes;
mod merchandises;
mod principal;
mod rankings;
mod search;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rxmart_catalog::{CatalogError, CatalogService, LocalImageStore, Outcome};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_gateway_key, GatewayAuth, RateLimitState, RequestId,
    CUSTOMER_HEADER, PHARMACIST_HEADER, REQUEST_ID_HEADER,
};

// Multipart framing on top of the raw image bytes.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService<LocalImageStore>>,
    image_dir: PathBuf,
    image_base_url: String,
    upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(
        catalog: CatalogService<LocalImageStore>,
        image_dir: PathBuf,
        image_base_url: String,
        image_max_bytes: usize,
    ) -> Self {
        Self {
            catalog: Arc::new(catalog),
            image_dir,
            image_base_url,
            upload_limit_bytes: image_max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
        }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        self.catalog.pool()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub result: T,
    pub message: String,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn from_outcome(outcome: Outcome<T>, request_id: String) -> Self {
        Self {
            result: outcome.result,
            message: outcome.message,
            meta: ResponseMeta::new(request_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Ranking limit: absent means "all", otherwise clamped to `1..=200`.
pub(super) fn normalize_limit(limit: Option<i64>) -> Option<i64> {
    limit.map(|l| l.clamp(1, 200))
}

pub(super) fn map_db_error(request_id: String, error: &rxmart_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_catalog_error(request_id: String, error: CatalogError) -> ApiError {
    match error {
        CatalogError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        e @ CatalogError::NotFound { .. } => ApiError::new(request_id, "not_found", e.to_string()),
        e @ CatalogError::Unauthorized { .. } => {
            ApiError::new(request_id, "unauthorized", e.to_string())
        }
        e @ CatalogError::InconsistentParent { .. } => {
            ApiError::new(request_id, "bad_request", e.to_string())
        }
        CatalogError::Image(e) if e.is_client_error() => {
            ApiError::new(request_id, "validation_error", e.to_string())
        }
        CatalogError::Image(e) => {
            tracing::error!(error = %e, "image store failed");
            ApiError::new(request_id, "internal_error", "image upload failed")
        }
        CatalogError::Db(e @ rxmart_db::DbError::RetriesExhausted { .. }) => {
            tracing::warn!(error = %e, "write kept conflicting");
            ApiError::new(request_id, "conflict", "concurrent update, please retry")
        }
        CatalogError::Db(e) => map_db_error(request_id, &e),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(PHARMACIST_HEADER),
            HeaderName::from_static(CUSTOMER_HEADER),
        ])
}

fn protected_router(
    auth: GatewayAuth,
    rate_limit: RateLimitState,
    upload_limit_bytes: usize,
) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/merchandises",
            post(merchandises::create_merchandise)
                .layer(DefaultBodyLimit::max(upload_limit_bytes)),
        )
        .route(
            "/api/v1/merchandises/{id}",
            get(merchandises::get_merchandise),
        )
        .route(
            "/api/v1/merchandises/{id}/effects",
            post(merchandises::attach_effects),
        )
        .route(
            "/api/v1/merchandises/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/v1/merchandises/{id}/comments/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/api/v1/merchandises/{id}/like", put(likes::toggle_like))
        .route(
            "/api/v1/merchandises/rankings/age",
            get(rankings::rank_by_age),
        )
        .route(
            "/api/v1/merchandises/rankings/gender/{gender}",
            get(rankings::rank_by_gender),
        )
        .route(
            "/api/v1/merchandises/rankings/effect/{effect_id}",
            get(rankings::rank_by_effect),
        )
        .route("/api/v1/merchandises/search", get(search::search))
        .route(
            "/api/v1/merchandises/search/category",
            get(search::search_by_category),
        )
        .layer(
            // Key check first: forged principal headers must not spend a caller's budget.
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_gateway_key,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: GatewayAuth, rate_limit: RateLimitState) -> Router {
    let mut public_routes = Router::new().route("/api/v1/health", get(health));
    if state.image_base_url.starts_with('/') {
        public_routes = public_routes
            .nest_service(&state.image_base_url, ServeDir::new(&state.image_dir));
    }

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit, state.upload_limit_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match rxmart_db::health_check(state.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                result: HealthData {
                    status: "ok",
                    database: "ok",
                },
                message: "healthy".to_string(),
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    result: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    message: "database unavailable".to_string(),
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
