use axum::{
    extract::State,
    Extension, Json,
};
use rxmart_catalog::{MerchandiseSummary, SearchHit};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{extract::ApiQuery, map_catalog_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
}

/// GET /api/v1/merchandises/search?keyword=
pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<SearchHit>>>, ApiError> {
    let outcome = state
        .catalog
        .search(&query.keyword)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}

/// GET /api/v1/merchandises/search/category?keyword=
pub(super) async fn search_by_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<MerchandiseSummary>>>, ApiError> {
    let outcome = state
        .catalog
        .search_by_category(&query.keyword)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}
