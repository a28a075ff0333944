//! - `GET /api/v1/merchandises/rankings/age?min_age=&max_age=&limit=`
//! - `GET /api/v1/merchandises/rankings/gender/{gender}?limit=`
//! - `GET /api/v1/merchandises/rankings/effect/{effect_id}?limit=`

use axum::{
    extract::State,
    Extension, Json,
};
use rxmart_catalog::RankedMerchandise;
use rxmart_core::Gender;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    extract::{ApiPath, ApiQuery}, map_catalog_error, normalize_limit, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct AgeRankingQuery {
    pub min_age: i32,
    pub max_age: i32,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LimitQuery {
    pub limit: Option<i64>,
}

type RankingResponse = Result<Json<ApiResponse<Vec<RankedMerchandise>>>, ApiError>;

pub(super) async fn rank_by_age(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiQuery(query): ApiQuery<AgeRankingQuery>,
) -> RankingResponse {
    let outcome = state
        .catalog
        .rank_by_age(query.min_age, query.max_age, normalize_limit(query.limit))
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}

pub(super) async fn rank_by_gender(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(gender): ApiPath<String>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> RankingResponse {
    let gender: Gender = gender
        .parse()
        .map_err(|reason: String| ApiError::new(req_id.0.clone(), "validation_error", reason))?;

    let outcome = state
        .catalog
        .rank_by_gender(gender, normalize_limit(query.limit))
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}

pub(super) async fn rank_by_effect(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(effect_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> RankingResponse {
    let outcome = state
        .catalog
        .rank_by_effect(effect_id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}
