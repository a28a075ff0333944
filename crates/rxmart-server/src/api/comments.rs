//! Comment routes under `/api/v1/merchandises/{id}/comments`.
//!
//! The merchandise id from the path is passed through so the catalog can
//! reject a comment addressed under the wrong merchandise.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use rxmart_catalog::CommentView;
use rxmart_core::{CommentInput, CommentPatch};

use crate::middleware::RequestId;

use super::{
    extract::{ApiJson, ApiPath}, map_catalog_error, principal::Pharmacist, ApiError, ApiResponse,
    AppState,
};

pub(super) async fn list_comments(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(merchandise_id): ApiPath<i64>,
) -> Result<Json<ApiResponse<Vec<CommentView>>>, ApiError> {
    let outcome = state
        .catalog
        .list_comments(merchandise_id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}

pub(super) async fn create_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(merchandise_id): ApiPath<i64>,
    Pharmacist(author): Pharmacist,
    ApiJson(body): ApiJson<CommentInput>,
) -> Result<(StatusCode, Json<ApiResponse<CommentView>>), ApiError> {
    let outcome = state
        .catalog
        .create_comment(merchandise_id, body, author.id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::from_outcome(outcome, req_id.0)),
    ))
}

pub(super) async fn update_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath((merchandise_id, comment_id)): ApiPath<(i64, i64)>,
    Pharmacist(caller): Pharmacist,
    ApiJson(body): ApiJson<CommentPatch>,
) -> Result<Json<ApiResponse<CommentView>>, ApiError> {
    let outcome = state
        .catalog
        .update_comment(merchandise_id, comment_id, body, caller.id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}

pub(super) async fn delete_comment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath((merchandise_id, comment_id)): ApiPath<(i64, i64)>,
    Pharmacist(caller): Pharmacist,
) -> Result<Json<ApiResponse<CommentView>>, ApiError> {
    let outcome = state
        .catalog
        .delete_comment(merchandise_id, comment_id, caller.id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}
