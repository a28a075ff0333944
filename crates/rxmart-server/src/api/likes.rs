use axum::{
    extract::State,
    Extension, Json,
};
use rxmart_catalog::LikeView;

use crate::middleware::RequestId;

use super::{
    extract::ApiPath, map_catalog_error, principal::Customer, ApiError, ApiResponse, AppState,
};

/// PUT /api/v1/merchandises/{id}/like: flips the caller's like.
pub(super) async fn toggle_like(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(merchandise_id): ApiPath<i64>,
    Customer(customer): Customer,
) -> Result<Json<ApiResponse<LikeView>>, ApiError> {
    let outcome = state
        .catalog
        .toggle_like(merchandise_id, customer.id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}
