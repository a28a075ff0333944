//! - `POST /api/v1/merchandises`               multipart create
//! - `GET  /api/v1/merchandises/{id}`          detail view
//! - `POST /api/v1/merchandises/{id}/effects`  tag with effects

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use rxmart_catalog::{EffectAttachment, ImageUpload, MerchandiseDetail, NewMerchandiseInput};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    extract::{ApiJson, ApiMultipart, ApiPath}, map_catalog_error, principal::Pharmacist, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct AttachEffectsRequest {
    pub effects: Vec<String>,
}

async fn field_text(field: Field<'_>, rid: &str) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::new(rid, "bad_request", format!("unreadable form field: {e}")))
}

/// Reads the multipart form: text fields `name`, `manufacturer`,
/// `usage_instruction`, repeated `effect`, and the `image` file.
async fn read_form(
    mut multipart: Multipart,
    rid: &str,
) -> Result<(NewMerchandiseInput, ImageUpload), ApiError> {
    let mut input = NewMerchandiseInput::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(rid, "bad_request", format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "name" => input.name = field_text(field, rid).await?,
            "manufacturer" => input.manufacturer = field_text(field, rid).await?,
            "usage_instruction" => input.usage_instruction = field_text(field, rid).await?,
            "effect" | "effects" => input.effects.push(field_text(field, rid).await?),
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::new(rid, "bad_request", format!("unreadable image: {e}"))
                })?;
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown form field");
            }
        }
    }

    let image =
        image.ok_or_else(|| ApiError::new(rid, "validation_error", "image must not be empty"))?;
    Ok((input, image))
}

/// POST /api/v1/merchandises
pub(super) async fn create_merchandise(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Pharmacist(pharmacist): Pharmacist,
    ApiMultipart(multipart): ApiMultipart,
) -> Result<(StatusCode, Json<ApiResponse<MerchandiseDetail>>), ApiError> {
    let (input, image) = read_form(multipart, &req_id.0).await?;

    let outcome = state
        .catalog
        .create_merchandise(input, image)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    tracing::info!(
        merchandise_id = outcome.result.id,
        pharmacist_id = pharmacist.id,
        "merchandise created via api"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::from_outcome(outcome, req_id.0)),
    ))
}

/// GET /api/v1/merchandises/{id}
pub(super) async fn get_merchandise(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ApiResponse<MerchandiseDetail>>, ApiError> {
    let outcome = state
        .catalog
        .get_merchandise(id)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}

/// POST /api/v1/merchandises/{id}/effects
pub(super) async fn attach_effects(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiPath(id): ApiPath<i64>,
    Pharmacist(_pharmacist): Pharmacist,
    ApiJson(body): ApiJson<AttachEffectsRequest>,
) -> Result<Json<ApiResponse<Vec<EffectAttachment>>>, ApiError> {
    let outcome = state
        .catalog
        .attach_effects(id, &body.effects)
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse::from_outcome(outcome, req_id.0)))
}
