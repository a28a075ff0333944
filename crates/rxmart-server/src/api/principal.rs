//! Principal extraction.
//!
//! Authentication happens upstream; the gateway forwards the signed-in
//! account as `x-pharmacist-id` or `x-customer-id`. These extractors resolve
//! that id to a stored account and hand it to the handler explicitly.

use axum::{extract::FromRequestParts, http::request::Parts};
use rxmart_db::{CustomerRow, PharmacistRow};

use crate::middleware::{RequestId, CUSTOMER_HEADER, PHARMACIST_HEADER};

use super::{map_db_error, ApiError, AppState};

/// The pharmacist acting on this request.
#[derive(Debug, Clone)]
pub(super) struct Pharmacist(pub PharmacistRow);

/// The customer acting on this request.
#[derive(Debug, Clone)]
pub(super) struct Customer(pub CustomerRow);

fn request_id(parts: &Parts) -> String {
    parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

fn header_id(parts: &Parts, header: &'static str, request_id: &str) -> Result<i64, ApiError> {
    let raw = parts
        .headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::new(request_id, "unauthorized", format!("missing {header} header")))?;

    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::new(request_id, "unauthorized", format!("malformed {header} header")))
}

impl FromRequestParts<AppState> for Pharmacist {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let rid = request_id(parts);
        let id = header_id(parts, PHARMACIST_HEADER, &rid)?;

        match rxmart_db::get_pharmacist(state.pool(), id).await {
            Ok(Some(row)) => Ok(Pharmacist(row)),
            Ok(None) => {
                tracing::warn!(pharmacist_id = id, "unknown pharmacist principal");
                Err(ApiError::new(rid, "unauthorized", format!("unknown pharmacist {id}")))
            }
            Err(e) => Err(map_db_error(rid, &e)),
        }
    }
}

impl FromRequestParts<AppState> for Customer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let rid = request_id(parts);
        let id = header_id(parts, CUSTOMER_HEADER, &rid)?;

        match rxmart_db::get_customer(state.pool(), id).await {
            Ok(Some(row)) => Ok(Customer(row)),
            Ok(None) => {
                tracing::warn!(customer_id = id, "unknown customer principal");
                Err(ApiError::new(rid, "unauthorized", format!("unknown customer {id}")))
            }
            Err(e) => Err(map_db_error(rid, &e)),
        }
    }
}
