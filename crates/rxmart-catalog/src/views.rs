//! Serializable records returned inside [`crate::Outcome`].
//!
//! Each view is built fresh from database rows and exposes only the fields
//! callers should see.

use chrono::{DateTime, Utc};
use rxmart_db::{
    CommentRow, CommentWithAuthorRow, MerchandiseDetailRow, MerchandiseRow, MerchandiseSearchRow,
    Normalized, RankedMerchandiseRow,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReferenceIntent {
    Connect { id: i64 },
    Create { value: String },
}

impl From<Normalized> for ReferenceIntent {
    fn from(normalized: Normalized) -> Self {
        match normalized {
            Normalized::Connect(id) => ReferenceIntent::Connect { id },
            Normalized::Create(value) => ReferenceIntent::Create { value },
        }
    }
}

/// A bare merchandise record, reference fields as ids.
#[derive(Debug, Clone, Serialize)]
pub struct MerchandiseSummary {
    pub id: i64,
    pub name: String,
    pub manufacturer_id: i64,
    pub usage_instruction_id: i64,
    pub image_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MerchandiseRow> for MerchandiseSummary {
    fn from(row: MerchandiseRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            manufacturer_id: row.manufacturer_id,
            usage_instruction_id: row.usage_instruction_id,
            image_id: row.image_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MerchandiseDetail {
    pub id: i64,
    pub name: String,
    pub manufacturer_id: i64,
    pub manufacturer: String,
    pub usage_instruction_id: i64,
    pub usage_instruction: String,
    pub image_url: String,
    pub effects: Vec<String>,
    pub like_count: i64,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MerchandiseDetail {
    pub(crate) fn from_parts(row: MerchandiseDetailRow, comments: Vec<CommentWithAuthorRow>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            manufacturer_id: row.manufacturer_id,
            manufacturer: row.manufacturer_name,
            usage_instruction_id: row.usage_instruction_id,
            usage_instruction: row.usage_instruction,
            image_url: row.image_url,
            effects: row.effects,
            like_count: row.like_count,
            comments: comments.into_iter().map(CommentView::from).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub merchandise_id: i64,
    pub pharmacist_id: i64,
    /// Author display name; absent on records returned from a delete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub positive: String,
    pub negative: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            merchandise_id: row.merchandise_id,
            pharmacist_id: row.pharmacist_id,
            author: None,
            positive: row.positive,
            negative: row.negative,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<CommentWithAuthorRow> for CommentView {
    fn from(row: CommentWithAuthorRow) -> Self {
        Self {
            id: row.id,
            merchandise_id: row.merchandise_id,
            pharmacist_id: row.pharmacist_id,
            author: Some(row.author_user_name),
            positive: row.positive,
            negative: row.negative,
            rating: row.rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeView {
    pub customer_id: i64,
    pub merchandise_id: i64,
    /// State after the toggle.
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectAttachment {
    pub effect_id: i64,
    pub name: String,
    /// `false` when the merchandise already carried this effect.
    pub attached: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedMerchandise {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub image_url: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<RankedMerchandiseRow> for RankedMerchandise {
    fn from(row: RankedMerchandiseRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            manufacturer: row.manufacturer_name,
            image_url: row.image_url,
            likes: row.likes,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub image_url: String,
    pub effects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MerchandiseSearchRow> for SearchHit {
    fn from(row: MerchandiseSearchRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            manufacturer: row.manufacturer_name,
            image_url: row.image_url,
            effects: row.effects,
            created_at: row.created_at,
        }
    }
}
