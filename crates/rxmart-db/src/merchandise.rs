//! Database operations for `merchandises` and `merchandise_effects`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `merchandises` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MerchandiseRow {
    pub id: i64,
    pub name: String,
    pub manufacturer_id: i64,
    pub usage_instruction_id: i64,
    pub image_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Merchandise joined with its reference data, image and engagement totals.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MerchandiseDetailRow {
    pub id: i64,
    pub name: String,
    pub manufacturer_id: i64,
    pub manufacturer_name: String,
    pub usage_instruction_id: i64,
    pub usage_instruction: String,
    pub image_url: String,
    /// Effect tag names, alphabetical. Empty when untagged.
    pub effects: Vec<String>,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; reference ids must already be resolved.
#[derive(Debug, Clone)]
pub struct NewMerchandise<'a> {
    pub name: &'a str,
    pub manufacturer_id: i64,
    pub usage_instruction_id: i64,
    pub image_id: i64,
}

// ---------------------------------------------------------------------------
// merchandises operations
// ---------------------------------------------------------------------------

/// Inserts a merchandise row and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including foreign key
/// violations on unresolved reference ids).
pub async fn insert_merchandise(
    conn: &mut PgConnection,
    merchandise: &NewMerchandise<'_>,
) -> Result<MerchandiseRow, DbError> {
    let row = sqlx::query_as::<_, MerchandiseRow>(
        "INSERT INTO merchandises (name, manufacturer_id, usage_instruction_id, image_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, manufacturer_id, usage_instruction_id, image_id, created_at, updated_at",
    )
    .bind(merchandise.name)
    .bind(merchandise.manufacturer_id)
    .bind(merchandise.usage_instruction_id)
    .bind(merchandise.image_id)
    .fetch_one(conn)
    .await?;

    Ok(row)
}

/// Returns `true` if a merchandise row with this id exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn merchandise_exists(pool: &PgPool, merchandise_id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM merchandises WHERE id = $1)",
    )
    .bind(merchandise_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Returns one merchandise with manufacturer, usage instruction, image URL,
/// effect names and total like count, or `None` if the id is unknown.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_merchandise_detail(
    pool: &PgPool,
    merchandise_id: i64,
) -> Result<Option<MerchandiseDetailRow>, DbError> {
    let row = sqlx::query_as::<_, MerchandiseDetailRow>(
        "SELECT \
             m.id, \
             m.name, \
             mf.id   AS manufacturer_id, \
             mf.name AS manufacturer_name, \
             ui.id   AS usage_instruction_id, \
             ui.text AS usage_instruction, \
             i.url   AS image_url, \
             ARRAY( \
                 SELECT e.name \
                 FROM merchandise_effects me \
                 JOIN effects e ON e.id = me.effect_id \
                 WHERE me.merchandise_id = m.id \
                 ORDER BY e.name \
             ) AS effects, \
             ( \
                 SELECT COUNT(*) FROM merchandise_likes ml \
                 WHERE ml.merchandise_id = m.id \
             ) AS like_count, \
             m.created_at, \
             m.updated_at \
         FROM merchandises m \
         JOIN manufacturers mf      ON mf.id = m.manufacturer_id \
         JOIN usage_instructions ui ON ui.id = m.usage_instruction_id \
         JOIN images i              ON i.id = m.image_id \
         WHERE m.id = $1",
    )
    .bind(merchandise_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// merchandise_effects operations
// ---------------------------------------------------------------------------

/// Links an effect tag to a merchandise.
///
/// Idempotent: an existing link is left alone. Returns `true` if a new link
/// was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a foreign key
/// violation when the merchandise does not exist).
pub async fn attach_effect(
    conn: &mut PgConnection,
    merchandise_id: i64,
    effect_id: i64,
) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "INSERT INTO merchandise_effects (merchandise_id, effect_id) \
         VALUES ($1, $2) \
         ON CONFLICT (merchandise_id, effect_id) DO NOTHING",
    )
    .bind(merchandise_id)
    .bind(effect_id)
    .execute(conn)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}
