//! Substring search across merchandise name, effect tags and manufacturer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{merchandise::MerchandiseRow, DbError};

/// A search hit with the joined names that could have matched.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MerchandiseSearchRow {
    pub id: i64,
    pub name: String,
    pub manufacturer_name: String,
    pub image_url: String,
    pub effects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// `strpos` keeps `%` and `_` in the keyword literal and follows the column
// collation, so matching is case-sensitive.
const MATCH_PREDICATE: &str = "\
    strpos(m.name, $1) > 0 \
    OR strpos(mf.name, $1) > 0 \
    OR EXISTS ( \
        SELECT 1 FROM merchandise_effects me \
        JOIN effects e ON e.id = me.effect_id \
        WHERE me.merchandise_id = m.id AND strpos(e.name, $1) > 0 \
    )";

/// Merchandise whose name, manufacturer name, or any effect name contains
/// `keyword`. Each merchandise appears at most once, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_merchandise(
    pool: &PgPool,
    keyword: &str,
) -> Result<Vec<MerchandiseSearchRow>, DbError> {
    let sql = format!(
        "SELECT m.id, m.name, mf.name AS manufacturer_name, i.url AS image_url, \
                ARRAY( \
                    SELECT e.name FROM merchandise_effects me \
                    JOIN effects e ON e.id = me.effect_id \
                    WHERE me.merchandise_id = m.id \
                    ORDER BY e.name \
                ) AS effects, \
                m.created_at \
         FROM merchandises m \
         JOIN manufacturers mf ON mf.id = m.manufacturer_id \
         JOIN images i         ON i.id = m.image_id \
         WHERE {MATCH_PREDICATE} \
         ORDER BY m.id"
    );

    let rows = sqlx::query_as::<_, MerchandiseSearchRow>(&sql)
        .bind(keyword)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Same filter as [`search_merchandise`], returning bare merchandise rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_merchandise_rows(
    pool: &PgPool,
    keyword: &str,
) -> Result<Vec<MerchandiseRow>, DbError> {
    let sql = format!(
        "SELECT m.id, m.name, m.manufacturer_id, m.usage_instruction_id, m.image_id, \
                m.created_at, m.updated_at \
         FROM merchandises m \
         JOIN manufacturers mf ON mf.id = m.manufacturer_id \
         WHERE {MATCH_PREDICATE} \
         ORDER BY m.id"
    );

    let rows = sqlx::query_as::<_, MerchandiseRow>(&sql)
        .bind(keyword)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}
