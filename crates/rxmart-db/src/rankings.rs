//! "Most liked" ranking queries.
//!
//! Each query counts only the likes that satisfy its filter, keeps merchandise
//! with at least one such like, and sorts by that count descending with the
//! merchandise id as a deterministic tie-break.

use chrono::{DateTime, Utc};
use rxmart_core::{AgeBand, Gender};
use sqlx::PgPool;

use crate::DbError;

/// One ranked merchandise. `likes` is the filtered count, not the total.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankedMerchandiseRow {
    pub id: i64,
    pub name: String,
    pub manufacturer_name: String,
    pub image_url: String,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

// Shared by all three rankings. Expects a `qualifying(merchandise_id, likes)`
// CTE to precede it; `$1` is reserved for the first filter value and the
// limit placeholder is appended by the caller.
const RANKED_SELECT: &str = "\
    SELECT m.id, m.name, mf.name AS manufacturer_name, i.url AS image_url, \
           q.likes, m.created_at \
    FROM qualifying q \
    JOIN merchandises m   ON m.id = q.merchandise_id \
    JOIN manufacturers mf ON mf.id = m.manufacturer_id \
    JOIN images i         ON i.id = m.image_id \
    ORDER BY q.likes DESC, m.id ASC";

fn ranked_query(qualifying_cte: &str, limit_param: u8) -> String {
    format!(
        "WITH qualifying AS ({qualifying_cte}) {RANKED_SELECT} \
         LIMIT COALESCE(${limit_param}, 9223372036854775807)"
    )
}

/// Merchandise ranked by likes from customers whose age lies in `band`
/// (inclusive on both ends).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn rank_by_age(
    pool: &PgPool,
    band: AgeBand,
    limit: Option<i64>,
) -> Result<Vec<RankedMerchandiseRow>, DbError> {
    let sql = ranked_query(
        "SELECT ml.merchandise_id, COUNT(*) AS likes \
         FROM merchandise_likes ml \
         JOIN customers c ON c.id = ml.customer_id \
         WHERE c.age BETWEEN $1 AND $2 \
         GROUP BY ml.merchandise_id",
        3,
    );

    let rows = sqlx::query_as::<_, RankedMerchandiseRow>(&sql)
        .bind(band.min_age)
        .bind(band.max_age)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Merchandise ranked by likes from customers of the given gender.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn rank_by_gender(
    pool: &PgPool,
    gender: Gender,
    limit: Option<i64>,
) -> Result<Vec<RankedMerchandiseRow>, DbError> {
    let sql = ranked_query(
        "SELECT ml.merchandise_id, COUNT(*) AS likes \
         FROM merchandise_likes ml \
         JOIN customers c ON c.id = ml.customer_id \
         WHERE c.gender = $1 \
         GROUP BY ml.merchandise_id",
        2,
    );

    let rows = sqlx::query_as::<_, RankedMerchandiseRow>(&sql)
        .bind(gender.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Merchandise tagged with `effect_id`, ranked by its like rows.
///
/// The `(merchandise_id, effect_id)` primary key guarantees at most one tag
/// row per merchandise, so every like is counted exactly once.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn rank_by_effect(
    pool: &PgPool,
    effect_id: i64,
    limit: Option<i64>,
) -> Result<Vec<RankedMerchandiseRow>, DbError> {
    let sql = ranked_query(
        "SELECT ml.merchandise_id, COUNT(*) AS likes \
         FROM merchandise_likes ml \
         JOIN merchandise_effects me ON me.merchandise_id = ml.merchandise_id \
         WHERE me.effect_id = $1 \
         GROUP BY ml.merchandise_id",
        2,
    );

    let rows = sqlx::query_as::<_, RankedMerchandiseRow>(&sql)
        .bind(effect_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_query_places_limit_placeholder() {
        let sql = ranked_query("SELECT 1 AS merchandise_id, 1 AS likes", 3);

        assert!(sql.starts_with("WITH qualifying AS (SELECT 1"));
        assert!(sql.contains("ORDER BY q.likes DESC, m.id ASC"));
        assert!(sql.ends_with("LIMIT COALESCE($3, 9223372036854775807)"));
    }
}
