//! The customer like toggle over `merchandise_likes`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

const MAX_ATTEMPTS: u32 = 3;

/// A row from the `merchandise_likes` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct LikeRow {
    pub customer_id: i64,
    pub merchandise_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of one toggle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeToggle {
    /// The inserted row, or the row that was just removed.
    pub like: LikeRow,
    /// `true` if the pair is liked after this call.
    pub liked: bool,
}

/// Flips the like state of `(customer_id, merchandise_id)`.
///
/// Delete first; if nothing was there, insert. Every statement is atomic on
/// its own and the primary key forbids duplicates, so two concurrent calls
/// for the same pair can never leave two rows behind. If a concurrent insert
/// wins between our delete and our insert, the existing row is reported as
/// liked.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails (a missing customer or
/// merchandise surfaces as a foreign key violation), or
/// [`DbError::RetriesExhausted`] if the pair kept flipping underneath us.
pub async fn toggle_like(
    pool: &PgPool,
    customer_id: i64,
    merchandise_id: i64,
) -> Result<LikeToggle, DbError> {
    for attempt in 1..=MAX_ATTEMPTS {
        let removed = sqlx::query_as::<_, LikeRow>(
            "DELETE FROM merchandise_likes \
             WHERE customer_id = $1 AND merchandise_id = $2 \
             RETURNING customer_id, merchandise_id, created_at",
        )
        .bind(customer_id)
        .bind(merchandise_id)
        .fetch_optional(pool)
        .await?;

        if let Some(like) = removed {
            return Ok(LikeToggle { like, liked: false });
        }

        let inserted = sqlx::query_as::<_, LikeRow>(
            "INSERT INTO merchandise_likes (customer_id, merchandise_id) \
             VALUES ($1, $2) \
             ON CONFLICT (customer_id, merchandise_id) DO NOTHING \
             RETURNING customer_id, merchandise_id, created_at",
        )
        .bind(customer_id)
        .bind(merchandise_id)
        .fetch_optional(pool)
        .await?;

        if let Some(like) = inserted {
            return Ok(LikeToggle { like, liked: true });
        }

        let existing = sqlx::query_as::<_, LikeRow>(
            "SELECT customer_id, merchandise_id, created_at \
             FROM merchandise_likes \
             WHERE customer_id = $1 AND merchandise_id = $2",
        )
        .bind(customer_id)
        .bind(merchandise_id)
        .fetch_optional(pool)
        .await?;

        if let Some(like) = existing {
            return Ok(LikeToggle { like, liked: true });
        }

        tracing::warn!(
            customer_id,
            merchandise_id,
            attempt,
            "like row flipped concurrently; retrying toggle"
        );
    }

    Err(DbError::RetriesExhausted {
        operation: "like toggle",
        attempts: MAX_ATTEMPTS,
    })
}

/// Total likes recorded for one merchandise.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_likes(pool: &PgPool, merchandise_id: i64) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM merchandise_likes WHERE merchandise_id = $1",
    )
    .bind(merchandise_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
