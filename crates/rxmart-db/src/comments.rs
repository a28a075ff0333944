//! Database operations for the `comments` table.

use chrono::{DateTime, Utc};
use rxmart_core::{CommentPatch, NewComment};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// A row from the `comments` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: i64,
    pub merchandise_id: i64,
    /// Author. Never changes after insert.
    pub pharmacist_id: i64,
    pub positive: String,
    pub negative: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A comment together with its author's display name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentWithAuthorRow {
    pub id: i64,
    pub merchandise_id: i64,
    pub pharmacist_id: i64,
    pub author_user_name: String,
    pub positive: String,
    pub negative: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inserts a validated comment and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a missing merchandise or
/// pharmacist surfaces as a foreign key violation.
pub async fn insert_comment(
    pool: &PgPool,
    merchandise_id: i64,
    pharmacist_id: i64,
    comment: &NewComment,
) -> Result<CommentRow, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "INSERT INTO comments (merchandise_id, pharmacist_id, positive, negative, rating) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, merchandise_id, pharmacist_id, positive, negative, rating, \
                   created_at, updated_at",
    )
    .bind(merchandise_id)
    .bind(pharmacist_id)
    .bind(&comment.positive)
    .bind(&comment.negative)
    .bind(comment.rating)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Loads a comment and row-locks it until the surrounding transaction ends,
/// so guard checks and the following write see the same row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_comment_for_update(
    conn: &mut PgConnection,
    comment_id: i64,
) -> Result<Option<CommentRow>, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "SELECT id, merchandise_id, pharmacist_id, positive, negative, rating, \
                created_at, updated_at \
         FROM comments \
         WHERE id = $1 \
         FOR UPDATE",
    )
    .bind(comment_id)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Applies a sparse patch and returns the updated comment with its author name.
///
/// `None` patch fields keep the stored value. Authorship and parent are not
/// writable here.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the comment vanished, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_comment(
    conn: &mut PgConnection,
    comment_id: i64,
    patch: &CommentPatch,
) -> Result<CommentWithAuthorRow, DbError> {
    let row = sqlx::query_as::<_, CommentWithAuthorRow>(
        "WITH updated AS ( \
             UPDATE comments \
             SET positive   = COALESCE($2, positive), \
                 negative   = COALESCE($3, negative), \
                 rating     = COALESCE($4, rating), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING id, merchandise_id, pharmacist_id, positive, negative, rating, \
                       created_at, updated_at \
         ) \
         SELECT u.id, u.merchandise_id, u.pharmacist_id, p.user_name AS author_user_name, \
                u.positive, u.negative, u.rating, u.created_at, u.updated_at \
         FROM updated u \
         JOIN pharmacists p ON p.id = u.pharmacist_id",
    )
    .bind(comment_id)
    .bind(patch.positive.as_deref())
    .bind(patch.negative.as_deref())
    .bind(patch.rating)
    .fetch_optional(conn)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a comment and returns the removed row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row was deleted, or
/// [`DbError::Sqlx`] if the delete fails.
pub async fn delete_comment(conn: &mut PgConnection, comment_id: i64) -> Result<CommentRow, DbError> {
    let row = sqlx::query_as::<_, CommentRow>(
        "DELETE FROM comments \
         WHERE id = $1 \
         RETURNING id, merchandise_id, pharmacist_id, positive, negative, rating, \
                   created_at, updated_at",
    )
    .bind(comment_id)
    .fetch_optional(conn)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Returns every comment on a merchandise with author names, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_comments(
    pool: &PgPool,
    merchandise_id: i64,
) -> Result<Vec<CommentWithAuthorRow>, DbError> {
    let rows = sqlx::query_as::<_, CommentWithAuthorRow>(
        "SELECT c.id, c.merchandise_id, c.pharmacist_id, p.user_name AS author_user_name, \
                c.positive, c.negative, c.rating, c.created_at, c.updated_at \
         FROM comments c \
         JOIN pharmacists p ON p.id = c.pharmacist_id \
         WHERE c.merchandise_id = $1 \
         ORDER BY c.created_at DESC, c.id DESC",
    )
    .bind(merchandise_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
