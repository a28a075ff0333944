//! Database operations for the `images` table.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::DbError;

/// A row from the `images` table: where an uploaded blob lives.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRow {
    pub id: i64,
    /// Key inside the blob store, e.g. `"3f/3fa2….jpg"`.
    pub storage_key: String,
    pub url: String,
    pub content_type: Option<String>,
    pub byte_size: i64,
    pub created_at: DateTime<Utc>,
}

pub struct NewImage<'a> {
    pub storage_key: &'a str,
    pub url: &'a str,
    pub content_type: Option<&'a str>,
    pub byte_size: i64,
}

/// Records an uploaded blob and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_image(conn: &mut PgConnection, image: &NewImage<'_>) -> Result<ImageRow, DbError> {
    let row = sqlx::query_as::<_, ImageRow>(
        "INSERT INTO images (storage_key, url, content_type, byte_size) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, storage_key, url, content_type, byte_size, created_at",
    )
    .bind(image.storage_key)
    .bind(image.url)
    .bind(image.content_type)
    .bind(image.byte_size)
    .fetch_one(conn)
    .await?;

    Ok(row)
}
