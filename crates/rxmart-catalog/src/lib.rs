//! Merchandise catalog operations: the writer, comment manager, like toggle,
//! rankings and search, composed over `rxmart-db` and an [`ImageStore`].
//!
//! Every operation takes the acting principal as an explicit id and returns
//! an [`Outcome`] on success or a typed [`CatalogError`] on failure; failures
//! never carry a partial payload.

pub mod comments;
pub mod images;
pub mod likes;
pub mod merchandise;
pub mod rankings;
pub mod search;
pub mod views;

use rxmart_core::ValidationError;
use rxmart_db::DbError;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

pub use images::{ImageStore, ImageStoreError, ImageUpload, LocalImageStore, StoredImage};
pub use merchandise::NewMerchandiseInput;
pub use views::{
    CommentView, EffectAttachment, LikeView, MerchandiseDetail, MerchandiseSummary,
    RankedMerchandise, ReferenceIntent, SearchHit,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("pharmacist {caller_id} is not the author of comment {comment_id}")]
    Unauthorized { comment_id: i64, caller_id: i64 },

    #[error("comment {comment_id} does not belong to merchandise {merchandise_id}")]
    InconsistentParent { comment_id: i64, merchandise_id: i64 },

    #[error(transparent)]
    Image(#[from] ImageStoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Db(DbError::from(err))
    }
}

impl CatalogError {
    /// Maps a foreign key violation on a write against `entity` to
    /// [`CatalogError::NotFound`]; every other error passes through.
    fn missing_parent(err: DbError, entity: &'static str, id: i64) -> Self {
        if err.is_foreign_key_violation() {
            CatalogError::NotFound { entity, id }
        } else {
            CatalogError::Db(err)
        }
    }
}

/// Successful result of a catalog operation plus a status line for the user.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub result: T,
    pub message: String,
}

impl<T> Outcome<T> {
    pub fn new(result: T, message: impl Into<String>) -> Self {
        Self {
            result,
            message: message.into(),
        }
    }
}

/// Entry point for every catalog operation.
///
/// Holds no per-request state; clone it or share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    pool: PgPool,
    images: S,
}

impl<S: ImageStore> CatalogService<S> {
    #[must_use]
    pub fn new(pool: PgPool, images: S) -> Self {
        Self { pool, images }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
