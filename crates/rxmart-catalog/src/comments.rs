//! Pharmacist reviews: create, update, delete and list.
//!
//! Update and delete lock the comment row, then check authorship before
//! parent consistency. No write happens unless both checks pass.

use rxmart_core::{check_comment_access, AccessDenied, CommentInput, CommentPatch};
use rxmart_db::CommentRow;

use crate::{views::CommentView, CatalogError, CatalogService, ImageStore, Outcome};

fn guard(
    comment: &CommentRow,
    merchandise_id: i64,
    caller_id: i64,
) -> Result<(), CatalogError> {
    check_comment_access(
        comment.pharmacist_id,
        comment.merchandise_id,
        caller_id,
        merchandise_id,
    )
    .map_err(|denied| {
        tracing::warn!(
            comment_id = comment.id,
            merchandise_id,
            caller_id,
            reason = ?denied,
            "comment mutation rejected"
        );
        match denied {
            AccessDenied::NotAuthor => CatalogError::Unauthorized {
                comment_id: comment.id,
                caller_id,
            },
            AccessDenied::WrongParent => CatalogError::InconsistentParent {
                comment_id: comment.id,
                merchandise_id,
            },
        }
    })
}

impl<S: ImageStore> CatalogService<S> {
    /// Adds a review by `author_id` to a merchandise.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if `positive` or `negative` is
    /// missing or blank or `rating` is missing or zero (nothing is written),
    /// [`CatalogError::NotFound`] if the merchandise does not exist, or
    /// [`CatalogError::Db`] if the insert fails.
    pub async fn create_comment(
        &self,
        merchandise_id: i64,
        input: CommentInput,
        author_id: i64,
    ) -> Result<Outcome<CommentView>, CatalogError> {
        let comment = input.validate()?;

        let row = rxmart_db::insert_comment(&self.pool, merchandise_id, author_id, &comment)
            .await
            .map_err(|e| CatalogError::missing_parent(e, "merchandise", merchandise_id))?;

        tracing::info!(
            comment_id = row.id,
            merchandise_id,
            author_id,
            "created comment"
        );
        Ok(Outcome::new(CommentView::from(row), "comment created"))
    }

    /// Applies `patch` to a comment the caller wrote on `merchandise_id`.
    ///
    /// Returns the updated comment with its author's display name.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for a blank or zero patch field,
    /// [`CatalogError::NotFound`] for an unknown comment,
    /// [`CatalogError::Unauthorized`] if the caller is not the author,
    /// [`CatalogError::InconsistentParent`] if the comment belongs to another
    /// merchandise, or [`CatalogError::Db`] if the update fails.
    pub async fn update_comment(
        &self,
        merchandise_id: i64,
        comment_id: i64,
        patch: CommentPatch,
        caller_id: i64,
    ) -> Result<Outcome<CommentView>, CatalogError> {
        let patch = patch.validate()?;

        let mut tx = self.pool.begin().await?;
        let comment = rxmart_db::get_comment_for_update(&mut tx, comment_id)
            .await?
            .ok_or(CatalogError::NotFound {
                entity: "comment",
                id: comment_id,
            })?;
        guard(&comment, merchandise_id, caller_id)?;

        let updated = rxmart_db::update_comment(&mut tx, comment_id, &patch).await?;
        tx.commit().await?;

        tracing::info!(comment_id, merchandise_id, caller_id, "updated comment");
        Ok(Outcome::new(CommentView::from(updated), "comment updated"))
    }

    /// Removes a comment the caller wrote on `merchandise_id` and returns the
    /// deleted record.
    ///
    /// # Errors
    ///
    /// Same lookup and guard failures as [`Self::update_comment`].
    pub async fn delete_comment(
        &self,
        merchandise_id: i64,
        comment_id: i64,
        caller_id: i64,
    ) -> Result<Outcome<CommentView>, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let comment = rxmart_db::get_comment_for_update(&mut tx, comment_id)
            .await?
            .ok_or(CatalogError::NotFound {
                entity: "comment",
                id: comment_id,
            })?;
        guard(&comment, merchandise_id, caller_id)?;

        let deleted = rxmart_db::delete_comment(&mut tx, comment_id).await?;
        tx.commit().await?;

        tracing::info!(comment_id, merchandise_id, caller_id, "deleted comment");
        Ok(Outcome::new(CommentView::from(deleted), "comment deleted"))
    }

    /// Every comment on a merchandise with author names, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the merchandise does not exist,
    /// or [`CatalogError::Db`] if the query fails.
    pub async fn list_comments(
        &self,
        merchandise_id: i64,
    ) -> Result<Outcome<Vec<CommentView>>, CatalogError> {
        if !rxmart_db::merchandise_exists(&self.pool, merchandise_id).await? {
            return Err(CatalogError::NotFound {
                entity: "merchandise",
                id: merchandise_id,
            });
        }

        let rows = rxmart_db::list_comments(&self.pool, merchandise_id).await?;
        let message = format!("{} comment(s)", rows.len());
        Ok(Outcome::new(
            rows.into_iter().map(CommentView::from).collect(),
            message,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn comment(author: i64, merchandise: i64) -> CommentRow {
        let now = Utc::now();
        CommentRow {
            id: 11,
            merchandise_id: merchandise,
            pharmacist_id: author,
            positive: "good".to_string(),
            negative: "bad".to_string(),
            rating: 3,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn non_author_is_unauthorized_even_with_wrong_parent() {
        let err = guard(&comment(1, 5), 6, 2).expect_err("must be rejected");
        assert!(matches!(
            err,
            CatalogError::Unauthorized {
                comment_id: 11,
                caller_id: 2
            }
        ));
    }

    #[test]
    fn author_with_wrong_parent_is_inconsistent() {
        let err = guard(&comment(1, 5), 6, 1).expect_err("must be rejected");
        assert!(matches!(
            err,
            CatalogError::InconsistentParent {
                comment_id: 11,
                merchandise_id: 6
            }
        ));
    }

    #[test]
    fn author_on_right_parent_passes() {
        assert!(guard(&comment(1, 5), 5, 1).is_ok());
    }
}
