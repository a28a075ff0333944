//! Validation and access rules for pharmacist reviews ("comments").

use serde::{Deserialize, Serialize};

use crate::{ensure_storable, ValidationError};

/// Raw comment fields as submitted by the caller; any of them may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub positive: Option<String>,
    pub negative: Option<String>,
    pub rating: Option<i32>,
}

/// A comment body that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewComment {
    pub positive: String,
    pub negative: String,
    pub rating: i32,
}

impl CommentInput {
    /// Every field is mandatory: a missing or blank text, or a missing or zero
    /// rating, rejects the whole comment.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, checking `positive`,
    /// `negative`, then `rating`.
    pub fn validate(self) -> Result<NewComment, ValidationError> {
        let positive = required_text("positive", self.positive)?;
        let negative = required_text("negative", self.negative)?;
        let rating = match self.rating {
            None => return Err(ValidationError::Empty("rating")),
            Some(0) => return Err(ValidationError::Zero("rating")),
            Some(r) => r,
        };
        Ok(NewComment {
            positive,
            negative,
            rating,
        })
    }
}

/// Sparse update to an existing comment. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommentPatch {
    pub positive: Option<String>,
    pub negative: Option<String>,
    pub rating: Option<i32>,
}

impl CommentPatch {
    /// Supplied fields must satisfy the same rules as on creation.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a supplied field is blank or zero.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let positive = self
            .positive
            .map(|v| required_text("positive", Some(v)))
            .transpose()?;
        let negative = self
            .negative
            .map(|v| required_text("negative", Some(v)))
            .transpose()?;
        if self.rating == Some(0) {
            return Err(ValidationError::Zero("rating"));
        }
        Ok(Self {
            positive,
            negative,
            rating: self.rating,
        })
    }
}

fn required_text(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => {
            ensure_storable(field, &v)?;
            Ok(v)
        }
        _ => Err(ValidationError::Empty(field)),
    }
}

/// Why a caller may not mutate a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// The caller did not write the comment.
    NotAuthor,
    /// The comment belongs to a different merchandise than the one addressed.
    WrongParent,
}

/// Gate for update/delete. Authorship is checked before parent consistency, so
/// a non-author addressing the wrong merchandise still gets `NotAuthor`.
///
/// # Errors
///
/// Returns the first [`AccessDenied`] reason that applies.
pub fn check_comment_access(
    comment_author_id: i64,
    comment_merchandise_id: i64,
    caller_id: i64,
    addressed_merchandise_id: i64,
) -> Result<(), AccessDenied> {
    if comment_author_id != caller_id {
        return Err(AccessDenied::NotAuthor);
    }
    if comment_merchandise_id != addressed_merchandise_id {
        return Err(AccessDenied::WrongParent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(positive: Option<&str>, negative: Option<&str>, rating: Option<i32>) -> CommentInput {
        CommentInput {
            positive: positive.map(str::to_owned),
            negative: negative.map(str::to_owned),
            rating,
        }
    }

    #[test]
    fn complete_input_validates() {
        let comment = input(Some("works fast"), Some("bitter"), Some(4))
            .validate()
            .unwrap();
        assert_eq!(comment.positive, "works fast");
        assert_eq!(comment.negative, "bitter");
        assert_eq!(comment.rating, 4);
    }

    #[test]
    fn each_missing_field_is_rejected() {
        assert_eq!(
            input(None, Some("n"), Some(3)).validate(),
            Err(ValidationError::Empty("positive"))
        );
        assert_eq!(
            input(Some("p"), None, Some(3)).validate(),
            Err(ValidationError::Empty("negative"))
        );
        assert_eq!(
            input(Some("p"), Some("n"), None).validate(),
            Err(ValidationError::Empty("rating"))
        );
    }

    #[test]
    fn blank_text_and_zero_rating_are_rejected() {
        assert_eq!(
            input(Some(""), Some("n"), Some(3)).validate(),
            Err(ValidationError::Empty("positive"))
        );
        assert_eq!(
            input(Some("p"), Some("   "), Some(3)).validate(),
            Err(ValidationError::Empty("negative"))
        );
        assert_eq!(
            input(Some("p"), Some("n"), Some(0)).validate(),
            Err(ValidationError::Zero("rating"))
        );
    }

    #[test]
    fn nul_in_comment_text_is_rejected() {
        assert_eq!(
            input(Some("p"), Some("bit\0ter"), Some(3)).validate(),
            Err(ValidationError::NulByte("negative"))
        );
    }

    #[test]
    fn patch_keeps_absent_fields_and_rejects_blank_ones() {
        let patch = CommentPatch {
            rating: Some(5),
            ..CommentPatch::default()
        };
        assert_eq!(patch.clone().validate(), Ok(patch));

        let blank = CommentPatch {
            positive: Some(String::new()),
            ..CommentPatch::default()
        };
        assert_eq!(blank.validate(), Err(ValidationError::Empty("positive")));

        let zero = CommentPatch {
            rating: Some(0),
            ..CommentPatch::default()
        };
        assert_eq!(zero.validate(), Err(ValidationError::Zero("rating")));
    }

    #[test]
    fn empty_patch_is_valid() {
        assert_eq!(CommentPatch::default().validate(), Ok(CommentPatch::default()));
    }

    #[test]
    fn author_on_matching_parent_is_allowed() {
        assert_eq!(check_comment_access(7, 3, 7, 3), Ok(()));
    }

    #[test]
    fn non_author_is_rejected_even_with_correct_parent() {
        assert_eq!(
            check_comment_access(7, 3, 8, 3),
            Err(AccessDenied::NotAuthor)
        );
    }

    #[test]
    fn authorship_is_checked_before_parent() {
        assert_eq!(
            check_comment_access(7, 3, 8, 4),
            Err(AccessDenied::NotAuthor)
        );
    }

    #[test]
    fn author_with_wrong_parent_is_rejected() {
        assert_eq!(
            check_comment_access(7, 3, 7, 4),
            Err(AccessDenied::WrongParent)
        );
    }
}
