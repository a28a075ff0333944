use crate::{ensure_storable, ValidationError};

/// A non-blank free-text search term, matched as a substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKeyword(String);

impl SearchKeyword {
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] for a blank keyword, or
    /// [`ValidationError::NulByte`] if it contains `\0`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty("keyword"));
        }
        ensure_storable("keyword", trimmed)?;
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
