//! Normalized lookup entities that many merchandise rows point at.

use crate::{ensure_storable, ValidationError};

/// A reference table deduplicated by one unique text column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Manufacturer,
    UsageInstruction,
    Effect,
}

impl ReferenceKind {
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            ReferenceKind::Manufacturer => "manufacturers",
            ReferenceKind::UsageInstruction => "usage_instructions",
            ReferenceKind::Effect => "effects",
        }
    }

    /// The column carrying the unique constraint.
    #[must_use]
    pub fn value_column(self) -> &'static str {
        match self {
            ReferenceKind::Manufacturer | ReferenceKind::Effect => "name",
            ReferenceKind::UsageInstruction => "text",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::Manufacturer => "manufacturer",
            ReferenceKind::UsageInstruction => "usage_instruction",
            ReferenceKind::Effect => "effect",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical stored form of a reference value: surrounding whitespace removed.
///
/// # Errors
///
/// Returns [`ValidationError::Empty`] when nothing is left after trimming, or
/// [`ValidationError::NulByte`] if the value contains `\0`.
pub fn canonical_value(kind: ReferenceKind, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty(kind.label()));
    }
    ensure_storable(kind.label(), trimmed)?;
    Ok(trimmed.to_string())
}
