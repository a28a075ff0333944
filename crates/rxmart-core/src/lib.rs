//! Domain types, validation rules and configuration shared by every rxmart crate.

pub mod accounts;
pub mod app_config;
pub mod comments;
pub mod config;
pub mod ranking;
pub mod reference;
pub mod search;

use thiserror::Error;

pub use accounts::{load_accounts, AccountsFile, CustomerSeed, Gender, PharmacistSeed};
pub use app_config::{AppConfig, Environment};
pub use comments::{check_comment_access, AccessDenied, CommentInput, CommentPatch, NewComment};
pub use config::{load_app_config, load_app_config_from_env};
pub use ranking::{AgeBand, RankingFilter};
pub use reference::{canonical_value, ReferenceKind};
pub use search::SearchKeyword;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read accounts file {path}: {source}")]
    AccountsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse accounts file: {0}")]
    AccountsFileParse(#[from] serde_yaml::Error),

    #[error("accounts validation failed: {0}")]
    Validation(String),
}

/// A caller-supplied value that breaks a domain rule.
///
/// Raised before any store access so a rejected request never writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be non-zero")]
    Zero(&'static str),

    #[error("{0} must not contain NUL characters")]
    NulByte(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// Postgres text columns cannot hold `\0`; reject it up front so the store
/// never sees it.
///
/// # Errors
///
/// Returns [`ValidationError::NulByte`] naming `field`.
pub fn ensure_storable(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::NulByte(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_is_not_storable() {
        assert_eq!(ensure_storable("name", "ok"), Ok(()));
        assert_eq!(
            ensure_storable("name", "fe\0ver"),
            Err(ValidationError::NulByte("name"))
        );
    }
}
