//! Connect-or-create for the value-deduplicated reference tables
//! (`manufacturers`, `usage_instructions`, `effects`).

use rxmart_core::ReferenceKind;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

const MAX_ATTEMPTS: u32 = 3;

/// Outcome of looking a reference value up without writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A row with this value exists; reuse its id.
    Connect(i64),
    /// No row yet; the enclosing write must create one with this value.
    Create(String),
}

/// A reference row id together with whether this call inserted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ResolvedReference {
    pub id: i64,
    pub created: bool,
}

/// Classifies `value` as "connect to existing row" or "create new row".
///
/// Read-only; the store's unique constraint stays the source of truth, so a
/// `Create` answer may be stale by the time the caller writes. Use
/// [`connect_or_create`] to act on it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn normalize(
    pool: &PgPool,
    kind: ReferenceKind,
    value: &str,
) -> Result<Normalized, DbError> {
    let sql = format!(
        "SELECT id FROM {table} WHERE {column} = $1",
        table = kind.table(),
        column = kind.value_column(),
    );

    let existing = sqlx::query_scalar::<_, i64>(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await?;

    Ok(match existing {
        Some(id) => Normalized::Connect(id),
        None => Normalized::Create(value.to_string()),
    })
}

/// Returns the id of the row holding `value`, inserting it if absent.
///
/// A single `INSERT … ON CONFLICT DO NOTHING` + `SELECT` statement. When a
/// concurrent writer commits the same value between our snapshot and our
/// insert, the statement sees neither row and is retried.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails, or
/// [`DbError::RetriesExhausted`] if the row never became visible.
pub async fn connect_or_create(
    conn: &mut PgConnection,
    kind: ReferenceKind,
    value: &str,
) -> Result<ResolvedReference, DbError> {
    let sql = format!(
        "WITH inserted AS ( \
             INSERT INTO {table} ({column}) VALUES ($1) \
             ON CONFLICT ({column}) DO NOTHING \
             RETURNING id \
         ) \
         SELECT id, TRUE AS created FROM inserted \
         UNION ALL \
         SELECT id, FALSE AS created FROM {table} WHERE {column} = $1 \
         LIMIT 1",
        table = kind.table(),
        column = kind.value_column(),
    );

    for attempt in 1..=MAX_ATTEMPTS {
        let resolved = sqlx::query_as::<_, ResolvedReference>(&sql)
            .bind(value)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(resolved) = resolved {
            if resolved.created {
                tracing::debug!(kind = %kind, id = resolved.id, "created reference row");
            }
            return Ok(resolved);
        }

        tracing::warn!(kind = %kind, attempt, "reference row raced with a concurrent insert; retrying");
    }

    Err(DbError::RetriesExhausted {
        operation: "reference connect-or-create",
        attempts: MAX_ATTEMPTS,
    })
}
