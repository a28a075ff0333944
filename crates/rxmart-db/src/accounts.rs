//! Pharmacist and customer lookups, plus seeding from the accounts file.

use chrono::{DateTime, Utc};
use rxmart_core::AccountsFile;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `pharmacists` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PharmacistRow {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `customers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub user_name: String,
    pub email: String,
    pub age: i32,
    /// `"male"` or `"female"`.
    pub gender: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch a pharmacist by id. Returns `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_pharmacist(pool: &PgPool, id: i64) -> Result<Option<PharmacistRow>, DbError> {
    let row = sqlx::query_as::<_, PharmacistRow>(
        "SELECT id, user_name, email, created_at, updated_at \
         FROM pharmacists \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetch a customer by id. Returns `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_customer(pool: &PgPool, id: i64) -> Result<Option<CustomerRow>, DbError> {
    let row = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, user_name, email, age, gender, created_at, updated_at \
         FROM customers \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upsert every pharmacist and customer in `accounts`, keyed by `user_name`.
///
/// Returns the number of accounts processed. All upserts run in one
/// transaction; any failure rolls back the whole batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_accounts(pool: &PgPool, accounts: &AccountsFile) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for pharmacist in &accounts.pharmacists {
        sqlx::query(
            "INSERT INTO pharmacists (user_name, email) \
             VALUES ($1, $2) \
             ON CONFLICT (user_name) DO UPDATE SET \
                 email = EXCLUDED.email, \
                 updated_at = NOW()",
        )
        .bind(&pharmacist.user_name)
        .bind(&pharmacist.email)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    for customer in &accounts.customers {
        sqlx::query(
            "INSERT INTO customers (user_name, email, age, gender) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_name) DO UPDATE SET \
                 email = EXCLUDED.email, \
                 age = EXCLUDED.age, \
                 gender = EXCLUDED.gender, \
                 updated_at = NOW()",
        )
        .bind(&customer.user_name)
        .bind(&customer.email)
        .bind(customer.age)
        .bind(customer.gender.as_str())
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
