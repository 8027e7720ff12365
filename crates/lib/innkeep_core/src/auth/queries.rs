//! Credential-store queries for accounts and role rows.

use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{Account, RoleKind};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Check whether an email is already registered (case-insensitive).
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AuthError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1))",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Fetch an account by email (case-insensitive).
pub async fn find_account_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Account>, AuthError> {
    let row = sqlx::query_as::<_, (i64, String, String)>(
        "SELECT account_id, email, password_hash FROM accounts WHERE LOWER(email) = LOWER($1)",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(account_id, email, password_hash)| Account {
        account_id,
        email,
        password_hash,
    }))
}

/// Create an account plus exactly one role row referencing it, as a single
/// transaction. Returns the new role-row id.
///
/// A unique-index violation on the email maps to `DuplicateEmail` so that two
/// racing registrations cannot both succeed past the existence pre-check.
pub async fn create_account_with_role(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    nickname: &str,
    role: RoleKind,
) -> Result<i64, AuthError> {
    let mut tx = pool.begin().await?;

    let account_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO accounts (email, password_hash) VALUES ($1, $2) RETURNING account_id",
    )
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::DuplicateEmail
        } else {
            AuthError::from(e)
        }
    })?;

    let principal_id = match role {
        RoleKind::User => {
            sqlx::query_scalar::<_, i64>(
                "INSERT INTO users (account_id, nickname) VALUES ($1, $2) RETURNING user_id",
            )
            .bind(account_id)
            .bind(nickname)
            .fetch_one(&mut *tx)
            .await?
        }
        RoleKind::Admin => {
            sqlx::query_scalar::<_, i64>(
                "INSERT INTO admins (account_id, nickname) VALUES ($1, $2) RETURNING admin_id",
            )
            .bind(account_id)
            .bind(nickname)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;
    Ok(principal_id)
}
