//! Identity resolution across the two role tables.
//!
//! Every principal lives in exactly one of `users`/`admins`; the resolver
//! recovers which, and owns the per-principal refresh-token slot.

use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{Principal, RoleKind};

/// Resolve a principal by email, checking both role tables.
///
/// Membership in both tables at once violates the registration invariant and
/// fails closed rather than silently preferring one representation.
pub async fn resolve_by_email(pool: &PgPool, email: &str) -> Result<Option<Principal>, AuthError> {
    let user = sqlx::query_as::<_, (i64, String)>(
        "SELECT u.user_id, a.email \
         FROM users u \
         JOIN accounts a ON a.account_id = u.account_id \
         WHERE LOWER(a.email) = LOWER($1)",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    let admin = sqlx::query_as::<_, (i64, String)>(
        "SELECT ad.admin_id, a.email \
         FROM admins ad \
         JOIN accounts a ON a.account_id = ad.account_id \
         WHERE LOWER(a.email) = LOWER($1)",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match (user, admin) {
        (Some(_), Some(_)) => Err(AuthError::Integrity(
            "account has both a user row and an admin row".into(),
        )),
        (Some((id, email)), None) => Ok(Some(Principal {
            role: RoleKind::User,
            id,
            email,
        })),
        (None, Some((id, email))) => Ok(Some(Principal {
            role: RoleKind::Admin,
            id,
            email,
        })),
        (None, None) => Ok(None),
    }
}

/// Direct single-table lookup, used on the hot path of every authenticated
/// request. A token minted for one role never resolves through the other
/// table, even when ids collide across tables.
pub async fn resolve_by_role_and_id(
    pool: &PgPool,
    role: RoleKind,
    id: i64,
) -> Result<Option<Principal>, AuthError> {
    let row = match role {
        RoleKind::User => {
            sqlx::query_as::<_, (i64, String)>(
                "SELECT u.user_id, a.email \
                 FROM users u \
                 JOIN accounts a ON a.account_id = u.account_id \
                 WHERE u.user_id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
        RoleKind::Admin => {
            sqlx::query_as::<_, (i64, String)>(
                "SELECT ad.admin_id, a.email \
                 FROM admins ad \
                 JOIN accounts a ON a.account_id = ad.account_id \
                 WHERE ad.admin_id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(row.map(|(id, email)| Principal { role, id, email }))
}

/// Read the currently stored refresh-token digest for a principal.
pub async fn current_refresh_digest(
    pool: &PgPool,
    role: RoleKind,
    id: i64,
) -> Result<Option<String>, AuthError> {
    let row = match role {
        RoleKind::User => {
            sqlx::query_scalar::<_, Option<String>>(
                "SELECT refresh_token_hash FROM users WHERE user_id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
        RoleKind::Admin => {
            sqlx::query_scalar::<_, Option<String>>(
                "SELECT refresh_token_hash FROM admins WHERE admin_id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
    };
    Ok(row.flatten())
}

/// Overwrite the refresh-token slot unconditionally (sign-in). Last write
/// wins; any previously issued refresh token is superseded.
pub async fn store_refresh_digest(
    pool: &PgPool,
    role: RoleKind,
    id: i64,
    digest: &str,
) -> Result<(), AuthError> {
    match role {
        RoleKind::User => {
            sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE user_id = $1")
                .bind(id)
                .bind(digest)
                .execute(pool)
                .await?
        }
        RoleKind::Admin => {
            sqlx::query("UPDATE admins SET refresh_token_hash = $2 WHERE admin_id = $1")
                .bind(id)
                .bind(digest)
                .execute(pool)
                .await?
        }
    };
    Ok(())
}

/// Overwrite the refresh-token slot only if it still holds `current`.
///
/// Single-row compare-and-overwrite: of two refresh calls racing on the same
/// stale token, at most one observes `true`.
pub async fn rotate_refresh_digest(
    pool: &PgPool,
    role: RoleKind,
    id: i64,
    current: &str,
    next: &str,
) -> Result<bool, AuthError> {
    let result = match role {
        RoleKind::User => {
            sqlx::query(
                "UPDATE users SET refresh_token_hash = $3 \
                 WHERE user_id = $1 AND refresh_token_hash = $2",
            )
            .bind(id)
            .bind(current)
            .bind(next)
            .execute(pool)
            .await?
        }
        RoleKind::Admin => {
            sqlx::query(
                "UPDATE admins SET refresh_token_hash = $3 \
                 WHERE admin_id = $1 AND refresh_token_hash = $2",
            )
            .bind(id)
            .bind(current)
            .bind(next)
            .execute(pool)
            .await?
        }
    };
    Ok(result.rows_affected() == 1)
}
