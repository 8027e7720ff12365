//! Authentication service — registration, sign-in, and refresh rotation
//! delegating to `innkeep_core::auth`.

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;

use innkeep_core::auth::token::TokenCodec;
use innkeep_core::auth::{AuthError, password, queries, resolver};
use innkeep_core::models::auth::{RoleKind, TokenKind};

use crate::dto::{SignInResponse, TokenResponse};

/// SHA-256 hash a refresh token for storage in the per-principal slot.
fn digest_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Register a new principal: one account row plus exactly one role row.
///
/// The existence pre-check keeps the common duplicate case cheap; the unique
/// index on the email closes the race between two concurrent registrations.
pub async fn register(
    pool: &PgPool,
    email: &str,
    password_plain: &str,
    nickname: &str,
    is_admin: bool,
) -> Result<(), AuthError> {
    if queries::email_exists(pool, email).await? {
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = password::hash_password(password_plain)?;
    let role = if is_admin {
        RoleKind::Admin
    } else {
        RoleKind::User
    };
    let principal_id =
        queries::create_account_with_role(pool, email, &password_hash, nickname, role).await?;

    info!(%role, principal_id, "registered new principal");
    Ok(())
}

/// Authenticate with email + password and issue an access/refresh pair.
///
/// Unknown email and wrong password return the same error kind; callers can
/// never tell which it was.
pub async fn sign_in(
    pool: &PgPool,
    codec: &TokenCodec,
    email: &str,
    password_plain: &str,
) -> Result<SignInResponse, AuthError> {
    let account = queries::find_account_by_email(pool, email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password(password_plain, &account.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    let principal = resolver::resolve_by_email(pool, &account.email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let now = Utc::now();
    let access_token = codec.issue(TokenKind::Access, principal.role, principal.id, now)?;
    let refresh_token = codec.issue(TokenKind::Refresh, principal.role, principal.id, now)?;

    // Last storage mutation of this call: the previous refresh token, if any,
    // is superseded before the new one reaches the client.
    resolver::store_refresh_digest(
        pool,
        principal.role,
        principal.id,
        &digest_refresh_token(&refresh_token),
    )
    .await?;

    info!(role = %principal.role, id = principal.id, "signed in, issued token pair");
    Ok(SignInResponse {
        access_token,
        refresh_token,
        role_kind: principal.role,
    })
}

/// Exchange a refresh token for a new access/refresh pair (single-use rotation).
///
/// Signature validity alone only proves the token was issued here and is
/// unexpired; the stored-digest comparison is what proves it is the *current*
/// token for the principal. A rotated-out token fails that comparison even
/// though its signature still verifies.
pub async fn refresh(
    pool: &PgPool,
    codec: &TokenCodec,
    old_refresh_token: &str,
) -> Result<TokenResponse, AuthError> {
    if !codec.validate(old_refresh_token) {
        return Err(AuthError::InvalidToken);
    }

    let id: i64 = codec
        .claim(old_refresh_token, "id")
        .ok_or(AuthError::InvalidToken)?;
    let role: RoleKind = codec
        .claim(old_refresh_token, "role")
        .ok_or(AuthError::InvalidToken)?;

    let now = Utc::now();
    let access_token = codec.issue(TokenKind::Access, role, id, now)?;
    let refresh_token = codec.issue(TokenKind::Refresh, role, id, now)?;

    // Compare-and-overwrite: of two calls racing on the same stale token, at
    // most one lands this update.
    let rotated = resolver::rotate_refresh_digest(
        pool,
        role,
        id,
        &digest_refresh_token(old_refresh_token),
        &digest_refresh_token(&refresh_token),
    )
    .await?;

    if !rotated {
        return match resolver::resolve_by_role_and_id(pool, role, id).await? {
            None => Err(AuthError::PrincipalNotFound),
            Some(_) => Err(AuthError::InvalidToken),
        };
    }

    info!(%role, id, "rotated refresh token");
    Ok(TokenResponse {
        access_token,
        refresh_token,
    })
}
