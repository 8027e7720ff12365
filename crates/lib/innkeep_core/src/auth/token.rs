//! Signed token issuance and verification (HS256 JWTs).

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use super::AuthError;
use crate::models::auth::{RoleKind, TokenClaims, TokenKind};

/// Why a token failed to decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed token")]
    Malformed,
}

/// Encodes and decodes signed, expiring tokens carrying the token kind, the
/// role, and the principal id.
///
/// Access and refresh lifetimes are injected, not hardcoded; they come from
/// server configuration.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Mint a signed token of the given kind for `(role, principal_id)`.
    pub fn issue(
        &self,
        kind: TokenKind,
        role: RoleKind,
        principal_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let jti: String = rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let claims = TokenClaims {
            sub: kind,
            role,
            id: principal_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Parse and verify a token, returning its claims.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::ImmatureSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }

    /// True only if the signature verifies and the token is unexpired. Any
    /// other condition is `false`, never an error.
    pub fn validate(&self, token: &str) -> bool {
        self.decode(token).is_ok()
    }

    /// Extract a single named claim with an expected type. Absence or a type
    /// mismatch yields `None`, as does any decode failure.
    pub fn claim<T: DeserializeOwned>(&self, token: &str, name: &str) -> Option<T> {
        let claims = decode::<serde_json::Value>(token, &self.decoding_key, &Self::validation())
            .ok()?
            .claims;
        let value = claims.get(name)?;
        serde_json::from_value(value.clone()).ok()
    }

    fn validation() -> Validation {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    // Generate and persist
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("innkeep")
        .join("jwt-secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"testSecretKeyWithAtLeast32Characters";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(30), Duration::days(14))
    }

    #[test]
    fn issues_a_valid_access_token() {
        let codec = codec();
        let token = codec
            .issue(TokenKind::Access, RoleKind::User, 1, Utc::now())
            .expect("issue");

        assert!(codec.validate(&token));
        assert_eq!(codec.claim::<i64>(&token, "id"), Some(1));
        assert_eq!(codec.claim::<RoleKind>(&token, "role"), Some(RoleKind::User));
        assert_eq!(
            codec.claim::<TokenKind>(&token, "sub"),
            Some(TokenKind::Access)
        );
    }

    #[test]
    fn refresh_token_outlives_access_token() {
        let codec = codec();
        let now = Utc::now();
        let access = codec
            .issue(TokenKind::Access, RoleKind::User, 1, now)
            .expect("issue");
        let refresh = codec
            .issue(TokenKind::Refresh, RoleKind::User, 1, now)
            .expect("issue");

        let access_exp = codec.decode(&access).expect("decode").exp;
        let refresh_exp = codec.decode(&refresh).expect("decode").exp;
        assert!(refresh_exp > access_exp);
    }

    #[test]
    fn expired_token_fails_validation() {
        let codec = codec();
        let issued_at = Utc::now() - Duration::hours(1);
        let token = codec
            .issue(TokenKind::Access, RoleKind::User, 1, issued_at)
            .expect("issue");

        assert!(!codec.validate(&token));
        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_signed_with_another_key_fails_validation() {
        let codec = codec();
        let other = TokenCodec::new(
            b"anEntirelyDifferentSigningSecretValue",
            Duration::minutes(30),
            Duration::days(14),
        );
        let token = other
            .issue(TokenKind::Access, RoleKind::User, 1, Utc::now())
            .expect("issue");

        assert!(!codec.validate(&token));
        assert_eq!(codec.decode(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let codec = codec();
        assert!(!codec.validate("not-a-token"));
        assert_eq!(codec.decode("not-a-token"), Err(TokenError::Malformed));
    }

    #[test]
    fn missing_claim_yields_none() {
        let codec = codec();
        let token = codec
            .issue(TokenKind::Access, RoleKind::User, 1, Utc::now())
            .expect("issue");

        assert_eq!(codec.claim::<String>(&token, "nonExistentClaim"), None);
    }

    #[test]
    fn mistyped_claim_yields_none() {
        let codec = codec();
        let token = codec
            .issue(TokenKind::Access, RoleKind::Admin, 7, Utc::now())
            .expect("issue");

        // "role" is a string claim, not a number.
        assert_eq!(codec.claim::<i64>(&token, "role"), None);
    }

    #[test]
    fn tokens_minted_at_the_same_instant_differ() {
        let codec = codec();
        let now = Utc::now();
        let first = codec
            .issue(TokenKind::Refresh, RoleKind::User, 1, now)
            .expect("issue");
        let second = codec
            .issue(TokenKind::Refresh, RoleKind::User, 1, now)
            .expect("issue");
        assert_ne!(first, second);
    }

    #[test]
    fn claims_survive_the_round_trip() {
        let codec = codec();
        let now = Utc::now();
        let token = codec
            .issue(TokenKind::Refresh, RoleKind::Admin, 42, now)
            .expect("issue");

        let claims = codec.decode(&token).expect("decode");
        assert_eq!(claims.sub, TokenKind::Refresh);
        assert_eq!(claims.role, RoleKind::Admin);
        assert_eq!(claims.id, 42);
        assert_eq!(claims.iat, now.timestamp());
    }
}
