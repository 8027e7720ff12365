//! API server configuration.

use chrono::Duration;

use innkeep_core::auth::token::{TokenCodec, resolve_jwt_secret};

/// Access token lifetime when unconfigured: 30 minutes.
const DEFAULT_ACCESS_TTL_SECS: i64 = 30 * 60;

/// Refresh token lifetime when unconfigured: 14 days.
const DEFAULT_REFRESH_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: i64,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                 | Default                                |
    /// |--------------------------|----------------------------------------|
    /// | `BIND_ADDR`              | `127.0.0.1:8080`                       |
    /// | `DATABASE_URL`           | `postgres://localhost:5432/innkeep`    |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file      |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `1800` (30 minutes)                    |
    /// | `REFRESH_TOKEN_TTL_SECS` | `1209600` (14 days)                    |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/innkeep".into()),
            jwt_secret: resolve_jwt_secret(),
            access_token_ttl_secs: env_i64("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl_secs: env_i64("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS),
        }
    }

    /// Build the token codec backed by this configuration.
    pub fn codec(&self) -> TokenCodec {
        TokenCodec::new(
            self.jwt_secret.as_bytes(),
            Duration::seconds(self.access_token_ttl_secs),
            Duration::seconds(self.refresh_token_ttl_secs),
        )
    }
}

fn env_i64(name: &str, default: i64) -> i64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
