//! # innkeep_api
//!
//! HTTP API library for Innkeep.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use innkeep_core::auth::token::TokenCodec;

use crate::config::ApiConfig;
use crate::handlers::auth;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Token codec built from the configured secret and lifetimes.
    pub codec: TokenCodec,
}

/// Run embedded database migrations.
///
/// Delegates to `innkeep_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    innkeep_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// The authenticate middleware runs on every route; it attaches a principal
/// when a valid bearer token is presented and otherwise lets the request
/// through unauthenticated.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/signUp", post(auth::sign_up_handler))
        .route("/auth/signIn", post(auth::sign_in_handler))
        .route("/auth/reissueToken", post(auth::reissue_token_handler))
        .route("/auth/me", get(auth::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ))
        .layer(cors)
        .with_state(state)
}
