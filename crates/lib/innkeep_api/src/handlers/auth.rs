//! Authentication request handlers.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;

use crate::AppState;
use crate::dto::{
    MeResponse, RegisterRequest, SignInRequest, SignInResponse, TokenRequest, TokenResponse,
};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedPrincipal;
use crate::services::auth;

/// `POST /auth/signUp` — create an account plus its role row.
pub async fn sign_up_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<StatusCode> {
    auth::register(
        &state.pool,
        &body.email,
        &body.password,
        &body.nickname,
        body.is_admin,
    )
    .await?;
    Ok(StatusCode::CREATED)
}

/// `POST /auth/signIn` — authenticate with email + password.
pub async fn sign_in_handler(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let resp = auth::sign_in(&state.pool, &state.codec, &body.email, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /auth/reissueToken` — exchange a refresh token for a new token pair.
pub async fn reissue_token_handler(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh(&state.pool, &state.codec, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `GET /auth/me` — the authenticated principal's email and authorities.
///
/// The authenticate middleware never rejects; this handler is where a missing
/// principal becomes a 401.
pub async fn me_handler(request: Request) -> AppResult<Json<MeResponse>> {
    let AuthenticatedPrincipal(principal) = request
        .extensions()
        .get::<AuthenticatedPrincipal>()
        .ok_or_else(|| AppError::Unauthorized("not authenticated".into()))?;

    Ok(Json(MeResponse {
        email: principal.email.clone(),
        authorities: principal
            .authorities()
            .iter()
            .map(|a| a.to_string())
            .collect(),
    }))
}
