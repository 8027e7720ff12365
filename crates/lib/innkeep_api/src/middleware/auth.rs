//! Request authentication — bearer token extraction and principal resolution.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use innkeep_core::auth::resolver;
use innkeep_core::models::auth::Principal;

use crate::AppState;

/// Key used to store the resolved [`Principal`] in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal(pub Principal);

/// Extract the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Axum middleware: decodes a presented bearer token, re-resolves the
/// principal against its role table, and attaches it to request extensions.
///
/// Never rejects — a request without a resolvable token proceeds
/// unauthenticated and downstream handlers decide what that means. The
/// refresh-token slot is not consulted here; access-token use is stateless.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(request.headers()) {
        match resolve_principal(&state, token).await {
            Some(principal) => {
                request
                    .extensions_mut()
                    .insert(AuthenticatedPrincipal(principal));
            }
            None => debug!("bearer token did not resolve to a principal"),
        }
    }
    next.run(request).await
}

async fn resolve_principal(state: &AppState, token: &str) -> Option<Principal> {
    let claims = state.codec.decode(token).ok()?;
    match resolver::resolve_by_role_and_id(&state.pool, claims.role, claims.id).await {
        Ok(principal) => principal,
        Err(e) => {
            debug!(error = %e, "principal lookup failed during authentication");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_token_behind_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer validToken"));
        assert_eq!(bearer_token(&headers), Some("validToken"));
    }

    #[test]
    fn rejects_header_without_bearer_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("validToken"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
