use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use retro_core::token::{Claims, TokenSigner};

use crate::error::AppError;

/// Paths reachable without a token.
const PUBLIC_PATHS: &[&str] = &["/api/health"];

/// Axum middleware that requires a valid signed token on every `/api/*`
/// request except [`PUBLIC_PATHS`].
///
/// The token is read from (in order):
/// 1. `Authorization: Bearer <token>`
/// 2. `?token=<token>` (browsers cannot set headers on WebSocket upgrades)
///
/// On success the verified [`retro_core::token::Claims`] are inserted into
/// the request extensions for handlers to extract.
pub async fn auth_middleware(
    State(signer): State<Arc<TokenSigner>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") || PUBLIC_PATHS.contains(&path) {
        return next.run(req).await;
    }

    let token = bearer_token(&req).or_else(|| req.uri().query().and_then(extract_token_param));
    let Some(token) = token.map(str::to_string) else {
        return unauthorized("missing token");
    };

    match signer.verify(&token) {
        Ok(claims) => {
            tracing::debug!(sub = %claims.sub, purpose = ?claims.purpose, "token accepted");
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "token rejected");
            unauthorized(&e.to_string())
        }
    }
}

/// Route layer for operator endpoints: only access tokens pass.
///
/// Must sit inside [`auth_middleware`], which supplies the claims.
pub async fn require_admin(req: Request, next: Next) -> Response {
    let Some(claims) = req.extensions().get::<Claims>() else {
        return unauthorized("missing token");
    };
    if !claims.is_admin() {
        tracing::debug!(sub = %claims.sub, path = %req.uri().path(), "member token on admin route");
        return AppError::forbidden("access token required").into_response();
    }
    next.run(req).await
}

/// Route layer for `{team_id}` endpoints: member tokens only reach the team
/// named in their claims.
pub async fn require_team_scope(Path(team_id): Path<String>, req: Request, next: Next) -> Response {
    let Some(claims) = req.extensions().get::<Claims>() else {
        return unauthorized("missing token");
    };
    if !claims.can_access_team(&team_id) {
        tracing::debug!(sub = %claims.sub, %team_id, "token scoped to another team");
        return AppError::forbidden("token does not belong to this team").into_response();
    }
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn extract_token_param(query: &str) -> Option<&str> {
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("token="))
        .filter(|t| !t.is_empty())
}

fn unauthorized(reason: &str) -> Response {
    let body = serde_json::json!({ "error": format!("unauthorized: {reason}") });
    Response::builder()
        .status(401)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("infallible: all header values are valid ASCII")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
