use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;

use super::{Principal, Role, TokenPurpose, jwt::TokenService};
use crate::{
    db::{account_repo, session_repo},
    error::{AppError, AuthError},
    state::AppState,
};

/// Resolves a bearer access token into an authenticated principal.
///
/// Order is fixed: revocation list first, then signature/expiry/purpose, then
/// account lookup. Inactive accounts are rejected here so nothing downstream
/// has to re-check activity. Read-only; safe to call on every request.
pub async fn resolve(
    db: &DatabaseConnection,
    tokens: &TokenService,
    token: &str,
) -> Result<Principal, AppError> {
    if session_repo::is_revoked(db, token).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let email = tokens.validate(token, TokenPurpose::Access)?;

    let account = account_repo::find_by_email(db, &email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !account.active {
        return Err(AuthError::AccountBlocked.into());
    }

    let role = Role::try_from(account.role.as_str()).unwrap_or(Role::Member);
    Ok(Principal {
        account_id: account.id,
        role,
        active: account.active,
        confirmed: account.confirmed,
    })
}

/// Axum middleware wrapping [`resolve`]; stores the principal in request
/// extensions for the `Principal` extractor.
pub async fn session_guard(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::unauthorized("Missing/invalid Authorization header").into_response()
    })?;

    let principal = resolve(&state.db, &state.tokens, token)
        .await
        .map_err(|err| err.into_response())?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

/// Extracts the raw bearer token from request headers; logout and refresh
/// need the token value itself, not just the principal it resolves to.
pub fn bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("Missing/invalid Authorization header"))
}
