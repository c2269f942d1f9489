use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    auth::session::bearer_token,
    error::AppError,
    routes::users::AccountResponse,
    services::{AuthService, auth_service::ConfirmOutcome},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    username: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, serde::Serialize)]
pub struct TokenResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
    expires_in: usize,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", get(refresh))
        .route("/auth/logout", get(logout))
        .route("/auth/confirm/{token}", get(confirm_email))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let service = AuthService::new(&state.db, &state.tokens);
    let account = service
        .register(&body.username, &body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let service = AuthService::new(&state.db, &state.tokens);
    let bundle = service.login(&body.email, &body.password).await?;
    Ok(Json(TokenResponse {
        access_token: bundle.access_token,
        refresh_token: bundle.refresh_token,
        token_type: bundle.token_type,
        expires_in: bundle.expires_in,
    }))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let service = AuthService::new(&state.db, &state.tokens);
    let bundle = service.refresh(token).await?;
    Ok(Json(TokenResponse {
        access_token: bundle.access_token,
        refresh_token: bundle.refresh_token,
        token_type: bundle.token_type,
        expires_in: bundle.expires_in,
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let token = bearer_token(&headers)?;
    let service = AuthService::new(&state.db, &state.tokens);
    service.logout(token).await?;
    Ok(Json(serde_json::json!({ "message": "logout" })))
}

async fn confirm_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = AuthService::new(&state.db, &state.tokens);
    let message = match service.confirm_email(&token).await? {
        ConfirmOutcome::Confirmed => "Email confirmed",
        ConfirmOutcome::AlreadyConfirmed => "Email already confirmed",
    };
    Ok(Json(serde_json::json!({ "message": message })))
}
