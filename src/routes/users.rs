use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, patch},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::{
        Principal, Role,
        authorize::RequireRoleLayer,
        session::session_guard,
    },
    db::{account_repo, entities::account},
    error::{AppError, AuthError},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub confirmed: bool,
    pub created_at: DateTimeWithTimeZone,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            active: model.active,
            confirmed: model.confirmed,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub active: Option<bool>,
    pub role: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let me = Router::new()
        .route("/users/me", get(my_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_guard))
        .with_state(state.clone());

    // Account mutation (ban, role change) is a strict role check: ownership
    // never grants it.
    let admin = Router::new()
        .route("/users/{username}", patch(update_account))
        .layer(RequireRoleLayer::new(&[Role::Admin]))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_guard))
        .with_state(state);

    me.merge(admin)
}

async fn my_profile(
    State(state): State<Arc<AppState>>,
    principal: Principal,
) -> Result<Json<AccountResponse>, AppError> {
    let account = account_repo::find_by_id(&state.db, &principal.account_id)
        .await?
        .ok_or(AuthError::NotFound("Account"))?;
    Ok(Json(account.into()))
}

async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = account_repo::find_by_username(&state.db, &username)
        .await?
        .ok_or(AuthError::NotFound("Account"))?;

    if body.active.is_none() && body.role.is_none() {
        return Err(AppError::bad_request("Active or role required"));
    }

    // Validate everything before mutating anything.
    let role = body
        .role
        .as_deref()
        .map(|r| Role::try_from(r).map_err(|_| AppError::bad_request("Unknown parameter")))
        .transpose()?;

    if let Some(active) = body.active {
        account_repo::set_active(&state.db, &account.id, active).await?;
    }
    if let Some(role) = role {
        account_repo::set_role(&state.db, &account.id, role.as_str()).await?;
    }

    let updated = account_repo::find_by_id(&state.db, &account.id)
        .await?
        .ok_or(AuthError::NotFound("Account"))?;
    Ok(Json(updated.into()))
}
