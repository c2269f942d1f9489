use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod photos;
pub mod public;
pub mod users;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(public::router())
        .merge(auth::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(photos::router(state))
}
