use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};

use crate::{config::AppConfig, state::AppState};

/// Builds an `AppState` backed by a fresh in-memory SQLite database with the
/// schema synced from the entity registry. Each call is fully isolated.
pub async fn test_state(secret: &[u8]) -> Arc<AppState> {
    let mut cfg = AppConfig::from_env().expect("load app config");
    cfg.jwt_secret = String::from_utf8_lossy(secret).into_owned();

    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    // A single pooled connection keeps the in-memory database alive for the
    // lifetime of the state.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect to sqlite");
    db.get_schema_registry("photoshare::db::entities::*")
        .sync(&db)
        .await
        .expect("sync schema");

    AppState::new(cfg, db)
}
