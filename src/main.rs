use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use tower_http::trace::TraceLayer;

use photoshare::{
    config::AppConfig,
    db,
    logging::init_tracing,
    routes::router,
    services::AuthService,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // tracing may not be initialized yet if config loading failed
        eprintln!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env()?;
    init_tracing(&cfg.log_level);

    let db = db::connect(&cfg).await?;

    let state = AppState::new(cfg, db);
    AuthService::new(&state.db, &state.tokens)
        .seed_admin(&state.config)
        .await?;

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port).parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
