use std::net::SocketAddr;
use std::sync::Arc;

use clarity_api::app::app;
use clarity_api::config::AppConfig;
use clarity_api::state::AppState;
use clarity_api::store::MemoryUserStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up JWT_SECRET, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Posture and all security knobs are resolved exactly once, here.
    let config = AppConfig::from_env();
    tracing::info!("Starting Clarity auth service in {:?} posture", config.posture);

    let port = config.server.port;
    let store = Arc::new(MemoryUserStore::new());

    // Fails fast when the signing key is missing under Strict posture.
    let state = AppState::new(config, store)?;
    state.guard.clone().spawn_sweeper();

    let app = app(state).into_make_service_with_connect_info::<SocketAddr>();

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Clarity auth service listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
