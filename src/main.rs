use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use tablero::api_router::create_app;
use tablero::config::AppConfig;
use tablero::shared::state::{build_notifier, build_store, AppState};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received, stopping server");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load()?;
    let store = build_store(&config.store)?;
    let notifier = build_notifier(&config.mail);
    let addr = config.server_addr();
    let state = Arc::new(AppState::new(config, store, notifier));

    let app = create_app(state);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {addr}: {e} - is another instance running?");
            return Err(e.into());
        }
    };
    info!("HTTP server listening on {addr}");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
