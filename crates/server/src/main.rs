use anyhow::Context;
use db::DbService;
use server::{AppState, http};
use services::services::auth::AuthService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://calldesk.db?mode=rwc".to_string());
    let jwt_secret = std::env::var("CALLDESK_JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("CALLDESK_JWT_SECRET not set, using a development secret");
        "calldesk-dev-secret".to_string()
    });
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8000);

    let db = DbService::connect(&database_url)
        .await
        .context("failed to connect to database")?;
    let state = AppState::new(db, AuthService::new(&jwt_secret));
    let app = http::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        return;
    }
    tracing::info!("shutdown signal received");
}
