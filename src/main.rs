use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chargehub::config::AppConfig;
use chargehub::db;
use chargehub::router;
use chargehub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let conn = db::init_db(&config.database_url)?;
    if config.api_token.is_empty() {
        tracing::warn!("API_TOKEN is empty, station routes are unauthenticated");
    }

    let state = Arc::new(AppState::new(conn, config.clone()));
    let app = router::build(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
