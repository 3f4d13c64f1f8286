use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookrec_webhook::{
    config::Config,
    routes::{create_router, AppState},
    services::rating_store::RatingStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // The service cannot answer anything without its datasets
    let store = RatingStore::load(&config.books_path, &config.ratings_path, config.thresholds())
        .context("Failed to initialize rating store")?;

    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(store, config));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
