use anyhow::Context as _;

use crate::app::app;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::state::AppState;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database).await?;
    let result = serve(config, database.clone()).await;
    database.close().await;

    result?;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn serve(config: AppConfig, database: DatabaseManager) -> anyhow::Result<()> {
    database.migrate().await?;

    let bind_addr = config.bind_addr();
    let state = AppState::new(config, database)?;
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("batnovels listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
