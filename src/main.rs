// Entry point of the confessions API server.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the HTTP router

use confessions::config::{AppConfig, StorageBackend};
use confessions::core::confessions::{CommentStore, ConfessionService, ConfessionStore};
use confessions::core::moderation::{Classifier, ModerationPipeline};
use confessions::http;
use confessions::infra::storage::{InMemoryConfessionStore, SqliteConfessionStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================

    let classifier = config.build_classifier()?;
    let pipeline = ModerationPipeline::new(config.moderation.clone(), classifier);

    match config.storage {
        StorageBackend::Sqlite => {
            tracing::info!(database_url = %config.database_url, "Using SQLite storage");
            let store = SqliteConfessionStore::new(&config.database_url).await?;
            serve(&config, store, pipeline).await
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; confessions are lost on restart");
            serve(&config, InMemoryConfessionStore::new(), pipeline).await
        }
    }
}

async fn serve<S, C>(
    config: &AppConfig,
    store: S,
    pipeline: ModerationPipeline<C>,
) -> anyhow::Result<()>
where
    S: ConfessionStore + CommentStore + 'static,
    C: Classifier + 'static,
{
    let service = ConfessionService::new(store, pipeline)
        .with_comment_moderation(config.moderate_comments);
    let app = http::router(Arc::new(service));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Confessions API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
