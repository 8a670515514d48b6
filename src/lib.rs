pub mod config;
pub mod draft;
pub mod model;
pub mod observability;
pub mod orchestrator;
pub mod pricing;
pub mod prompt;
pub mod provider;
pub mod server;

use anyhow::Context;
use config::AppConfig;
use draft::{DraftService, DraftSettings};
use pricing::PRICING_TABLE_VERSION;
use provider::{GeminiAdapter, GenerativeProvider};
use server::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Wires the provider, drafting service and router, then serves until Ctrl-C.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    config.validate()?;

    let api_key = config.gemini_api_key.clone().unwrap_or_default();
    let provider: Arc<dyn GenerativeProvider> =
        Arc::new(GeminiAdapter::with_base_url(api_key, &config.gemini_base_url));

    let settings = DraftSettings::from_config(&config);
    tracing::info!(
        "Config: default_model={}, language={:?}, retry={:?}, pricing_table={}",
        settings.default_model,
        settings.language,
        settings.retry_policy,
        PRICING_TABLE_VERSION
    );

    let state = AppState {
        drafts: Arc::new(DraftService::new(provider, settings)),
    };
    let router = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
