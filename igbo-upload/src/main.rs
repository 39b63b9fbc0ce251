//! igbo-upload - Igbo TTS dataset uploader
//!
//! Serves the upload form and appends each submitted clip and transcript to
//! a dataset repository on the Hugging Face Hub.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use igbo_common::config::{StoreKind, TomlConfig};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use igbo_upload::audio::Normalizer;
use igbo_upload::config::{resolve_hub_token, resolve_log_level, Cli, UploaderConfig};
use igbo_upload::store::{DatasetStore, HubCredentials, HubDatasetStore, MemoryDatasetStore};
use igbo_upload::workflow::{DatasetAppender, SubmissionWorkflow};
use igbo_upload::AppState;

const MODULE_NAME: &str = "igbo-upload";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let toml_config = TomlConfig::load_for_module(MODULE_NAME, cli.config.as_deref())
        .context("Failed to load config file")?;

    // RUST_LOG wins over the configured level
    let log_level = resolve_log_level(&cli, &toml_config);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("igbo_upload={0},igbo_common={0},tower_http=info", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{} ({}, built {}, {})",
        MODULE_NAME,
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = UploaderConfig::resolve(&cli, &toml_config)?;
    info!(
        dataset_id = %config.dataset_id,
        store = ?config.store,
        fetch_failure = ?config.fetch_failure,
        max_publish_attempts = config.max_publish_attempts,
        "Configuration resolved"
    );

    let store = build_store(&config, &toml_config).await?;

    let mut normalizer = Normalizer::new(config.target_sample_rate);
    if let Ok(dir) = std::env::var("IGBO_TEMP_DIR") {
        normalizer = normalizer.with_temp_dir(dir);
    }
    let appender = DatasetAppender::new(
        store,
        config.dataset_id.clone(),
        config.fetch_failure,
        config.max_publish_attempts,
    );
    let state = AppState::new(
        SubmissionWorkflow::new(normalizer, appender),
        config.max_upload_bytes,
    );
    let app = igbo_upload::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Select the dataset store; a Hub token that fails validation stops startup
async fn build_store(
    config: &UploaderConfig,
    toml_config: &TomlConfig,
) -> Result<Arc<dyn DatasetStore>> {
    match config.store {
        StoreKind::Memory => {
            warn!("Using in-memory dataset store; submissions are lost on exit");
            Ok(Arc::new(MemoryDatasetStore::new()))
        }
        StoreKind::Hub => {
            let token = resolve_hub_token(toml_config)?;
            let credentials = HubCredentials::new(token)?;
            let store = HubDatasetStore::new(&config.hub_endpoint, credentials)?;
            let identity = store
                .whoami()
                .await
                .context("Hub token validation failed")?;
            info!(user = %identity.name, endpoint = %config.hub_endpoint, "Authenticated with Hub");
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
