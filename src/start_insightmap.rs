//! Startup helpers for the insightmap server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::core::errors::BoxError;
use crate::server::{self, AppState};

/// Install the global tracing subscriber (INFO unless `RUST_LOG` says otherwise).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the server (used by the `insightmap-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting insightmap v{}", env!("CARGO_PKG_VERSION"));

    let (config, state) = match initialize() {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!("Failed to initialize: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let served = rt.block_on(server::serve(state, &config.server, shutdown_signal()));
    if let Err(e) = served {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Read configuration from the environment and build application state
/// without starting the server.
///
/// # Errors
/// Returns an error if configuration or state creation fails.
pub fn initialize() -> Result<(AppConfig, Arc<AppState>), BoxError> {
    let config = AppConfig::from_env().map_err(|e| format!("Invalid configuration: {e}"))?;
    tracing::info!(
        backend = ?config.backend,
        chunk_size = config.summarizer.chunk_size,
        overlap = config.summarizer.overlap_size,
        ratio = config.summarizer.target_ratio,
        proofread_chunk_size = config.proofread.chunk_size,
        mindmap_attempts = config.mindmap.max_attempts,
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );
    if config.transcript.api_key.is_none() {
        tracing::info!("No Data API key set, video details come from oEmbed");
    }
    if let Some(url) = &config.llm.base_url {
        tracing::info!("Ollama endpoint: {url}");
    }

    let state = AppState::from_config(&config)?;
    Ok((config, state))
}

/// Resolves when Ctrl+C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
