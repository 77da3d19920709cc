//! Movie Rating Predictor - Main Entry Point
//!
//! Loads the model bundle, then serves the review shells over HTTP.

use anyhow::{Context, Result};
use movie_rating_predictor::{
    config::{AppConfig, LogFormat, LoggingConfig},
    guard::InputGuard,
    metrics::{MetricsReporter, ServiceMetrics},
    models::BundleLoader,
    service::RatingService,
    shells::{self, AppState},
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Optional config path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from_path(&path)?,
        None => AppConfig::load()?,
    };

    init_logging(&config.logging)?;
    info!("Starting Movie Rating Predictor");
    info!(
        bind = %config.server.bind,
        shells = ?config.server.shells,
        min_tokens = config.guard.min_tokens,
        "Configuration loaded successfully"
    );

    // The bundle must be fully loaded before the first request is served
    let bundle = BundleLoader::with_threads(config.models.onnx_threads)
        .load_bundle(&config.models.bundle_path)
        .context("Cannot serve predictions without a model bundle")?;
    info!(bundle = ?bundle, "Model bundle ready");

    let metrics = Arc::new(ServiceMetrics::new());
    let service = Arc::new(RatingService::new(
        Arc::new(bundle),
        InputGuard::new(config.guard.min_tokens),
        metrics.clone(),
    ));
    let state = AppState::new(service)?;
    let app = shells::router(state, &config.server.shells);

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(address = %config.server.bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("movie_rating_predictor={}", logging.level))?,
    };

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
