use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tautulli_exporter::{
    activity::ActivityClient,
    config::Config,
    metrics::MetricsState,
    poller::PollerService,
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "tautulli-exporter")]
#[command(version)]
#[command(about = "Prometheus exporter for Plex stream activity via the Tautulli API")]
#[command(long_about = None)]
struct Cli {
    /// Log level (overrides the LOG_LEVEL environment variable)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config errors are reported after logging is up, so init with the CLI
    // override or the environment fallback first.
    let log_level = cli
        .log_level
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string())
        .to_lowercase();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tautulli_exporter={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tautulli exporter v{}", env!("CARGO_PKG_VERSION"));

    // Invalid configuration and a failed port bind both exit with status 1.
    let config = Config::from_env().inspect_err(|e| error!("{e}"))?;
    info!(
        tautulli_url = %config.tautulli_url,
        metrics_port = config.metrics_port,
        scrape_interval = config.scrape_interval,
        request_timeout = config.request_timeout,
        probe_when_open = config.probe_when_open,
        "Configuration loaded"
    );

    let metrics = Arc::new(
        MetricsState::new().inspect_err(|e| error!("Failed to initialize metrics registry: {e}"))?,
    );

    let server = WebServer::bind(config.clone(), metrics.clone())
        .await
        .inspect_err(|e| error!("Failed to start metrics server: {e}"))?;
    info!("Metrics server started on port {}", config.metrics_port);
    info!("Health endpoints: /healthz (liveness), /ready (readiness), /metrics");

    let shutdown = CancellationToken::new();

    let poller = PollerService::new(
        ActivityClient::new(&config),
        metrics.clone(),
        config.clone(),
        shutdown.clone(),
    );
    let poller_handle = tokio::spawn(poller.run());

    tokio::spawn(watch_for_shutdown(shutdown.clone()));

    let served = server.serve(shutdown.clone()).await;
    if let Err(e) = &served {
        error!("Metrics server failed: {e}");
        shutdown.cancel();
    }

    // Server stopped accepting connections; wait for the poller to observe
    // the cancellation before exiting.
    let _ = poller_handle.await;
    served?;

    info!("Shutdown complete");
    Ok(())
}

/// Cancel the shared token on SIGINT or SIGTERM
async fn watch_for_shutdown(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install SIGINT handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal");
    shutdown.cancel();
}
