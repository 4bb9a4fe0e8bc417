//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and the optional metrics exporter
//! - Start background tasks (config watcher, signal listener)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)
//! - Draining is bounded; the process exits after `DRAIN_DEADLINE`

use std::net::{AddrParseError, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::util::TryInitError;

use crate::config::{load_config, watcher, ConfigError, ConfigWatcher, GatewayConfig};
use crate::http::HttpServer;
use crate::lifecycle::{Shutdown, Signal, SignalListener};
use crate::observability::{logging, metrics};
use crate::routing::RouteError;

const DRAIN_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// TOML configuration file. Without one the gateway starts with
    /// defaults and an empty route table.
    pub config_path: Option<PathBuf>,
    /// Reload routes when the configuration file changes.
    pub watch: bool,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] TryInitError),

    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),

    #[error("failed to watch configuration: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Configuration to start with.
pub fn initial_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(GatewayConfig::default()),
    }
}

fn parse_addr(address: &str) -> Result<SocketAddr, StartupError> {
    address.parse().map_err(|source| StartupError::Address {
        address: address.to_string(),
        source,
    })
}

/// Run the gateway until a shutdown signal arrives.
pub async fn run(options: StartupOptions) -> Result<(), StartupError> {
    let config = initial_config(options.config_path.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?options.config_path,
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "gateway-router starting"
    );
    if config.routes.is_empty() {
        tracing::warn!("No routes configured, every request will receive 404");
    }

    if config.observability.metrics_enabled {
        metrics::init_metrics(parse_addr(&config.observability.metrics_address)?)?;
    }

    let server = HttpServer::new(config.clone())?;
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();

    // Dropping the watcher handle stops the watch, so it lives until return.
    let _watcher = match (&options.config_path, options.watch) {
        (Some(path), true) => Some(ConfigWatcher::new(path, updates_tx.clone()).run()?),
        (None, true) => {
            tracing::warn!("--watch ignored, no configuration file given");
            None
        }
        _ => None,
    };

    let mut signals = SignalListener::new().map_err(StartupError::Signals)?;
    let signal_shutdown = shutdown.clone();
    let reload_path = options.config_path.clone();
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            match signal {
                Signal::Shutdown => {
                    signal_shutdown.trigger();
                    break;
                }
                Signal::Reload => match &reload_path {
                    Some(path) => {
                        if let Err(e) = watcher::reload(path, &updates_tx) {
                            tracing::error!(error = %e, "Reload failed, keeping current routes");
                        }
                    }
                    None => tracing::info!("Reload requested but no configuration file is in use"),
                },
            }
        }
    });

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let mut deadline = shutdown.subscribe();
    let serve = server.run(listener, updates_rx, shutdown.subscribe());
    tokio::select! {
        result = serve => result.map_err(StartupError::Serve)?,
        _ = async {
            let _ = deadline.recv().await;
            tokio::time::sleep(DRAIN_DEADLINE).await;
        } => {
            tracing::warn!(deadline_secs = DRAIN_DEADLINE.as_secs(), "Drain deadline exceeded, exiting");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_config_defaults_without_file() {
        let config = initial_config(None).unwrap();
        assert!(config.routes.is_empty());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_initial_config_propagates_load_errors() {
        let err = initial_config(Some(Path::new("/missing/gateway.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_addr_reports_input() {
        assert!(parse_addr("127.0.0.1:9090").is_ok());
        let err = parse_addr("nope").unwrap_err();
        assert!(err.to_string().contains("\"nope\""));
    }
}
