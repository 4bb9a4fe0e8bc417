//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::GatewayConfig;

/// Load `path` and hand the result to the server.
///
/// On failure the current configuration stays in effect; the error is
/// returned for the caller to log.
pub fn reload(path: &Path, updates: &mpsc::UnboundedSender<GatewayConfig>) -> Result<(), ConfigError> {
    let config = load_config(path)?;
    tracing::info!(path = %path.display(), routes = config.routes.len(), "Configuration reloaded");
    // The receiver only disappears while the server is shutting down.
    let _ = updates.send(config);
    Ok(())
}

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, updates: mpsc::UnboundedSender<GatewayConfig>) -> Self {
        Self {
            path: path.to_path_buf(),
            updates,
        }
    }

    /// Start watching. The returned handle must be kept alive; dropping it
    /// stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let updates = self.updates;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::debug!(kind = ?event.kind, "Config file change detected");
                    if let Err(e) = reload(&path, &updates) {
                        tracing::error!(error = %e, "Failed to reload config, keeping current routes");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_sends_valid_config() {
        let path = std::env::temp_dir().join(format!("gateway-reload-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[[routes]]\nid = \"r\"\nuri = \"http://backend\"\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        reload(&path, &tx).unwrap();
        let config = rx.try_recv().unwrap();
        assert_eq!(config.routes[0].id.as_deref(), Some("r"));

        std::fs::write(&path, "[[routes]]\nuri = \"/path/only\"\n").unwrap();
        assert!(reload(&path, &tx).is_err());
        assert!(rx.try_recv().is_err());

        let _ = std::fs::remove_file(&path);
    }
}
