//! Configuration file watcher for hot-reload support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Delay before re-reading, so editors can finish writing
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches the config file and yields each successfully reloaded config
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Start watching; must be called from within a Tokio runtime
    pub fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let (tx, rx) = mpsc::channel(10);

        // notify callbacks run on their own OS thread, outside the runtime
        let runtime_handle = tokio::runtime::Handle::current();
        let watched_path = config_path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_)) {
                        return;
                    }
                    debug!("Config file modified: {:?}", event.paths);

                    let config_path = watched_path.clone();
                    let tx = tx.clone();

                    runtime_handle.spawn(async move {
                        tokio::time::sleep(DEBOUNCE).await;

                        match AppConfig::load(&config_path).await {
                            Ok(new_config) => {
                                info!("Configuration reloaded");
                                if let Err(e) = tx.send(new_config).await {
                                    error!("Failed to send config update: {}", e);
                                }
                            }
                            Err(e) => {
                                warn!("Failed to reload config (keeping old config): {:#}", e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Watch error: {}", e);
                }
            }
        })?;

        watcher
            .watch(&config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path.display()))?;

        info!("Config file watcher started for: {}", config_path.display());

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next config update
    /// Returns None if the watcher has been closed
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reload_on_modify() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test-config.yaml");

        fs::write(&config_path, "routing:\n  listen_channel: 1\n")?;

        let mut watcher = ConfigWatcher::new(&config_path)?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&config_path, "routing:\n  listen_channel: 7\n")?;

        let new_config =
            tokio::time::timeout(Duration::from_secs(2), watcher.next_config()).await?;

        if let Some(new_config) = new_config {
            assert_eq!(new_config.routing.listen_channel, 7);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_reload_is_skipped() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("test-config.yaml");
        fs::write(&config_path, "tick_ms: 16\n")?;

        let mut watcher = ConfigWatcher::new(&config_path)?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&config_path, "tick_ms: 0\n")?;

        // Nothing valid to deliver
        let next = tokio::time::timeout(Duration::from_millis(500), watcher.next_config()).await;
        assert!(next.is_err());

        Ok(())
    }
}
