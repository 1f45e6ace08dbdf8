//! Configuration file watcher for policy hot reload.
//!
//! Only the [`HealthPolicy`] is forwarded to the router. Storage and
//! observability settings are fixed at startup; edits to them are reported
//! and otherwise ignored until the process restarts.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{HealthPolicy, RouterConfig};

/// Watches the config file and emits the routing policy whenever it changes.
pub struct ConfigWatcher {
    path: PathBuf,
    /// Configuration the process was started with.
    running: RouterConfig,
    /// Policy most recently handed to the router.
    current_policy: HealthPolicy,
    policy_tx: mpsc::UnboundedSender<HealthPolicy>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, where `running` is the config in effect.
    ///
    /// Returns the watcher and a receiver for policy updates.
    pub fn new(path: &Path, running: RouterConfig) -> (Self, mpsc::UnboundedReceiver<HealthPolicy>) {
        let (policy_tx, policy_rx) = mpsc::unbounded_channel();
        let current_policy = running.policy();

        (
            Self {
                path: path.to_path_buf(),
                running,
                current_policy,
                policy_tx,
            },
            policy_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for updates to keep flowing.
    pub fn run(mut self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    self.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }

    /// Re-read the file and forward its policy if it differs from the current one.
    ///
    /// Returns whether a new policy was sent.
    fn reload(&mut self) -> bool {
        tracing::debug!(path = ?self.path, "Config file change detected, reloading");
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current policy");
                return false;
            }
        };

        self.warn_restart_only(&config);

        let policy = config.policy();
        if policy == self.current_policy {
            tracing::debug!("Routing policy unchanged");
            return false;
        }
        if self.policy_tx.send(policy.clone()).is_err() {
            tracing::debug!("Policy receiver dropped, ignoring update");
            return false;
        }
        tracing::info!(path = ?self.path, "Reloaded routing policy");
        self.current_policy = policy;
        true
    }

    fn warn_restart_only(&self, config: &RouterConfig) {
        if config.storage != self.running.storage {
            tracing::warn!(
                running = ?self.running.storage,
                file = ?config.storage,
                "[storage] changed on disk, restart to apply"
            );
        }
        if config.observability != self.running.observability {
            tracing::warn!(
                running = ?self.running.observability,
                file = ?config.observability,
                "[observability] changed on disk, restart to apply"
            );
        }
    }
}
