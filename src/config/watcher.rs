//! Periodic policy reload.
//!
//! The reloader polls the source's modification marker on a fixed interval
//! and publishes a fresh snapshot when it changes. A source that fails to load
//! is logged and skipped; the store keeps serving the last good snapshot.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::loader::{load_config, ConfigError, LoadedPolicy};
use crate::config::schema::PolicySnapshot;
use crate::config::source::ConfigSource;
use crate::config::store::ConfigStore;
use crate::observability::metrics;

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Marker unchanged since the last successful load.
    Unchanged,
    /// A new snapshot was published.
    Reloaded,
    /// The source changed but could not be loaded; the old snapshot stays.
    Failed,
}

/// Background task keeping a [`ConfigStore`] in sync with its source.
pub struct ConfigReloader {
    store: ConfigStore,
    source: Arc<dyn ConfigSource>,
    interval: Duration,
    last_modified: SystemTime,
}

impl ConfigReloader {
    /// Create a reloader for a store whose current snapshot was read from
    /// `source` at marker `last_modified`.
    pub fn new(
        store: ConfigStore,
        source: Arc<dyn ConfigSource>,
        interval: Duration,
        last_modified: SystemTime,
    ) -> Self {
        Self {
            store,
            source,
            interval,
            last_modified,
        }
    }

    /// Run the reloader on the current runtime until `shutdown` fires.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            source = ?self.source,
            interval_secs = self.interval.as_secs_f64(),
            "Config reloader starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Config reloader received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Check the source once and publish a new snapshot if it changed.
    pub async fn poll_once(&mut self) -> ReloadOutcome {
        let source = Arc::clone(&self.source);
        let last_modified = self.last_modified;
        let probe =
            tokio::task::spawn_blocking(move || probe_source(source.as_ref(), last_modified)).await;

        match probe {
            Ok(Ok(None)) => ReloadOutcome::Unchanged,
            Ok(Ok(Some(loaded))) => {
                tracing::info!(
                    users = loaded.snapshot.users.len(),
                    routes = loaded.snapshot.route_count(),
                    config = %audit_view(&loaded.snapshot),
                    "New config loaded"
                );
                self.last_modified = loaded.modified;
                self.store.publish(loaded.snapshot);
                metrics::record_reload("success");
                ReloadOutcome::Reloaded
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
                metrics::record_reload("failure");
                ReloadOutcome::Failed
            }
            Err(e) => {
                tracing::error!(error = %e, "Config reload task failed");
                metrics::record_reload("failure");
                ReloadOutcome::Failed
            }
        }
    }
}

fn probe_source(
    source: &dyn ConfigSource,
    last_modified: SystemTime,
) -> Result<Option<LoadedPolicy>, ConfigError> {
    if source.modified()? == last_modified {
        return Ok(None);
    }
    load_config(source).map(Some)
}

/// Snapshot rendered for the audit log, secrets masked.
fn audit_view(snapshot: &PolicySnapshot) -> serde_json::Value {
    let users: Vec<serde_json::Value> = snapshot
        .users
        .iter()
        .map(|user| {
            let proxies: Vec<serde_json::Value> = user
                .proxies
                .iter()
                .map(|route| {
                    serde_json::json!({
                        "name": route.name,
                        "custom_domains": route.custom_domains,
                        "http_user": route.http_user,
                        "http_password": route.http_password.as_ref().map(|_| "***"),
                    })
                })
                .collect();
            serde_json::json!({
                "username": user.username,
                "password": "***",
                "proxies": proxies,
            })
        })
        .collect();

    serde_json::json!({ "users": users })
}
