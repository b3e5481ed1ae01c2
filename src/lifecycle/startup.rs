//! Startup orchestration.
//!
//! # Responsibilities
//! - Read the command line and environment into [`Settings`]
//! - Load the policy; a policy that does not load is fatal
//! - Start the config reloader and the optional metrics endpoint
//! - Bind the listener and serve until shutdown
//!
//! # Exit codes
//! - `2`: usage or environment error
//! - `1`: policy failed to load, or the server could not start
//! - `0`: graceful shutdown

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, ConfigReloader, ConfigSource, ConfigStore, FileSource};
use crate::http::WebhookServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Listen address, e.g. `127.0.0.1:7000` or `:7000`.
pub const LISTEN_ADDR_ENV: &str = "FRP_AUTH_PLUGIN_LISTEN_ADDR";
/// Seconds between checks of the policy file.
pub const POLL_SECS_ENV: &str = "FRP_AUTH_PLUGIN_POLL_SECS";
/// Address of the Prometheus scrape endpoint; unset disables it.
pub const METRICS_ADDR_ENV: &str = "FRP_AUTH_PLUGIN_METRICS_ADDR";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "frp-auth-plugin")]
#[command(about = "Authorization plugin for the frp tunnel server", long_about = None)]
pub struct Args {
    /// Policy file (JSON, or TOML with a .toml extension)
    pub config: PathBuf,
}

/// Everything the process needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub listen_addr: String,
    pub poll_interval: Duration,
    pub metrics_addr: Option<SocketAddr>,
}

impl Settings {
    /// Combine the parsed arguments with the process environment.
    pub fn from_env(args: Args) -> Result<Self, StartupError> {
        Self::from_lookup(args, |name| std::env::var(name).ok())
    }

    /// Combine the parsed arguments with variables from `lookup`.
    pub fn from_lookup(
        args: Args,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StartupError> {
        let listen_addr = lookup(LISTEN_ADDR_ENV)
            .filter(|v| !v.is_empty())
            .ok_or(StartupError::MissingListenAddr)?;
        // Accept the Go-style ":port" shorthand for all interfaces.
        let listen_addr = match listen_addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => listen_addr,
        };

        let poll_interval = match lookup(POLL_SECS_ENV).filter(|v| !v.is_empty()) {
            None => DEFAULT_POLL_INTERVAL,
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(StartupError::InvalidEnv { name: POLL_SECS_ENV, value }),
            },
        };

        let metrics_addr = match lookup(METRICS_ADDR_ENV).filter(|v| !v.is_empty()) {
            None => None,
            Some(value) => match value.parse() {
                Ok(addr) => Some(addr),
                Err(_) => return Err(StartupError::InvalidEnv { name: METRICS_ADDR_ENV, value }),
            },
        };

        Ok(Self {
            config_path: args.config,
            listen_addr,
            poll_interval,
            metrics_addr,
        })
    }
}

/// Errors that stop the process.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("FRP_AUTH_PLUGIN_LISTEN_ADDR is not set")]
    MissingListenAddr,

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("error reading config file: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot start metrics endpoint: {0}")]
    Metrics(#[from] BuildError),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

impl StartupError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::MissingListenAddr | StartupError::InvalidEnv { .. } => 2,
            _ => 1,
        }
    }
}

/// Load the policy, start background tasks and serve until a termination
/// signal arrives.
pub async fn run(settings: Settings) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    serve(settings, shutdown).await
}

/// Like [`run`], but stops when `shutdown` is triggered by the caller.
pub async fn serve(settings: Settings, shutdown: Shutdown) -> Result<(), StartupError> {
    // Subscribe before the first await so a signal during startup is not lost.
    let reloader_shutdown = shutdown.subscribe();
    let server_shutdown = shutdown.subscribe();

    let source: Arc<dyn ConfigSource> = Arc::new(FileSource::new(&settings.config_path));
    let loaded = load_config(source.as_ref())?;

    tracing::info!(
        path = %settings.config_path.display(),
        users = loaded.snapshot.users.len(),
        routes = loaded.snapshot.route_count(),
        "Configuration loaded"
    );

    if let Some(addr) = settings.metrics_addr {
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&settings.listen_addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: settings.listen_addr.clone(),
            source,
        })?;

    let store = ConfigStore::new(loaded.snapshot);
    let reloader = ConfigReloader::new(
        store.clone(),
        source,
        settings.poll_interval,
        loaded.modified,
    )
    .spawn(reloader_shutdown);

    let server = WebhookServer::new(store);
    let result = server.run(listener, server_shutdown).await;

    // Server may also stop on its own error; make sure the reloader follows.
    shutdown.trigger();
    if let Err(e) = reloader.await {
        tracing::error!(error = %e, "Config reloader task failed");
    }

    result.map_err(StartupError::Serve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(env: &[(&str, &str)]) -> Result<Settings, StartupError> {
        let env: HashMap<String, String> =
            env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let args = Args { config: PathBuf::from("/etc/frp/users.json") };
        Settings::from_lookup(args, |name| env.get(name).cloned())
    }

    #[test]
    fn test_args_require_config_path() {
        assert!(Args::try_parse_from(["frp-auth-plugin"]).is_err());
        assert!(Args::try_parse_from(["frp-auth-plugin", "a.json", "b.json"]).is_err());
        let args = Args::try_parse_from(["frp-auth-plugin", "users.json"]).unwrap();
        assert_eq!(args.config, PathBuf::from("users.json"));
    }

    #[test]
    fn test_missing_listen_addr_is_usage_error() {
        let err = settings(&[]).unwrap_err();
        assert!(matches!(err, StartupError::MissingListenAddr));
        assert_eq!(err.exit_code(), 2);

        let err = settings(&[(LISTEN_ADDR_ENV, "")]).unwrap_err();
        assert!(matches!(err, StartupError::MissingListenAddr));
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[(LISTEN_ADDR_ENV, "127.0.0.1:7000")]).unwrap();
        assert_eq!(s.listen_addr, "127.0.0.1:7000");
        assert_eq!(s.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(s.metrics_addr, None);
        assert_eq!(s.config_path, PathBuf::from("/etc/frp/users.json"));
    }

    #[test]
    fn test_port_only_listen_addr() {
        let s = settings(&[(LISTEN_ADDR_ENV, ":7000")]).unwrap();
        assert_eq!(s.listen_addr, "0.0.0.0:7000");
    }

    #[test]
    fn test_optional_env() {
        let s = settings(&[
            (LISTEN_ADDR_ENV, ":7000"),
            (POLL_SECS_ENV, "5"),
            (METRICS_ADDR_ENV, "127.0.0.1:9100"),
        ])
        .unwrap();
        assert_eq!(s.poll_interval, Duration::from_secs(5));
        assert_eq!(s.metrics_addr, Some("127.0.0.1:9100".parse().unwrap()));
    }

    #[test]
    fn test_invalid_optional_env() {
        for (name, value) in [(POLL_SECS_ENV, "0"), (POLL_SECS_ENV, "soon"), (METRICS_ADDR_ENV, "nowhere")] {
            let err = settings(&[(LISTEN_ADDR_ENV, ":7000"), (name, value)]).unwrap_err();
            assert!(matches!(err, StartupError::InvalidEnv { .. }), "{name}={value}");
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[tokio::test]
    async fn test_missing_config_is_fatal() {
        let mut s = settings(&[(LISTEN_ADDR_ENV, "127.0.0.1:0")]).unwrap();
        s.config_path = PathBuf::from("/nonexistent/frp-auth/users.json");
        let err = serve(s, Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, StartupError::Config(ConfigError::Source(_))));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_serve_stops_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"users": [{"username": "alice", "password": "s3cr3t"}]}"#).unwrap();

        let mut s = settings(&[(LISTEN_ADDR_ENV, "127.0.0.1:0")]).unwrap();
        s.config_path = path;

        let shutdown = Shutdown::new();
        shutdown.trigger();

        let result = tokio::time::timeout(Duration::from_secs(5), serve(s, shutdown))
            .await
            .expect("serve ignored a shutdown sent during startup");
        assert!(result.is_ok());
    }
}
