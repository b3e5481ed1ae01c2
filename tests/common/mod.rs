//! Shared fixtures for the integration tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use frp_auth_plugin::config::{parse_policy, ConfigStore, SourceFormat};
use frp_auth_plugin::{Shutdown, WebhookServer};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Policy with the `alice` user from the reference scenario.
pub const ALICE_POLICY: &str = r#"{
    "users": [
        {
            "username": "alice",
            "password": "s3cr3t",
            "proxies": [
                {
                    "name": "web1",
                    "custom_domains": ["alice.example.com"],
                    "http_user": "a",
                    "http_password": "p"
                }
            ]
        }
    ]
}"#;

/// Policy where `alice` was replaced by `bob`.
#[allow(dead_code)]
pub const BOB_POLICY: &str = r#"{
    "users": [
        {
            "username": "bob",
            "password": "hunter2",
            "proxies": [{"name": "blog", "custom_domains": ["bob.example.com"]}]
        }
    ]
}"#;

pub fn store_from(policy: &str) -> ConfigStore {
    ConfigStore::new(parse_policy(policy.as_bytes(), SourceFormat::Json).expect("fixture policy must parse"))
}

/// Write `content` to `dir/name` and return the path.
#[allow(dead_code)]
pub fn write_policy(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Rewrite a policy file and move its mtime forward so the change is seen
/// even on filesystems with coarse timestamps.
#[allow(dead_code)]
pub fn rewrite_policy(path: &Path, content: &str, bump: Duration) {
    std::fs::write(path, content).unwrap();
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + bump).unwrap();
}

/// Serve `store` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(store: ConfigStore, shutdown: &Shutdown) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = WebhookServer::new(store);
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    (addr, handle)
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
