//! Request and decision types exchanged with the tunnel server.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::null_as_default;

/// Meta key carrying the client's shared secret on login.
pub const TOKEN_META: &str = "token";

/// The only tunnel type this plugin grants.
pub const HTTP_PROXY_TYPE: &str = "http";

/// Hook the tunnel server is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Login,
    NewProxy,
    /// Any hook this plugin does not handle.
    Other(String),
}

impl Operation {
    pub fn parse(op: &str) -> Self {
        match op {
            "Login" => Operation::Login,
            "NewProxy" => Operation::NewProxy,
            other => Operation::Other(other.to_string()),
        }
    }

    /// Bounded label for metrics; unknown operations collapse to `other`.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Operation::Login => "Login",
            Operation::NewProxy => "NewProxy",
            Operation::Other(_) => "other",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Login => f.write_str("Login"),
            Operation::NewProxy => f.write_str("NewProxy"),
            Operation::Other(op) => f.write_str(op),
        }
    }
}

/// Envelope of every plugin request body.
///
/// Other top-level fields sent by the tunnel server (`version`, `op`) are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginRequest<T> {
    pub content: T,
}

/// Payload of a `Login` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginContent {
    pub user: String,
    pub privilege_key: String,
    pub run_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metas: BTreeMap<String, String>,
    pub client_address: String,
}

/// Payload of a `NewProxy` call.
///
/// Fields this plugin does not interpret are kept in `extra` and echoed back
/// unchanged when the registration is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NewProxyContent {
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metas: BTreeMap<String, String>,
    pub proxy_name: String,
    pub proxy_type: String,
    pub remote_port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_domains: Vec<String>,
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_pwd: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidUser,
    InvalidPassword,
    InvalidProxy,
    ProxyNotHttp,
}

impl RejectReason {
    /// Text sent back to the tunnel server.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidUser => "invalid user",
            RejectReason::InvalidPassword => "invalid password",
            RejectReason::InvalidProxy => "invalid proxy",
            RejectReason::ProxyNotHttp => "proxy not http",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Let the event through as sent.
    Unchanged,
    /// Let the registration through with the given content instead.
    Rewrite(NewProxyContent),
    /// Deny the event.
    Reject(RejectReason),
}

impl Decision {
    /// Label for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::Unchanged => "unchanged",
            Decision::Rewrite(_) => "rewrite",
            Decision::Reject(_) => "reject",
        }
    }
}

/// The caller broke the plugin protocol. Never a policy decision.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("missing 'op' in URL")]
    MissingOperation,

    #[error("malformed {operation} payload: {source}")]
    MalformedPayload {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::MissingOperation => "missing_op",
            ProtocolError::MalformedPayload { .. } => "malformed_payload",
        }
    }
}
