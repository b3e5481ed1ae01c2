//! Request decoding.
//!
//! # Responsibilities
//! - Extract the operation from the `op` query parameter
//! - Tag every request with an `x-request-id` for tracing
//!
//! # Design Decisions
//! - An empty `op` counts as missing
//! - A repeated `op` resolves to its first value
//! - The body is taken as raw bytes; the decision engine parses it for the
//!   dispatched operation only

use axum::http::HeaderName;

use crate::decision::{Operation, ProtocolError};

/// Header carrying the request ID.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Query string of a plugin call.
#[derive(Debug, Clone, Default)]
pub struct PluginQuery {
    pub op: Option<String>,
}

impl PluginQuery {
    /// Build from decoded `key=value` pairs, keeping the first `op`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let op = pairs.into_iter().find(|(key, _)| key == "op").map(|(_, value)| value);
        Self { op }
    }

    /// The operation the tunnel server is calling.
    pub fn operation(&self) -> Result<Operation, ProtocolError> {
        match self.op.as_deref() {
            Some(op) if !op.is_empty() => Ok(Operation::parse(op)),
            _ => Err(ProtocolError::MissingOperation),
        }
    }
}
