//! Policy loading from a configuration source.
//!
//! Parsing runs in two steps: the raw bytes are first read into a generic
//! document (syntax errors), which is then converted into the typed schema
//! (unknown fields, missing fields, wrong types).

use std::io;
use std::time::SystemTime;

use thiserror::Error;

use crate::config::schema::PolicySnapshot;
use crate::config::source::{ConfigSource, SourceFormat};

/// Error type for policy loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The source is missing or unreadable.
    #[error("cannot read config source: {0}")]
    Source(#[from] io::Error),

    /// The source is not syntactically valid.
    #[error("config source is not valid {format}: {message}")]
    Parse {
        format: SourceFormat,
        message: String,
    },

    /// The source parsed but does not match the policy schema.
    #[error("config does not match schema: {0}")]
    Schema(String),
}

/// A parsed snapshot together with the source marker it was read at.
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub snapshot: PolicySnapshot,
    pub modified: SystemTime,
}

/// Read and parse the full policy from `source`.
///
/// The marker is taken before reading so that an edit racing with the read is
/// picked up again on the next poll.
pub fn load_config(source: &dyn ConfigSource) -> Result<LoadedPolicy, ConfigError> {
    let modified = source.modified()?;
    let content = source.read()?;
    let snapshot = parse_policy(&content, source.format())?;

    Ok(LoadedPolicy { snapshot, modified })
}

/// Parse policy bytes written in `format`.
pub fn parse_policy(content: &[u8], format: SourceFormat) -> Result<PolicySnapshot, ConfigError> {
    let parse_error = |message: String| ConfigError::Parse { format, message };

    match format {
        SourceFormat::Json => {
            let document: serde_json::Value =
                serde_json::from_slice(content).map_err(|e| parse_error(e.to_string()))?;
            serde_json::from_value(document).map_err(|e| ConfigError::Schema(e.to_string()))
        }
        SourceFormat::Toml => {
            let text = std::str::from_utf8(content).map_err(|e| parse_error(e.to_string()))?;
            let document: toml::Table =
                toml::from_str(text).map_err(|e| parse_error(e.message().to_string()))?;
            toml::Value::Table(document)
                .try_into()
                .map_err(|e: toml::de::Error| ConfigError::Schema(e.message().to_string()))
        }
    }
}
