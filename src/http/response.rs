//! Response encoding.
//!
//! # Responsibilities
//! - Encode a [`Decision`] in the tunnel server's plugin response shape
//! - Map protocol violations to plain-text 400 responses
//!
//! # Design Decisions
//! - Bad-request bodies are generic; parse details stay in the server log

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::decision::{Decision, NewProxyContent, ProtocolError};

/// Body returned to the tunnel server for every handled call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResponse {
    pub reject: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unchange: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<NewProxyContent>,
}

impl From<Decision> for PluginResponse {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Unchanged => Self {
                reject: false,
                reject_reason: None,
                unchange: Some(true),
                content: None,
            },
            Decision::Rewrite(content) => Self {
                reject: false,
                reject_reason: None,
                unchange: Some(false),
                content: Some(content),
            },
            Decision::Reject(reason) => Self {
                reject: true,
                reject_reason: Some(reason.as_str().to_string()),
                unchange: None,
                content: None,
            },
        }
    }
}

impl IntoResponse for ProtocolError {
    fn into_response(self) -> Response {
        let message = match self {
            ProtocolError::MissingOperation => "Missing 'op' in URL",
            ProtocolError::MalformedPayload { .. } => "Bad JSON",
        };
        (StatusCode::BAD_REQUEST, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::RejectReason;
    use serde_json::json;

    #[test]
    fn test_unchanged_shape() {
        let body = serde_json::to_value(PluginResponse::from(Decision::Unchanged)).unwrap();
        assert_eq!(body, json!({"reject": false, "unchange": true}));
    }

    #[test]
    fn test_reject_shape() {
        let body =
            serde_json::to_value(PluginResponse::from(Decision::Reject(RejectReason::InvalidUser)))
                .unwrap();
        assert_eq!(body, json!({"reject": true, "reject_reason": "invalid user"}));
    }

    #[test]
    fn test_rewrite_shape() {
        let content = NewProxyContent {
            user: "alice".into(),
            proxy_name: "web1".into(),
            proxy_type: "http".into(),
            custom_domains: vec!["alice.example.com".into()],
            ..Default::default()
        };
        let body = serde_json::to_value(PluginResponse::from(Decision::Rewrite(content))).unwrap();
        assert_eq!(body["reject"], json!(false));
        assert_eq!(body["unchange"], json!(false));
        assert_eq!(body["content"]["custom_domains"], json!(["alice.example.com"]));
        assert_eq!(body["content"]["proxy_name"], json!("web1"));
    }

    #[test]
    fn test_protocol_errors_are_bad_requests() {
        let response = ProtocolError::MissingOperation.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let source = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let response = ProtocolError::MalformedPayload { operation: "Login", source }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
