//! Authorization decisions.
//!
//! # Responsibilities
//! - Parse the payload for the dispatched operation
//! - Verify a login against the user's shared secret
//! - Replace a tunnel registration's domains and credentials with the
//!   operator-approved route
//! - Pass unknown operations through untouched
//!
//! # Design Decisions
//! - Pure functions over one snapshot; no I/O, nothing blocks
//! - Whatever domains or credentials the client claims are discarded; only
//!   the snapshot's route values are granted

use serde::de::DeserializeOwned;

use crate::config::schema::PolicySnapshot;
use crate::decision::types::{
    Decision, LoginContent, NewProxyContent, Operation, PluginRequest, ProtocolError,
    RejectReason, HTTP_PROXY_TYPE, TOKEN_META,
};

/// Decide on one plugin call against `snapshot`.
///
/// Unknown operations are accepted without looking at the payload.
pub fn decide(
    operation: &Operation,
    payload: &[u8],
    snapshot: &PolicySnapshot,
) -> Result<Decision, ProtocolError> {
    match operation {
        Operation::Login => {
            let request: PluginRequest<LoginContent> = parse_payload("Login", payload)?;
            Ok(decide_login(&request.content, snapshot))
        }
        Operation::NewProxy => {
            let request: PluginRequest<NewProxyContent> = parse_payload("NewProxy", payload)?;
            Ok(decide_new_proxy(request.content, snapshot))
        }
        Operation::Other(op) => {
            tracing::debug!(op = %op, "Passing through unhandled operation");
            Ok(Decision::Unchanged)
        }
    }
}

fn parse_payload<T: DeserializeOwned>(
    operation: &'static str,
    payload: &[u8],
) -> Result<T, ProtocolError> {
    serde_json::from_slice(payload)
        .map_err(|source| ProtocolError::MalformedPayload { operation, source })
}

/// Check a client login.
pub fn decide_login(content: &LoginContent, snapshot: &PolicySnapshot) -> Decision {
    let Some(user) = snapshot.user(&content.user) else {
        tracing::info!(
            user = %content.user,
            client_address = %content.client_address,
            "Login rejected: unknown user"
        );
        return Decision::Reject(RejectReason::InvalidUser);
    };

    let token_matches = content
        .metas
        .get(TOKEN_META)
        .is_some_and(|token| constant_time_eq(token.as_bytes(), user.password.as_bytes()));

    if !token_matches {
        tracing::info!(
            user = %content.user,
            client_address = %content.client_address,
            "Login rejected: wrong secret"
        );
        return Decision::Reject(RejectReason::InvalidPassword);
    }

    tracing::info!(
        user = %content.user,
        run_id = %content.run_id,
        client_address = %content.client_address,
        "Login accepted"
    );
    Decision::Unchanged
}

/// Check a tunnel registration and substitute the approved route.
pub fn decide_new_proxy(content: NewProxyContent, snapshot: &PolicySnapshot) -> Decision {
    let Some(user) = snapshot.user(&content.user) else {
        tracing::info!(user = %content.user, proxy = %content.proxy_name, "NewProxy rejected: unknown user");
        return Decision::Reject(RejectReason::InvalidUser);
    };

    if content.proxy_type != HTTP_PROXY_TYPE {
        tracing::info!(
            user = %content.user,
            proxy = %content.proxy_name,
            proxy_type = %content.proxy_type,
            "NewProxy rejected: unsupported proxy type"
        );
        return Decision::Reject(RejectReason::ProxyNotHttp);
    }

    let Some(route) = user.route(&content.proxy_name) else {
        tracing::warn!(user = %content.user, proxy = %content.proxy_name, "NewProxy rejected: proxy not configured");
        return Decision::Reject(RejectReason::InvalidProxy);
    };

    tracing::info!(
        user = %content.user,
        proxy = %content.proxy_name,
        claimed_domains = ?content.custom_domains,
        granted_domains = ?route.custom_domains,
        "NewProxy accepted"
    );

    Decision::Rewrite(NewProxyContent {
        custom_domains: route.custom_domains.clone(),
        subdomain: String::new(),
        http_user: route.http_user.clone(),
        http_pwd: route.http_password.clone(),
        ..content
    })
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}
