//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the plugin handler
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Load the current snapshot once per request and hand it to the
//!   decision engine
//! - Serve until the shutdown signal fires, draining in-flight requests

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ConfigStore;
use crate::decision::{decide, ProtocolError};
use crate::http::request::{PluginQuery, X_REQUEST_ID};
use crate::http::response::PluginResponse;
use crate::observability::metrics;

/// Path the tunnel server posts plugin calls to.
pub const HANDLER_PATH: &str = "/handler";

/// Largest request body accepted.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Upper bound on a single request, body read included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: ConfigStore,
}

/// HTTP server for the plugin endpoint.
pub struct WebhookServer {
    router: Router,
}

impl WebhookServer {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            router: build_router(AppState { store }),
        }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, path = HANDLER_PATH, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(HANDLER_PATH, post(plugin_handler))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid))
}

/// Decode the call, decide against the current snapshot, encode the result.
async fn plugin_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Json<PluginResponse>, ProtocolError> {
    let operation = PluginQuery::from_pairs(pairs).operation().inspect_err(|e| {
        tracing::warn!(error = %e, "Rejecting plugin call");
        metrics::record_protocol_error(e.kind());
    })?;

    let snapshot = state.store.current();
    let decision = decide(&operation, &body, &snapshot).inspect_err(|e| {
        tracing::warn!(op = %operation, error = %e, "Bad JSON in request");
        metrics::record_protocol_error(e.kind());
    })?;

    tracing::debug!(op = %operation, outcome = decision.outcome(), "Decision made");
    metrics::record_decision(operation.metric_label(), decision.outcome());

    Ok(Json(PluginResponse::from(decision)))
}
