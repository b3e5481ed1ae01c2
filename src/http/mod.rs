//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! POST /handler?op=<Op>
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (extract op, request ID)
//!     → decision engine (against the current snapshot)
//!     → response.rs (plugin response JSON, or 400 text)
//!     → Send to tunnel server
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{PluginQuery, X_REQUEST_ID};
pub use response::PluginResponse;
pub use server::{build_router, AppState, WebhookServer, HANDLER_PATH};
