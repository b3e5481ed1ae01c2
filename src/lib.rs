//! Authorization plugin for the frp tunnel server.
//!
//! The tunnel server calls this service on every client login and tunnel
//! registration. Logins are checked against an operator-maintained policy
//! file, and registrations are rewritten so that only the domains and
//! credentials approved in that file are ever granted.

pub mod config;
pub mod decision;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{ConfigStore, PolicySnapshot};
pub use decision::{decide, Decision};
pub use http::WebhookServer;
pub use lifecycle::Shutdown;
