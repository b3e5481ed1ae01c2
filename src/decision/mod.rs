//! Authorization decision subsystem.
//!
//! # Data Flow
//! ```text
//! op query parameter + JSON body
//!     → types.rs (Operation, payload shapes)
//!     → engine.rs (lookup user → verify secret / route)
//!     → Decision (unchanged | rewrite | reject)
//! ```
//!
//! # Design Decisions
//! - Decisions are made against exactly one snapshot per request
//! - Policy rejections are normal outcomes, not errors
//! - Protocol violations are errors and never become policy decisions
//! - Unknown operations pass through for forward compatibility

pub mod engine;
pub mod types;

pub use engine::{decide, decide_login, decide_new_proxy};
pub use types::{
    Decision, LoginContent, NewProxyContent, Operation, PluginRequest, ProtocolError, RejectReason,
};
