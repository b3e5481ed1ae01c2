//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Read args/env → Load policy → Start reloader → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop reloader → Drain requests → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a policy that does not load at startup is fatal
//! - Listener binds last (traffic only once a policy is in place)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
