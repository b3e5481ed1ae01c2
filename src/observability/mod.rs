//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (decision, protocol error and reload counters)
//!
//! Consumers:
//!     → stdout (fmt layer, filter from RUST_LOG)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Secrets never appear in log fields
//! - Metric labels are bounded; unknown operations share one label

pub mod logging;
pub mod metrics;
