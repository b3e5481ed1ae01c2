//! Policy configuration subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → source.rs (read bytes, report modification time)
//!     → loader.rs (parse, strict schema)
//!     → PolicySnapshot (immutable)
//!     → store.rs (published via ArcSwap)
//!
//! Every poll interval:
//!     watcher.rs stats the source
//!     → marker unchanged: nothing to do
//!     → marker changed: loader.rs loads new snapshot
//!     → ok: atomic swap in store.rs
//!     → error: logged, old snapshot keeps serving
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable; a change always means a full reload
//! - Unknown fields anywhere in the file fail the load
//! - Stale-but-valid beats crashing on a half-edited file

pub mod loader;
pub mod schema;
pub mod source;
pub mod store;
pub mod watcher;

pub use loader::{load_config, parse_policy, ConfigError, LoadedPolicy};
pub use schema::{PolicySnapshot, Route, User};
pub use source::{ConfigSource, FileSource, SourceFormat};
pub use store::ConfigStore;
pub use watcher::{ConfigReloader, ReloadOutcome};
