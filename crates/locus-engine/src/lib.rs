//! Locus Engine - Registry, query fan-out, and reconcilers
//!
//! The registry is the authoritative map of loaded packages and their
//! lifecycle status. The query service fans a point query out across every
//! ready package. Two reconcilers keep the registry coherent: a debounced
//! filesystem watcher and a rate-limited remote-sync scheduler.

pub mod query;
pub mod registry;
pub mod sync;
pub mod watcher;

pub use query::{PackageResult, QueryDefaults, QueryRequest, QueryResponse, QueryService};
pub use registry::{PackageEntry, Registry, SyncOutcome};
pub use sync::{SyncScheduler, SyncStatus};
pub use watcher::{DebounceBuffer, PendingKind, Watcher, WatcherHandle};
