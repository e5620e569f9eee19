// # Baseline Store Trait
//
// Defines the interface for the persistent baseline cache.
//
// ## Purpose
//
// The store remembers the most recently observed value set per record so
// that a restarted monitor compares against what it last saw instead of the
// static expected values. It is a rolling snapshot, not a change-history
// log: the engine unconditionally overwrites each entry after every
// successful resolution.
//
// ## Implementations
//
// - In-memory: [`crate::store::MemoryBaselineStore`]
// - File-backed: [`crate::store::FileBaselineStore`]
//
// ## Semantics
//
// `set` has delete-then-insert semantics: a concurrent external reader may
// transiently observe an empty key during a swap. This is acceptable because
// the monitor is the single writer. If the store is shared by multiple
// monitor instances, last-writer-wins.

use async_trait::async_trait;

use crate::config::RecordType;
use crate::error::Result;

/// Trait for baseline store implementations
///
/// Implementations must be thread-safe and usable across async tasks.
/// Store failures are non-fatal to the engine: a failed `get` falls back to
/// expected values, and a failed `set` is logged without affecting the
/// comparison result already computed.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// Get the remembered value set for a record
    ///
    /// Returns an empty vector when the record has no entry.
    async fn get(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<String>>;

    /// Replace the remembered value set for a record
    async fn set(&self, fqdn: &str, record_type: RecordType, values: &[String]) -> Result<()>;

    /// Get the backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}

/// Helper trait for constructing baseline stores from configuration
pub trait StoreFactory: Send + Sync {
    /// Create a store instance from configuration
    fn create(&self, config: &crate::config::StoreConfig) -> Result<Box<dyn BaselineStore>>;
}
