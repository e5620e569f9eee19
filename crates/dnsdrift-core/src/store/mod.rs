//! Built-in baseline store backends
//!
//! - [`MemoryBaselineStore`]: fast, non-persistent; useful for tests and
//!   deployments where losing the baseline on restart is acceptable
//! - [`FileBaselineStore`]: JSON file with atomic writes and backup recovery

pub mod file;
pub mod memory;

pub use file::{FileBaselineStore, FileStoreFactory};
pub use memory::{MemoryBaselineStore, MemoryStoreFactory};

use crate::config::RecordType;

/// Build the store entry key for a record, with an optional namespace prefix
pub(crate) fn entry_key(prefix: Option<&str>, fqdn: &str, record_type: RecordType) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{fqdn}:{record_type}"),
        None => format!("{fqdn}:{record_type}"),
    }
}
