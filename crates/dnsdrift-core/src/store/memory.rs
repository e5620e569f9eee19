// # Memory Baseline Store
//
// In-memory implementation of BaselineStore.
//
// ## Purpose
//
// Provides a simple, fast baseline store that doesn't persist across
// restarts. Useful for testing, or for deployments where the first cycle
// after a restart comparing against static expected values is acceptable.
//
// ## Crash Behavior
//
// - All remembered baselines are lost on restart/crash
// - The first cycle after a restart compares against expected values

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::{RecordType, StoreConfig};
use crate::error::{Error, Result};
use crate::traits::store::{BaselineStore, StoreFactory};

/// In-memory baseline store implementation
///
/// All state lives in a HashMap behind a RwLock. Cloning shares the
/// underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBaselineStore {
    inner: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl MemoryBaselineStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of entries in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Clear all entries from the store
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl BaselineStore for MemoryBaselineStore {
    async fn get(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<String>> {
        let guard = self.inner.read().await;
        Ok(guard
            .get(&super::entry_key(None, fqdn, record_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, fqdn: &str, record_type: RecordType, values: &[String]) -> Result<()> {
        let key = super::entry_key(None, fqdn, record_type);
        let mut guard = self.inner.write().await;
        // delete-then-insert, mirroring the shared-store contract
        guard.remove(&key);
        guard.insert(key, values.to_vec());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for memory baseline stores
pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn BaselineStore>> {
        match config {
            StoreConfig::Memory => Ok(Box::new(MemoryBaselineStore::new())),
            other => Err(Error::config(format!(
                "memory store factory cannot build '{}' store",
                other.type_name()
            ))),
        }
    }
}
