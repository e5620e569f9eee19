//! Baseline resolution and persistence
//!
//! Determines what a freshly resolved record is compared against, preferring
//! the store's remembered values over the statically configured expected
//! values, and handles the rolling write-back of observed values.

use std::collections::HashMap;

use crate::config::RecordConfig;
use crate::state::RecordKey;
use crate::traits::BaselineStore;

/// Resolves the comparison baseline for monitored records
///
/// Fallback order: store entry (if a store is configured and the entry is
/// non-empty) → the definition's `expected_values` → empty. An empty
/// baseline means any non-empty answer is reported as changed.
pub struct BaselineResolver {
    store: Option<Box<dyn BaselineStore>>,
    expected: HashMap<String, Vec<String>>,
}

impl BaselineResolver {
    /// Build a baseline resolver over an optional store and the static
    /// record definitions
    ///
    /// Duplicate definition keys collapse to the last occurrence.
    pub fn new(store: Option<Box<dyn BaselineStore>>, definitions: &[RecordConfig]) -> Self {
        let expected = definitions
            .iter()
            .map(|d| (d.key().composite(), d.expected_values.clone()))
            .collect();

        Self { store, expected }
    }

    /// Whether a store is configured
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Resolve the comparison baseline for a record
    ///
    /// Store read failures are logged and treated as an absent entry, so a
    /// flaky store degrades to static-expected comparison instead of
    /// aborting the record.
    pub async fn resolve(&self, key: &RecordKey) -> Vec<String> {
        if let Some(store) = &self.store {
            match store.get(&key.fqdn, key.record_type).await {
                Ok(values) if !values.is_empty() => return values,
                Ok(_) => {
                    tracing::debug!("no cached baseline for {key}, using expected values");
                }
                Err(e) => {
                    tracing::warn!("baseline store read failed for {key}: {e}");
                }
            }
        }

        self.expected
            .get(&key.composite())
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrite the store entry for a record with the newly observed values
    ///
    /// Called after every successful resolution regardless of the change
    /// outcome: the store always reflects the most recently seen state.
    /// Write failures are logged and never affect the comparison result.
    pub async fn persist(&self, key: &RecordKey, values: &[String]) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.set(&key.fqdn, key.record_type, values).await {
            tracing::warn!(
                "baseline store write failed for {key} ({}): {e}",
                store.backend_name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordType;
    use crate::store::MemoryBaselineStore;

    fn definitions() -> Vec<RecordConfig> {
        vec![
            RecordConfig::new("example.com", RecordType::A)
                .with_expected_values(vec!["1.1.1.1".to_string()]),
            RecordConfig::new("example.com", RecordType::Txt),
        ]
    }

    #[tokio::test]
    async fn no_store_falls_back_to_expected() {
        let baseline = BaselineResolver::new(None, &definitions());
        let key = RecordKey::new("example.com", RecordType::A);

        assert!(!baseline.has_store());
        assert_eq!(baseline.resolve(&key).await, vec!["1.1.1.1"]);
    }

    #[tokio::test]
    async fn no_expected_values_yields_empty_baseline() {
        let baseline = BaselineResolver::new(None, &definitions());
        let key = RecordKey::new("example.com", RecordType::Txt);

        assert!(baseline.resolve(&key).await.is_empty());
    }

    #[tokio::test]
    async fn non_empty_store_entry_wins_over_expected() {
        let store = MemoryBaselineStore::new();
        store
            .set("example.com", RecordType::A, &["9.9.9.9".to_string()])
            .await
            .unwrap();

        let baseline = BaselineResolver::new(Some(Box::new(store)), &definitions());
        let key = RecordKey::new("example.com", RecordType::A);

        assert_eq!(baseline.resolve(&key).await, vec!["9.9.9.9"]);
    }

    #[tokio::test]
    async fn empty_store_entry_falls_through_to_expected() {
        let store = MemoryBaselineStore::new();
        let baseline = BaselineResolver::new(Some(Box::new(store)), &definitions());
        let key = RecordKey::new("example.com", RecordType::A);

        assert_eq!(baseline.resolve(&key).await, vec!["1.1.1.1"]);
    }

    #[tokio::test]
    async fn persist_overwrites_the_store_entry() {
        let store = MemoryBaselineStore::new();
        let shared = store.clone();
        let baseline = BaselineResolver::new(Some(Box::new(store)), &definitions());
        let key = RecordKey::new("example.com", RecordType::A);

        baseline.persist(&key, &["2.2.2.2".to_string()]).await;
        assert_eq!(baseline.resolve(&key).await, vec!["2.2.2.2"]);

        // rolling snapshot: a second persist replaces, never appends
        baseline.persist(&key, &["3.3.3.3".to_string()]).await;
        assert_eq!(
            shared.get("example.com", RecordType::A).await.unwrap(),
            vec!["3.3.3.3"]
        );
    }
}
