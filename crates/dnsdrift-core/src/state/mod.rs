//! Record state table
//!
//! In-memory state of every monitored record. The table is built once per
//! configuration load, holds exactly one entry per monitored record
//! definition, and is mutated exclusively by the evaluation cycle in two
//! phases: a reset at cycle start and a single result (or error) commit per
//! record.
//!
//! Entries live in a fixed vector sorted by composite key and are mutated in
//! place through a key → index map, so snapshot consumers always see the
//! same deterministic ordering. All operations take a short interior lock;
//! no lock is ever held across an await point.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::config::{RecordConfig, RecordType};

/// Identity of a monitored record: name plus type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// Record name
    pub fqdn: String,
    /// Record type
    pub record_type: RecordType,
}

impl RecordKey {
    /// Create a new record key
    pub fn new(fqdn: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            fqdn: fqdn.into(),
            record_type,
        }
    }

    /// Stable composite form, used for store keys and snapshot ordering
    pub fn composite(&self) -> String {
        format!("{}:{}", self.fqdn, self.record_type)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.fqdn, self.record_type)
    }
}

/// Latest observed state of a monitored record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordState {
    /// Record name
    pub fqdn: String,
    /// Record type
    pub record_type: RecordType,
    /// Values observed in the last successful cycle (sorted)
    pub current_values: Vec<String>,
    /// Baseline used in the last successful cycle (sorted)
    pub prior_values: Vec<String>,
    /// Whether the last cycle detected a change
    pub changed: bool,
    /// Whether the change notification was delivered
    pub notified: bool,
    /// Whether the last resolution attempt failed
    pub errored: bool,
    /// Whether this record is mid-cycle
    pub processing: bool,
}

impl RecordState {
    fn new(key: &RecordKey) -> Self {
        Self {
            fqdn: key.fqdn.clone(),
            record_type: key.record_type,
            current_values: Vec::new(),
            prior_values: Vec::new(),
            changed: false,
            notified: false,
            errored: false,
            processing: false,
        }
    }

    /// The identity key of this state entry
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.fqdn.clone(), self.record_type)
    }
}

/// Result of a completed record evaluation, as committed to the table
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    /// Values observed this cycle (sorted)
    pub current_values: Vec<String>,
    /// Baseline the observation was compared against (sorted)
    pub prior_values: Vec<String>,
    /// Whether a change was detected
    pub changed: bool,
    /// Whether the change notification was delivered
    pub notified: bool,
}

/// Table of record states, one entry per monitored record definition
///
/// Single logical writer (the evaluation cycle); snapshot consumers read
/// point-in-time copies at any time. The interior lock guards every
/// operation so a snapshot can never observe a torn entry.
#[derive(Debug, Default)]
pub struct RecordTable {
    inner: RwLock<TableInner>,
}

#[derive(Debug, Default)]
struct TableInner {
    /// Entries sorted by composite key
    entries: Vec<RecordState>,
    /// Composite key → index into `entries`
    index: HashMap<String, usize>,
}

impl RecordTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table from record definitions, discarding any prior state
    ///
    /// Used at startup and on configuration reload only. Duplicate keys in
    /// the definition list collapse to a single entry.
    pub fn initialize(&self, definitions: &[RecordConfig]) {
        // BTreeMap gives the deterministic composite-key ordering for free
        let mut ordered = BTreeMap::new();
        for definition in definitions {
            let key = definition.key();
            ordered.insert(key.composite(), RecordState::new(&key));
        }

        let entries: Vec<RecordState> = ordered.into_values().collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, state)| (state.key().composite(), i))
            .collect();

        let mut inner = self.inner.write().expect("record table lock poisoned");
        inner.entries = entries;
        inner.index = index;
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.inner.read().expect("record table lock poisoned").entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset a record for a new cycle
    ///
    /// Marks the record as processing and clears the per-cycle result flags;
    /// the previous cycle's values are kept so consumers can keep showing
    /// them while the cycle runs.
    pub fn begin_cycle(&self, key: &RecordKey) {
        let mut inner = self.inner.write().expect("record table lock poisoned");
        let Some(state) = lookup_mut(&mut inner, key) else {
            tracing::warn!("begin_cycle for unknown record {key}");
            return;
        };

        state.processing = true;
        state.notified = false;
        state.errored = false;
        state.changed = false;
    }

    /// Commit the result of a completed record evaluation
    pub fn commit_result(&self, key: &RecordKey, outcome: CycleOutcome) {
        let mut inner = self.inner.write().expect("record table lock poisoned");
        let Some(state) = lookup_mut(&mut inner, key) else {
            tracing::warn!("commit_result for unknown record {key}");
            return;
        };

        state.current_values = outcome.current_values;
        state.prior_values = outcome.prior_values;
        state.changed = outcome.changed;
        state.notified = outcome.notified;
        state.errored = false;
        state.processing = false;
    }

    /// Commit a failed resolution attempt
    ///
    /// Only the error and processing flags change; values from the last
    /// successful cycle are preserved so they can still be shown.
    pub fn commit_error(&self, key: &RecordKey) {
        let mut inner = self.inner.write().expect("record table lock poisoned");
        let Some(state) = lookup_mut(&mut inner, key) else {
            tracing::warn!("commit_error for unknown record {key}");
            return;
        };

        state.errored = true;
        state.processing = false;
    }

    /// Point-in-time copy of every record state, sorted by composite key
    pub fn snapshot(&self) -> Vec<RecordState> {
        self.inner
            .read()
            .expect("record table lock poisoned")
            .entries
            .clone()
    }
}

fn lookup_mut<'a>(inner: &'a mut TableInner, key: &RecordKey) -> Option<&'a mut RecordState> {
    let index = *inner.index.get(&key.composite())?;
    inner.entries.get_mut(index)
}
