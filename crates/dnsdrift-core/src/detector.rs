//! Change detection
//!
//! Compares a freshly observed value set against a baseline. Both inputs are
//! sorted copies, so the result is independent of answer order; duplicates
//! are NOT removed, so duplicate answers must match in count too.

use std::cmp::Ordering;

use crate::config::NormalizeConfig;

/// Outcome of comparing a baseline against an observation
#[derive(Debug, Clone)]
pub struct Comparison {
    /// Whether the sorted value sets differ
    pub changed: bool,
    /// Three-way result of the sorted comparison (diagnostic only)
    pub ordering: Ordering,
    /// The baseline, sorted
    pub baseline: Vec<String>,
    /// The observation, sorted
    pub observed: Vec<String>,
}

/// Compare a baseline against an observed value set
///
/// Takes ownership of both inputs, sorts them with total lexicographic byte
/// order and compares element-wise, shorter-prefix-first. `changed` is true
/// iff the sorted sequences are not identical.
pub fn compare(mut baseline: Vec<String>, mut observed: Vec<String>) -> Comparison {
    baseline.sort();
    observed.sort();

    let ordering = baseline.cmp(&observed);

    Comparison {
        changed: ordering != Ordering::Equal,
        ordering,
        baseline,
        observed,
    }
}

/// Answer-value string processor
///
/// Applied to every resolved answer value before comparison or storage.
/// Expand mode takes precedence over imprecise matching; case is preserved
/// exactly as received.
#[derive(Debug, Clone)]
pub struct Normalizer {
    expand_tabs: bool,
    tab_width: usize,
    imprecise_match: bool,
}

impl Normalizer {
    /// Build a normalizer from configuration
    pub fn new(config: &NormalizeConfig) -> Self {
        Self {
            expand_tabs: config.expand_tabs,
            tab_width: config.tab_width,
            imprecise_match: config.imprecise_match,
        }
    }

    /// Normalize a single answer value
    pub fn apply(&self, value: &str) -> String {
        if self.expand_tabs {
            return value.replace('\t', &" ".repeat(self.tab_width));
        }

        if self.imprecise_match {
            return value.strip_suffix('.').unwrap_or(value).to_string();
        }

        value.to_string()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizeConfig::default())
    }
}
