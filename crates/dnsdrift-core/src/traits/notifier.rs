// # Change Notifier Trait
//
// Defines the interface for delivering change reports.
//
// ## Implementations
//
// - Webhook: `dnsdrift-notify-webhook` crate
// - Log-only: [`crate::notify::LogNotifier`]
//
// ## Trust boundary
//
// Notifiers are untrusted collaborators. A failed delivery is returned as an
// error, recorded in the record's `notified` flag and logged; it must never
// panic or abort the evaluation cycle, and the engine performs no redelivery
// within the cycle. Because the baseline is overwritten before notification,
// a missed delivery is not re-attempted unless the record changes again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RecordType;
use crate::error::Result;

/// A detected record change, as handed to notifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Record name
    pub fqdn: String,
    /// Record type
    pub record_type: RecordType,
    /// Values observed this cycle (normalized, sorted)
    pub observed: Vec<String>,
    /// Baseline the observation was compared against (sorted)
    pub baseline: Vec<String>,
    /// When the change was detected
    pub detected_at: chrono::DateTime<chrono::Utc>,
}

impl ChangeReport {
    /// Create a report stamped with the current time
    pub fn new(
        fqdn: impl Into<String>,
        record_type: RecordType,
        observed: Vec<String>,
        baseline: Vec<String>,
    ) -> Self {
        Self {
            fqdn: fqdn.into(),
            record_type,
            observed,
            baseline,
            detected_at: chrono::Utc::now(),
        }
    }
}

/// Trait for notifier implementations
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Attempt to deliver a change report
    async fn notify(&self, report: &ChangeReport) -> Result<()>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}

/// Helper trait for constructing notifiers from configuration
pub trait NotifierFactory: Send + Sync {
    /// Create a notifier instance from configuration
    fn create(&self, config: &crate::config::NotifierConfig) -> Result<Box<dyn ChangeNotifier>>;
}
