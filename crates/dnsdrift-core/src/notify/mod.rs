//! Built-in log-only notifier
//!
//! Writes change reports to the process log. This is the default notifier:
//! a monitor with no outbound channel configured still surfaces drift
//! through its logs and snapshots.

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::error::{Error, Result};
use crate::traits::notifier::{ChangeNotifier, ChangeReport, NotifierFactory};

/// Notifier that logs change reports and always succeeds
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a new log notifier
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChangeNotifier for LogNotifier {
    async fn notify(&self, report: &ChangeReport) -> Result<()> {
        tracing::info!(
            "record changed: {}:{} now {:?}, was {:?}",
            report.fqdn,
            report.record_type,
            report.observed,
            report.baseline
        );
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}

/// Factory for log notifiers
pub struct LogNotifierFactory;

impl NotifierFactory for LogNotifierFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn ChangeNotifier>> {
        match config {
            NotifierConfig::Log => Ok(Box::new(LogNotifier::new())),
            other => Err(Error::config(format!(
                "log notifier factory cannot build '{}' notifier",
                other.type_name()
            ))),
        }
    }
}
