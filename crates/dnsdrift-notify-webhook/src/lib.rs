// # Webhook Change Notifier
//
// This crate provides an HTTP webhook ChangeNotifier for the dnsdrift
// system.
//
// ## Behavior
//
// Each change report is POSTed as a JSON document to the configured
// endpoint. Any transport error or non-2xx response is returned as a
// notifier error; the engine records the failed delivery in the record's
// state and moves on — delivery is at-most-once per detected transition.
//
// ## Payload
//
// ```json
// {
//   "fqdn": "example.com",
//   "record_type": "A",
//   "observed": ["2.2.2.2"],
//   "baseline": ["1.1.1.1"],
//   "detected_at": "2026-08-06T12:00:00Z"
// }
// ```

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use dnsdrift_core::config::NotifierConfig;
use dnsdrift_core::error::{Error, Result};
use dnsdrift_core::registry::ComponentRegistry;
use dnsdrift_core::traits::{ChangeNotifier, ChangeReport, NotifierFactory};

/// Webhook notifier posting change reports as JSON
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a webhook notifier for an endpoint
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl ChangeNotifier for WebhookNotifier {
    async fn notify(&self, report: &ChangeReport) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(report)
            .send()
            .await
            .map_err(|e| Error::notifier(format!("webhook request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::notifier(format!("webhook returned {status}")));
        }

        debug!(
            "delivered change report for {}:{} ({status})",
            report.fqdn, report.record_type
        );
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "webhook"
    }
}

/// Factory for webhook notifiers
pub struct WebhookNotifierFactory;

impl NotifierFactory for WebhookNotifierFactory {
    fn create(&self, config: &NotifierConfig) -> Result<Box<dyn ChangeNotifier>> {
        match config {
            NotifierConfig::Webhook { url, timeout_secs } => Ok(Box::new(WebhookNotifier::new(
                url,
                Duration::from_secs(*timeout_secs),
            ))),
            other => Err(Error::config(format!(
                "webhook notifier factory cannot build '{}' notifier",
                other.type_name()
            ))),
        }
    }
}

/// Register this backend with a component registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_notifier("webhook", Box::new(WebhookNotifierFactory));
}
