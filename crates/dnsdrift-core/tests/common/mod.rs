//! Test doubles and common utilities for architecture contract tests
//!
//! Minimal doubles that verify the engine's contracts without any real
//! network, storage or delivery. Clones share interior state, so tests can
//! keep a handle after handing a box to the engine.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dnsdrift_core::config::{
    MonitorConfig, NormalizeConfig, NotifierConfig, RecordConfig, RecordType, ResolverConfig,
    StoreConfig,
};
use dnsdrift_core::error::{Error, Result};
use dnsdrift_core::store::MemoryBaselineStore;
use dnsdrift_core::traits::{
    BaselineStore, ChangeNotifier, ChangeReport, RecordResolver, ResolveOptions,
};

/// A resolver that replays scripted responses per record
///
/// Responses are consumed in order per `(fqdn, type)` key; when a key's
/// queue is empty the default response is used. Tracks call counts and the
/// maximum number of concurrent resolutions ever observed.
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    responses: Arc<Mutex<HashMap<String, VecDeque<std::result::Result<Vec<String>, String>>>>>,
    default_response: Arc<Mutex<Option<std::result::Result<Vec<String>, String>>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response for a record
    pub async fn enqueue(
        &self,
        fqdn: &str,
        record_type: RecordType,
        response: std::result::Result<Vec<String>, String>,
    ) {
        self.responses
            .lock()
            .await
            .entry(format!("{fqdn}:{record_type}"))
            .or_default()
            .push_back(response);
    }

    /// Set the response used when a record's queue is empty
    pub async fn set_default(&self, response: std::result::Result<Vec<String>, String>) {
        *self.default_response.lock().await = Some(response);
    }

    /// Delay every resolution by the given duration
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Total number of resolve() calls
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of resolutions ever running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordResolver for ScriptedResolver {
    async fn resolve(
        &self,
        fqdn: &str,
        record_type: RecordType,
        _options: &ResolveOptions,
    ) -> Result<Vec<String>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .responses
            .lock()
            .await
            .get_mut(&format!("{fqdn}:{record_type}"))
            .and_then(|queue| queue.pop_front());

        let response = match scripted {
            Some(response) => response,
            None => self
                .default_response
                .lock()
                .await
                .clone()
                .unwrap_or_else(|| Err("no scripted response".to_string())),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response.map_err(Error::resolver)
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// A notifier that records every report and can be told to fail
#[derive(Clone, Default)]
pub struct MockNotifier {
    reports: Arc<Mutex<Vec<ChangeReport>>>,
    fail: Arc<AtomicBool>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent delivery fail
    pub fn fail_deliveries(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Reports that were successfully delivered
    pub async fn reports(&self) -> Vec<ChangeReport> {
        self.reports.lock().await.clone()
    }

    pub async fn report_count(&self) -> usize {
        self.reports.lock().await.len()
    }
}

#[async_trait]
impl ChangeNotifier for MockNotifier {
    async fn notify(&self, report: &ChangeReport) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::notifier("delivery refused"));
        }

        self.reports.lock().await.push(report.clone());
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "mock"
    }
}

/// A baseline store whose reads/writes can be made to fail, backed by the
/// real memory store otherwise
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryBaselineStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    write_count: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Seed an entry directly, bypassing failure injection
    pub async fn seed(&self, fqdn: &str, record_type: RecordType, values: &[String]) {
        self.inner.set(fqdn, record_type, values).await.unwrap();
    }

    /// Read an entry directly, bypassing failure injection
    pub async fn read(&self, fqdn: &str, record_type: RecordType) -> Vec<String> {
        self.inner.get(fqdn, record_type).await.unwrap()
    }
}

#[async_trait]
impl BaselineStore for FlakyStore {
    async fn get(&self, fqdn: &str, record_type: RecordType) -> Result<Vec<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::store("injected read failure"));
        }
        self.inner.get(fqdn, record_type).await
    }

    async fn set(&self, fqdn: &str, record_type: RecordType, values: &[String]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::store("injected write failure"));
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.inner.set(fqdn, record_type, values).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// Helper to create a minimal MonitorConfig for testing
///
/// The resolver/notifier/store sections are placeholders: tests inject mock
/// components directly, so only the records, engine and normalize sections
/// matter.
pub fn minimal_config(records: Vec<RecordConfig>) -> MonitorConfig {
    MonitorConfig {
        resolver: ResolverConfig::Hickory {
            primary: "127.0.0.1:53".to_string(),
            secondary: None,
        },
        notifier: NotifierConfig::Log,
        store: StoreConfig::Disabled,
        records,
        engine: dnsdrift_core::config::EngineConfig::default(),
        normalize: NormalizeConfig::default(),
    }
}

/// Convenience for building owned string vectors
pub fn values(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
