//! Core monitoring engine
//!
//! The MonitorEngine is responsible for:
//! - Resolving every monitored record once per evaluation cycle
//! - Comparing each answer against its baseline (store or expected values)
//! - Writing observed values back to the baseline store
//! - Notifying on detected changes
//! - Publishing record state for snapshot consumers
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐   evaluation tick    ┌────────────────┐
//! │ Cycle Scheduler│─────────────────────▶│ Evaluation     │
//! │ (two timers)   │   refresh tick       │ Cycle          │
//! └────────────────┘──────────┐           └────────────────┘
//!                             │                    │
//!                             ▼          ┌─────────┼──────────┬──────────┐
//!                      ┌────────────┐    ▼         ▼          ▼          ▼
//!                      │ EngineEvent│ ┌────────┐ ┌────────┐ ┌───────┐ ┌────────┐
//!                      │ channel    │ │Resolver│ │Baseline│ │ Store │ │Notifier│
//!                      └────────────┘ └────────┘ └────────┘ └───────┘ └────────┘
//!                                                     │
//!                                                     ▼
//!                                              ┌─────────────┐
//!                                              │ RecordTable │──▶ snapshot()
//!                                              └─────────────┘
//! ```
//!
//! ## Scheduling discipline
//!
//! The evaluation cycle is awaited inline in the scheduler loop, so a new
//! cycle can never start while the previous one is running (single-flight by
//! construction). Evaluation ticks that fall due during a long cycle are
//! delayed, not dropped or parallelized. The refresh tick is independent and
//! only signals "re-read the record table now"; it performs no I/O.
//!
//! One unconditional cycle runs at startup, before the first scheduled tick,
//! to populate initial state. Shutdown is cooperative: a signal stops future
//! ticks but never interrupts a cycle in progress.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::baseline::BaselineResolver;
use crate::config::{MonitorConfig, RecordConfig, RecordType};
use crate::detector::{self, Normalizer};
use crate::error::Result;
use crate::state::{CycleOutcome, RecordTable};
use crate::traits::{BaselineStore, ChangeNotifier, ChangeReport, RecordResolver, ResolveOptions};

/// Events emitted by the MonitorEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        records_count: usize,
    },

    /// A record's resolved values diverged from its baseline
    RecordChanged {
        fqdn: String,
        record_type: RecordType,
        observed: Vec<String>,
        baseline: Vec<String>,
        notified: bool,
    },

    /// A record's resolution attempt failed
    RecordErrored {
        fqdn: String,
        record_type: RecordType,
    },

    /// An evaluation cycle finished
    CycleCompleted {
        changed: usize,
        errored: usize,
    },

    /// Snapshot consumers should re-read the record table
    Refresh,

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Tallies from one evaluation cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Records whose values diverged from their baseline
    pub changed: usize,
    /// Records whose resolution attempt failed
    pub errored: usize,
}

/// What a single record evaluation concluded
enum RecordOutcome {
    Changed,
    Unchanged,
    Errored,
}

/// Core monitoring engine
///
/// Owns the record table, the baseline resolver (and through it the optional
/// store handle) and the configuration, and is passed explicitly wherever
/// monitoring happens: there is no process-global state.
///
/// ## Lifecycle
///
/// 1. Create with [`MonitorEngine::new()`]
/// 2. Start with [`MonitorEngine::run()`] (or [`run_with_shutdown`] when the
///    caller owns signal handling)
/// 3. The engine runs until a shutdown signal is received
///
/// ## Threading
///
/// All cycle work happens on a single async task; the record table may be
/// snapshotted concurrently from any task.
///
/// [`run_with_shutdown`]: MonitorEngine::run_with_shutdown
pub struct MonitorEngine {
    /// Resolver used for every record query
    resolver: Box<dyn RecordResolver>,

    /// Notifier invoked for detected changes
    notifier: Box<dyn ChangeNotifier>,

    /// Baseline lookup + rolling persistence
    baseline: BaselineResolver,

    /// Record state, shared with snapshot consumers
    table: Arc<RecordTable>,

    /// Monitored record definitions, processed in order
    records: Vec<RecordConfig>,

    /// Answer-value string processor
    normalizer: Normalizer,

    /// Network preferences and timeout handed to the resolver
    resolve_options: ResolveOptions,

    /// Interval between evaluation cycles
    check_interval: Duration,

    /// Interval between snapshot refresh events
    refresh_interval: Duration,

    /// Log detector inputs and outcome per record
    log_record_processing: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl MonitorEngine {
    /// Create a new monitor engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: resolver implementation
    /// - `notifier`: notifier implementation
    /// - `store`: optional baseline store (None disables persistence)
    /// - `config`: monitor configuration (validated here; invalid
    ///   configuration is fatal)
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events.
    pub fn new(
        resolver: Box<dyn RecordResolver>,
        notifier: Box<dyn ChangeNotifier>,
        store: Option<Box<dyn BaselineStore>>,
        config: MonitorConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let table = Arc::new(RecordTable::new());
        table.initialize(&config.records);

        let baseline = BaselineResolver::new(store, &config.records);

        let engine = Self {
            resolver,
            notifier,
            baseline,
            table,
            normalizer: Normalizer::new(&config.normalize),
            resolve_options: ResolveOptions {
                use_ipv4: config.engine.use_ipv4,
                use_ipv6: config.engine.use_ipv6,
                use_tcp: config.engine.use_tcp,
                timeout: Duration::from_secs(config.engine.dns_timeout_secs),
            },
            check_interval: Duration::from_secs(config.engine.check_interval_secs),
            refresh_interval: Duration::from_secs(config.engine.refresh_interval_secs),
            log_record_processing: config.engine.log_record_processing,
            records: config.records,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Shared handle to the record table for snapshot consumers
    pub fn table(&self) -> Arc<RecordTable> {
        Arc::clone(&self.table)
    }

    /// Run the engine until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine with a controlled shutdown signal
    ///
    /// Used by the daemon (which owns SIGTERM/SIGINT plumbing) and by tests.
    /// Passing `None` behaves like [`run`](MonitorEngine::run).
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            records_count: self.table.len(),
        });

        // Prime the state once, outside the scheduler
        let summary = self.run_cycle().await;
        info!(
            "startup cycle complete: {} changed, {} errored of {} record(s)",
            summary.changed,
            summary.errored,
            self.records.len()
        );

        let mut check = tokio::time::interval(self.check_interval);
        // Ticks that fall due while a cycle runs are serialized, not dropped
        // or run concurrently
        check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; the startup cycle
        // already covered it
        check.tick().await;

        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
        refresh.tick().await;

        if let Some(mut rx) = shutdown_rx {
            loop {
                tokio::select! {
                    _ = check.tick() => {
                        let summary = self.run_cycle().await;
                        self.emit_event(EngineEvent::CycleCompleted {
                            changed: summary.changed,
                            errored: summary.errored,
                        });
                    }

                    _ = refresh.tick() => {
                        self.emit_event(EngineEvent::Refresh);
                    }

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            loop {
                tokio::select! {
                    _ = check.tick() => {
                        let summary = self.run_cycle().await;
                        self.emit_event(EngineEvent::CycleCompleted {
                            changed: summary.changed,
                            errored: summary.errored,
                        });
                    }

                    _ = refresh.tick() => {
                        self.emit_event(EngineEvent::Refresh);
                    }

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit_event(EngineEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        info!("engine stopped");
        Ok(())
    }

    /// Run one full evaluation cycle
    ///
    /// Processes every monitored record exactly once, in definition order,
    /// with one resolution attempt each (no retries, no backoff). Runs to
    /// completion; callers must not invoke it concurrently.
    pub async fn run_cycle(&self) -> CycleSummary {
        // Pass 1: reset every record before any resolution begins, so a
        // snapshot never mixes this cycle's processing flags with a previous
        // cycle's half-updated results
        for record in &self.records {
            self.table.begin_cycle(&record.key());
        }

        let mut summary = CycleSummary::default();

        // Pass 2: resolve, compare, persist, notify, commit
        for record in &self.records {
            match self.evaluate_record(record).await {
                RecordOutcome::Changed => summary.changed += 1,
                RecordOutcome::Errored => summary.errored += 1,
                RecordOutcome::Unchanged => {}
            }
        }

        summary
    }

    /// Evaluate a single record
    async fn evaluate_record(&self, record: &RecordConfig) -> RecordOutcome {
        let key = record.key();

        let answers = match self
            .resolver
            .resolve(&record.fqdn, record.record_type, &self.resolve_options)
            .await
        {
            Ok(answers) if !answers.is_empty() => answers,
            Ok(_) => {
                warn!("no answer data for {key}");
                self.table.commit_error(&key);
                self.emit_event(EngineEvent::RecordErrored {
                    fqdn: record.fqdn.clone(),
                    record_type: record.record_type,
                });
                return RecordOutcome::Errored;
            }
            Err(e) => {
                warn!("unable to resolve {key}: {e}");
                self.table.commit_error(&key);
                self.emit_event(EngineEvent::RecordErrored {
                    fqdn: record.fqdn.clone(),
                    record_type: record.record_type,
                });
                return RecordOutcome::Errored;
            }
        };

        let observed: Vec<String> = answers.iter().map(|a| self.normalizer.apply(a)).collect();
        let baseline = self.baseline.resolve(&key).await;
        let comparison = detector::compare(baseline, observed);

        // The store always reflects the most recently seen state, regardless
        // of the change outcome
        self.baseline.persist(&key, &comparison.observed).await;

        if self.log_record_processing {
            debug!(
                "{key}: changed={} order={:?} observed={:?} baseline={:?}",
                comparison.changed, comparison.ordering, comparison.observed, comparison.baseline
            );
        }

        let mut notified = false;
        if comparison.changed {
            let report = ChangeReport::new(
                record.fqdn.clone(),
                record.record_type,
                comparison.observed.clone(),
                comparison.baseline.clone(),
            );

            match self.notifier.notify(&report).await {
                Ok(()) => notified = true,
                Err(e) => {
                    error!(
                        "notification via {} failed for {key}: {e}",
                        self.notifier.notifier_name()
                    );
                }
            }

            self.emit_event(EngineEvent::RecordChanged {
                fqdn: record.fqdn.clone(),
                record_type: record.record_type,
                observed: comparison.observed.clone(),
                baseline: comparison.baseline.clone(),
                notified,
            });
        }

        let changed = comparison.changed;
        self.table.commit_result(
            &key,
            CycleOutcome {
                current_values: comparison.observed,
                prior_values: comparison.baseline,
                changed,
                notified,
            },
        );

        if changed {
            RecordOutcome::Changed
        } else {
            RecordOutcome::Unchanged
        }
    }

    /// Emit an engine event
    ///
    /// Never blocks: when the channel is full the event is dropped with a
    /// warning so a slow consumer cannot stall the cycle.
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}
