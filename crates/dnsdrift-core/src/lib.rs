// # dnsdrift-core
//
// Core library for the dnsdrift record monitoring system.
//
// ## Architecture Overview
//
// This library provides everything needed to watch a configured set of DNS
// records for drift against a remembered baseline:
//
// - **RecordResolver**: Trait for resolving a record's current answer values
// - **ChangeNotifier**: Trait for delivering change reports
// - **BaselineStore**: Trait for the optional persistent baseline cache
// - **MonitorEngine**: Orchestrates resolve → baseline → compare → notify,
//   once per record per cycle, driven by two timer loops
// - **RecordTable**: In-memory state of every monitored record, read by
//   snapshot consumers
// - **ComponentRegistry**: Plugin-based registry for capability backends
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Capability backends never make monitoring
//    decisions; the engine never speaks wire protocols
// 2. **Single Writer**: Only the evaluation cycle mutates record state and
//    the baseline store, enforced by single-flight scheduling
// 3. **Absorbed Failures**: Per-record resolution, persistence and
//    notification failures are recorded in state, never propagated upward
// 4. **Library-First**: The daemon is a thin wrapper; everything here can be
//    embedded

pub mod baseline;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod notify;
pub mod registry;
pub mod state;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use baseline::BaselineResolver;
pub use config::{
    EngineConfig, MonitorConfig, NormalizeConfig, NotifierConfig, RecordConfig, RecordType,
    ResolverConfig, StoreConfig,
};
pub use engine::{CycleSummary, EngineEvent, MonitorEngine};
pub use error::{Error, Result};
pub use notify::LogNotifier;
pub use registry::ComponentRegistry;
pub use state::{CycleOutcome, RecordKey, RecordState, RecordTable};
pub use store::{FileBaselineStore, MemoryBaselineStore};
pub use traits::{BaselineStore, ChangeNotifier, ChangeReport, RecordResolver, ResolveOptions};
