//! Architectural Contract Test: Cycle State Machine & Snapshot Consistency
//!
//! Verifies the two-phase cycle over the record table:
//! - The reset phase covers every record before any resolution begins
//! - A snapshot taken mid-cycle never shows `processing` for a record that
//!   already received its commit, and never a torn entry
//! - Snapshots are deterministically ordered

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use dnsdrift_core::config::{RecordConfig, RecordType};
use dnsdrift_core::engine::MonitorEngine;

fn two_records() -> Vec<RecordConfig> {
    vec![
        RecordConfig::new("alpha.example.com", RecordType::A)
            .with_expected_values(values(&["1.1.1.1"])),
        RecordConfig::new("beta.example.com", RecordType::A)
            .with_expected_values(values(&["2.2.2.2"])),
    ]
}

#[tokio::test]
async fn reset_phase_covers_every_record_before_resolution() {
    let resolver = ScriptedResolver::new();
    resolver.set_delay(Duration::from_millis(200)).await;
    resolver.set_default(Ok(values(&["1.1.1.1"]))).await;

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        None,
        minimal_config(two_records()),
    )
    .expect("engine construction succeeds");

    let engine = Arc::new(engine);
    let cycle = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run_cycle().await })
    };

    // the first record is still resolving; both must already be marked
    // processing by the reset pass
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = engine.table().snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.iter().all(|s| s.processing));

    cycle.await.unwrap();
}

#[tokio::test]
async fn committed_records_never_show_processing_mid_cycle() {
    let resolver = ScriptedResolver::new();
    resolver.set_delay(Duration::from_millis(200)).await;
    resolver.set_default(Ok(values(&["1.1.1.1"]))).await;

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        None,
        minimal_config(two_records()),
    )
    .expect("engine construction succeeds");

    let engine = Arc::new(engine);
    let cycle = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run_cycle().await })
    };

    // alpha (first in definition order) has committed, beta is in flight
    tokio::time::sleep(Duration::from_millis(300)).await;
    let snapshot = engine.table().snapshot();
    let alpha = snapshot.iter().find(|s| s.fqdn == "alpha.example.com").unwrap();
    let beta = snapshot.iter().find(|s| s.fqdn == "beta.example.com").unwrap();
    assert!(!alpha.processing, "committed record must not show processing");
    assert!(beta.processing, "in-flight record still shows processing");

    cycle.await.unwrap();

    // after the cycle no record may be observably processing
    assert!(engine.table().snapshot().iter().all(|s| !s.processing));
}

#[tokio::test]
async fn snapshots_are_never_torn_while_a_cycle_runs() {
    let resolver = ScriptedResolver::new();
    resolver.set_delay(Duration::from_millis(20)).await;
    resolver.set_default(Ok(values(&["1.1.1.1"]))).await;

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        None,
        minimal_config(two_records()),
    )
    .expect("engine construction succeeds");

    let engine = Arc::new(engine);
    let cycle = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            for _ in 0..5 {
                engine.run_cycle().await;
            }
        })
    };

    // hammer snapshots while cycles run; every read must be internally
    // consistent
    while !cycle.is_finished() {
        let snapshot = engine.table().snapshot();
        assert_eq!(snapshot.len(), 2);
        for state in &snapshot {
            if !state.processing && !state.errored && !state.current_values.is_empty() {
                // a committed result always carries its matching baseline
                assert_eq!(state.current_values, values(&["1.1.1.1"]));
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    cycle.await.unwrap();
}

#[tokio::test]
async fn snapshot_order_is_deterministic() {
    let records = vec![
        RecordConfig::new("zulu.example.com", RecordType::A),
        RecordConfig::new("alpha.example.com", RecordType::Txt),
        RecordConfig::new("alpha.example.com", RecordType::A),
    ];

    let resolver = ScriptedResolver::new();
    resolver.set_default(Ok(values(&["1.1.1.1"]))).await;

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        None,
        minimal_config(records),
    )
    .expect("engine construction succeeds");

    engine.run_cycle().await;

    let keys: Vec<String> = engine
        .table()
        .snapshot()
        .iter()
        .map(|s| s.key().composite())
        .collect();

    assert_eq!(
        keys,
        vec![
            "alpha.example.com:A",
            "alpha.example.com:TXT",
            "zulu.example.com:A",
        ]
    );

    // a second snapshot yields the same order
    let again: Vec<String> = engine
        .table()
        .snapshot()
        .iter()
        .map(|s| s.key().composite())
        .collect();
    assert_eq!(keys, again);
}
