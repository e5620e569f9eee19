//! Architectural Contract Test: Drift Detection
//!
//! Verifies the resolve → baseline → compare → notify flow:
//! - An answer matching the baseline is not a change
//! - A diverging answer raises exactly one notification carrying the
//!   observed values and the baseline they were compared against
//! - The baseline overwrite converges: an unchanged answer on the next
//!   cycle is quiet again
//! - Normalization (tab expansion, imprecise matching) applies before
//!   comparison and storage

mod common;

use common::*;
use dnsdrift_core::config::{RecordConfig, RecordType};
use dnsdrift_core::engine::MonitorEngine;
use dnsdrift_core::state::RecordKey;

fn single_record() -> Vec<RecordConfig> {
    vec![
        RecordConfig::new("example.com", RecordType::A)
            .with_expected_values(values(&["1.1.1.1"])),
    ]
}

#[tokio::test]
async fn matching_answer_is_not_a_change() {
    let resolver = ScriptedResolver::new();
    resolver
        .enqueue("example.com", RecordType::A, Ok(values(&["1.1.1.1"])))
        .await;
    let notifier = MockNotifier::new();

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver.clone()),
        Box::new(notifier.clone()),
        None,
        minimal_config(single_record()),
    )
    .expect("engine construction succeeds");

    let summary = engine.run_cycle().await;
    assert_eq!(summary.changed, 0);
    assert_eq!(summary.errored, 0);

    let snapshot = engine.table().snapshot();
    let state = &snapshot[0];
    assert!(!state.changed && !state.errored && !state.processing);
    assert_eq!(state.current_values, values(&["1.1.1.1"]));
    assert_eq!(state.prior_values, values(&["1.1.1.1"]));

    assert_eq!(notifier.report_count().await, 0);
}

#[tokio::test]
async fn diverging_answer_notifies_with_observed_and_baseline() {
    let resolver = ScriptedResolver::new();
    resolver
        .enqueue("example.com", RecordType::A, Ok(values(&["1.1.1.1"])))
        .await;
    resolver
        .enqueue("example.com", RecordType::A, Ok(values(&["2.2.2.2"])))
        .await;
    let notifier = MockNotifier::new();

    // no store: the first cycle compares against expected values
    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver.clone()),
        Box::new(notifier.clone()),
        None,
        minimal_config(single_record()),
    )
    .expect("engine construction succeeds");

    let first = engine.run_cycle().await;
    assert_eq!(first.changed, 0);

    let second = engine.run_cycle().await;
    assert_eq!(second.changed, 1);

    let reports = notifier.reports().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].fqdn, "example.com");
    assert_eq!(reports[0].record_type, RecordType::A);
    assert_eq!(reports[0].observed, values(&["2.2.2.2"]));
    assert_eq!(reports[0].baseline, values(&["1.1.1.1"]));

    let snapshot = engine.table().snapshot();
    let state = &snapshot[0];
    assert!(state.changed && state.notified);
    assert_eq!(state.current_values, values(&["2.2.2.2"]));
    assert_eq!(state.prior_values, values(&["1.1.1.1"]));
}

#[tokio::test]
async fn baseline_overwrite_converges() {
    let resolver = ScriptedResolver::new();
    resolver
        .set_default(Ok(values(&["2.2.2.2"])))
        .await;
    let notifier = MockNotifier::new();
    let store = FlakyStore::new();

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver.clone()),
        Box::new(notifier.clone()),
        Some(Box::new(store.clone())),
        minimal_config(single_record()),
    )
    .expect("engine construction succeeds");

    // first cycle: 2.2.2.2 vs expected 1.1.1.1 is a change, and the store
    // now remembers 2.2.2.2
    assert_eq!(engine.run_cycle().await.changed, 1);
    assert_eq!(store.read("example.com", RecordType::A).await, values(&["2.2.2.2"]));

    // second cycle with the same answer: quiet
    assert_eq!(engine.run_cycle().await.changed, 0);
    assert_eq!(notifier.report_count().await, 1);
}

#[tokio::test]
async fn answer_order_is_irrelevant() {
    let records = vec![
        RecordConfig::new("example.com", RecordType::Ns)
            .with_expected_values(values(&["ns1.example.com.", "ns2.example.com."])),
    ];

    let resolver = ScriptedResolver::new();
    resolver
        .enqueue(
            "example.com",
            RecordType::Ns,
            Ok(values(&["ns2.example.com.", "ns1.example.com."])),
        )
        .await;
    let notifier = MockNotifier::new();

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(notifier.clone()),
        None,
        minimal_config(records),
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run_cycle().await.changed, 0);
    assert_eq!(notifier.report_count().await, 0);
}

#[tokio::test]
async fn duplicate_answers_must_match_in_count() {
    let records = vec![
        RecordConfig::new("example.com", RecordType::Txt)
            .with_expected_values(values(&["token", "token"])),
    ];

    let resolver = ScriptedResolver::new();
    resolver
        .enqueue("example.com", RecordType::Txt, Ok(values(&["token"])))
        .await;

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        None,
        minimal_config(records),
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run_cycle().await.changed, 1);
}

#[tokio::test]
async fn expand_mode_normalizes_tabs_before_compare_and_store() {
    let records = vec![
        RecordConfig::new("example.com", RecordType::Txt)
            .with_expected_values(values(&["a    b"])),
    ];

    let mut config = minimal_config(records);
    config.normalize.expand_tabs = true;
    config.normalize.tab_width = 4;

    let resolver = ScriptedResolver::new();
    resolver
        .enqueue("example.com", RecordType::Txt, Ok(values(&["a\tb"])))
        .await;
    let store = FlakyStore::new();

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        Some(Box::new(store.clone())),
        config,
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run_cycle().await.changed, 0);

    // the stored baseline is the normalized form
    assert_eq!(
        store.read("example.com", RecordType::Txt).await,
        values(&["a    b"])
    );
}

#[tokio::test]
async fn imprecise_mode_strips_trailing_root_dot() {
    let records = vec![
        RecordConfig::new("example.com", RecordType::Cname)
            .with_expected_values(values(&["host.example.com"])),
    ];

    let mut config = minimal_config(records);
    config.normalize.imprecise_match = true;

    let resolver = ScriptedResolver::new();
    resolver
        .enqueue(
            "example.com",
            RecordType::Cname,
            Ok(values(&["host.example.com."])),
        )
        .await;

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(MockNotifier::new()),
        None,
        config,
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run_cycle().await.changed, 0);
}

#[tokio::test]
async fn empty_baseline_flags_any_answer() {
    // no expected values, no store: the baseline is empty and any answer is
    // drift
    let records = vec![RecordConfig::new("example.com", RecordType::A)];

    let resolver = ScriptedResolver::new();
    resolver
        .enqueue("example.com", RecordType::A, Ok(values(&["5.5.5.5"])))
        .await;
    let notifier = MockNotifier::new();

    let (engine, _event_rx) = MonitorEngine::new(
        Box::new(resolver),
        Box::new(notifier.clone()),
        None,
        minimal_config(records),
    )
    .expect("engine construction succeeds");

    assert_eq!(engine.run_cycle().await.changed, 1);

    let reports = notifier.reports().await;
    assert!(reports[0].baseline.is_empty());
    assert_eq!(reports[0].observed, values(&["5.5.5.5"]));

    let key = RecordKey::new("example.com", RecordType::A);
    let snapshot = engine.table().snapshot();
    let state = snapshot.iter().find(|s| s.key() == key).unwrap();
    assert!(state.changed);
}
