//! Scenario sessions run through the full pipeline.

use checkout_core::{
    association::AssociationKind,
    cashier::EventOutcome,
    metrics::ReceiptMetrics,
    session::SessionConfig,
    types::{Barcode, TargetId},
};
use sim::{
    load_log, save_log,
    scenarios::{CEREAL, CHOCOLATE, COFFEE, COLA, MAC_AND_CHEESE},
    Scenario, ScenarioKind,
};

fn quantity(out: &checkout_core::SessionOutput, customer: &str, barcode: &str) -> u32 {
    out.receipts
        .get(&TargetId::from(customer))
        .map(|r| r.quantity_of(&Barcode::from(barcode)))
        .unwrap_or(0)
}

fn purchases(out: &checkout_core::SessionOutput) -> usize {
    out.events
        .iter()
        .filter(|e| matches!(e.outcome, EventOutcome::Purchase(_)))
        .count()
}

#[test]
fn single_pickup_lands_on_receipt() {
    let log = Scenario::build(ScenarioKind::SinglePickup, 42).simulate();
    let out = log.run(SessionConfig::default()).unwrap();

    assert_eq!(purchases(&out), 1);
    assert_eq!(quantity(&out, "1", COLA), 1);
    assert_eq!(out.receipts.len(), 1);
    assert_eq!(out.skipped_readings, 0);
}

#[test]
fn putback_reduces_quantity() {
    let log = Scenario::build(ScenarioKind::PickupAndPutback, 7).simulate();
    let out = log.run(SessionConfig::default()).unwrap();

    assert_eq!(out.events.len(), 2);
    assert!(matches!(out.events[0].outcome, EventOutcome::Purchase(_)));
    assert!(matches!(out.events[1].outcome, EventOutcome::Putback(_)));
    assert_eq!(quantity(&out, "1", CHOCOLATE), 1);
}

#[test]
fn two_customers_get_their_own_items() {
    let log = Scenario::build(ScenarioKind::TwoCustomers, 3).simulate();
    let out = log.run(SessionConfig::default()).unwrap();

    assert_eq!(quantity(&out, "1", COLA), 1);
    assert_eq!(quantity(&out, "1", MAC_AND_CHEESE), 1);
    assert_eq!(quantity(&out, "2", COFFEE), 2);
    assert_eq!(quantity(&out, "1", COFFEE), 0);

    let mut metrics = ReceiptMetrics::default();
    metrics.accumulate(&out.receipts, &log.ground_truth);
    assert_eq!(metrics.true_positives, 4);
    assert_eq!(metrics.precision(), 1.0);
    assert_eq!(metrics.recall(), 1.0);
}

#[test]
fn simultaneous_pickups_are_split() {
    let log = Scenario::build(ScenarioKind::MultiPlateSplit, 11).simulate();
    let out = log.run(SessionConfig::default()).unwrap();

    assert_eq!(purchases(&out), 2);
    assert_eq!(quantity(&out, "1", COLA), 1);
    assert_eq!(quantity(&out, "1", CEREAL), 1);
}

#[test]
fn every_strategy_attributes_two_customers() {
    let log = Scenario::build(ScenarioKind::TwoCustomers, 5).simulate();
    for association in [
        AssociationKind::Naive,
        AssociationKind::Closest,
        AssociationKind::ConfidenceWeighted,
    ] {
        let mut config = SessionConfig::default();
        config.cashier.association = association;
        let out = log.run(config).unwrap();
        assert_eq!(quantity(&out, "2", COFFEE), 2, "{association:?}");
        assert_eq!(quantity(&out, "1", COLA), 1, "{association:?}");
    }
}

#[test]
fn metrics_over_all_scenarios() {
    let mut metrics = ReceiptMetrics::default();
    for kind in [
        ScenarioKind::SinglePickup,
        ScenarioKind::PickupAndPutback,
        ScenarioKind::TwoCustomers,
        ScenarioKind::MultiPlateSplit,
    ] {
        let log = Scenario::build(kind, 1).simulate();
        let out = log.run(SessionConfig::default()).unwrap();
        metrics.accumulate(&out.receipts, &log.ground_truth);
    }
    assert_eq!(metrics.n_sessions, 4);
    assert_eq!(metrics.false_positives, 0);
    assert_eq!(metrics.false_negatives, 0);
    assert_eq!(metrics.f1(), 1.0);
}

#[test]
fn replay_round_trip_gives_same_receipts() {
    let log = Scenario::build(ScenarioKind::TwoCustomers, 9).simulate();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    save_log(&log, &path).unwrap();

    let loaded = load_log(&path).unwrap();
    assert_eq!(loaded.readings.len(), log.readings.len());
    assert!(loaded.readings[0].samples[0][0][0].is_nan());

    let before = log.run(SessionConfig::default()).unwrap();
    let after = loaded.run(SessionConfig::default()).unwrap();
    assert_eq!(before.receipts, after.receipts);
}
