//! Session orchestrator: weight readings + tracker frames → receipts.
//!
//! # Processing steps
//! 1. Pick the test start time and aggregate readings per gondola
//! 2. Rolling statistics per gondola (in parallel)
//! 3. Trim resampled timestamps to the valid window region
//! 4. Detect events (in parallel; a length mismatch aborts the session)
//! 5. Split multi-product pickups
//! 6. Sort by start time and run the cashier
//!
//! Every stage is timed so the CLI and benchmarks can report where the time
//! goes.

use crate::{
    aggregation::{test_start_time, WeightAggregator},
    cashier::{Cashier, CashierConfig, ProcessedEvent},
    catalog::ProductCatalog,
    detection::{DetectorThresholds, EventDetector},
    error::Result,
    event::WeightEvent,
    geometry::StoreGeometry,
    planogram::Planogram,
    receipt::CustomerReceipt,
    rolling::{trim_timestamps, RollingStats, DEFAULT_WINDOW},
    splitter::EventSplitter,
    tracker::{ReadingSource, TargetSource},
    types::{PlateReading, TargetId},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, time::Instant};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for a full session run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rolling window length in samples
    pub window: usize,
    pub thresholds: DetectorThresholds,
    pub cashier: CashierConfig,
    /// Start of the session video, if known (seconds since epoch)
    pub video_start_time: Option<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            thresholds: DetectorThresholds::default(),
            cashier: CashierConfig::default(),
            video_start_time: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Wall-clock time per stage, in microseconds.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub aggregate_us: u64,
    pub rolling_us: u64,
    pub detect_us: u64,
    pub split_us: u64,
    pub cashier_us: u64,
    pub total_us: u64,
}

/// Outputs of one session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionOutput {
    pub receipts: BTreeMap<TargetId, CustomerReceipt>,
    /// Events in processing order with what the cashier made of each
    pub events: Vec<ProcessedEvent>,
    pub test_start_time: f64,
    /// Readings dropped for a malformed frame count
    pub skipped_readings: usize,
    pub timings: StageTimings,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Runs sessions against a fixed store layout. Each run starts from the
/// loaded planogram; restocking during a run does not leak into the next.
pub struct SessionPipeline {
    pub config: SessionConfig,
    catalog: ProductCatalog,
    planogram: Planogram,
    geometry: StoreGeometry,
}

impl SessionPipeline {
    pub fn new(
        config: SessionConfig,
        catalog: ProductCatalog,
        planogram: Planogram,
        geometry: StoreGeometry,
    ) -> Self {
        Self {
            config,
            catalog,
            planogram,
            geometry,
        }
    }

    pub fn run(
        &self,
        readings: &dyn ReadingSource,
        targets: &dyn TargetSource,
    ) -> Result<SessionOutput> {
        let start_total = Instant::now();
        let mut timings = StageTimings::default();

        let (events, start, skipped) =
            self.detect_events(&readings.plate_readings(0.0), &mut timings)?;

        let t0 = Instant::now();
        let events = EventSplitter::new(&self.planogram, &self.catalog).split_all(events);
        timings.split_us = t0.elapsed().as_micros() as u64;

        let t0 = Instant::now();
        let mut cashier = Cashier::new(
            self.config.cashier.clone(),
            self.catalog.clone(),
            self.planogram.clone(),
            self.geometry.clone(),
        );
        let processed = cashier.process(events, targets);
        timings.cashier_us = t0.elapsed().as_micros() as u64;
        timings.total_us = start_total.elapsed().as_micros() as u64;

        let receipts = cashier.into_receipts();
        tracing::info!(
            "Session done: {} events, {} receipts in {} µs",
            processed.len(),
            receipts.len(),
            timings.total_us
        );
        Ok(SessionOutput {
            receipts,
            events: processed,
            test_start_time: start,
            skipped_readings: skipped,
            timings,
        })
    }

    /// Stages 1–4: unsplit shelf events in gondola order, with the test
    /// start time and the number of skipped readings.
    pub fn detect_events(
        &self,
        readings: &[PlateReading],
        timings: &mut StageTimings,
    ) -> Result<(Vec<WeightEvent>, f64, usize)> {
        let t0 = Instant::now();
        let first = readings
            .iter()
            .map(|r| r.timestamp)
            .min_by(f64::total_cmp)
            .unwrap_or(0.0);
        let start = test_start_time(self.config.video_start_time, first);
        let mut aggregator = WeightAggregator::new(start);
        aggregator.ingest_all(readings);
        let skipped = aggregator.skipped();
        let series: Vec<_> = aggregator.finish().into_values().collect();
        timings.aggregate_us = t0.elapsed().as_micros() as u64;

        let t0 = Instant::now();
        let window = self.config.window;
        let inputs: Vec<(RollingStats, Vec<f64>)> = series
            .par_iter()
            .filter_map(|s| {
                let Some(stats) = RollingStats::compute(s, window) else {
                    tracing::warn!(
                        "Gondola {}: {} samples, shorter than the {}-sample window; skipped",
                        s.gondola_id,
                        s.len(),
                        window
                    );
                    return None;
                };
                Some((stats, trim_timestamps(&s.timestamps(), window)))
            })
            .collect();
        timings.rolling_us = t0.elapsed().as_micros() as u64;

        let t0 = Instant::now();
        let events =
            EventDetector::new(self.config.thresholds.clone()).detect_all(&inputs)?;
        timings.detect_us = t0.elapsed().as_micros() as u64;
        tracing::debug!("Detected {} shelf events on {} gondolas", events.len(), inputs.len());

        Ok((events, start, skipped))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;
    use crate::tracker::{RecordedReadings, RecordedTargets, TargetFrame};
    use crate::types::{BodyPart, Coordinate, Position, RawFrame, Target, SAMPLES_PER_READING};

    /// Gondola 1 with `weight` grams on plate (1, 1) in every frame.
    fn reading(t: f64, weight: f64) -> PlateReading {
        let frame: RawFrame = (0..13)
            .map(|r| {
                (0..13)
                    .map(|c| if r == 1 && c == 1 { weight } else { 0.0 })
                    .collect()
            })
            .collect();
        PlateReading {
            gondola_id: 1,
            timestamp: t,
            samples: vec![frame; SAMPLES_PER_READING],
        }
    }

    fn pipeline() -> SessionPipeline {
        let mut catalog = ProductCatalog::default();
        let mut record = ProductRecord::new("chips", "Chips", 100.0);
        record.positions.insert(Position::new(1, 1, 1));
        catalog.insert(record);
        let mut planogram = Planogram::new();
        planogram.add(Position::new(1, 1, 1), "chips".into());
        let mut geometry = StoreGeometry::new();
        geometry.insert_gondola(1, Coordinate::new(0.0, 0.0, 0.0));
        geometry.insert_shelf(1, 1, Coordinate::new(0.0, 0.0, 1.0));
        SessionPipeline::new(SessionConfig::default(), catalog, planogram, geometry)
    }

    #[test]
    fn pickup_reaches_receipt() {
        // 20 readings at 1 Hz; the plate loses 100 g at t = 10
        let readings = RecordedReadings::new(
            (0..20)
                .map(|i| {
                    let w = if i < 10 { 500.0 } else { 400.0 };
                    reading(1000.0 + i as f64, w)
                })
                .collect(),
        );
        let frames = (0..40)
            .map(|i| TargetFrame {
                timestamp: 1000.0 + i as f64 * 0.5,
                targets: vec![Target::with_head(
                    "1",
                    BodyPart::new(Coordinate::new(0.2, 0.0, 1.5), 0.9),
                )],
            })
            .collect();
        let out = pipeline()
            .run(&readings, &RecordedTargets::new(frames))
            .unwrap();

        assert_eq!(out.events.len(), 1);
        let receipt = &out.receipts[&TargetId::from("1")];
        assert_eq!(receipt.quantity_of(&"chips".into()), 1);
        assert_eq!(out.test_start_time, 0.0);
        assert_eq!(out.skipped_readings, 0);
    }

    #[test]
    fn quiet_session_has_no_events() {
        let readings =
            RecordedReadings::new((0..20).map(|i| reading(i as f64, 500.0)).collect());
        let out = pipeline()
            .run(&readings, &RecordedTargets::default())
            .unwrap();
        assert!(out.events.is_empty());
        assert!(out.receipts.is_empty());
    }

    #[test]
    fn odd_window_runs_to_completion() {
        let readings = RecordedReadings::new(
            (0..20)
                .map(|i| reading(1000.0 + i as f64, if i < 10 { 500.0 } else { 400.0 }))
                .collect(),
        );
        let mut p = pipeline();
        p.config.window = 61;
        let out = p.run(&readings, &RecordedTargets::default()).unwrap();
        assert_eq!(out.events.len(), 1);
    }

    #[test]
    fn short_gondola_is_skipped() {
        // 4 readings = 48 samples < 60-sample window
        let readings = RecordedReadings::new((0..4).map(|i| reading(i as f64, 500.0)).collect());
        let out = pipeline()
            .run(&readings, &RecordedTargets::default())
            .unwrap();
        assert!(out.events.is_empty());
    }

    #[test]
    fn config_accepts_partial_json() {
        let cfg: SessionConfig =
            serde_json::from_str(r#"{"cashier": {"association": "closest"}}"#).unwrap();
        assert_eq!(cfg.window, DEFAULT_WINDOW);
        assert_eq!(cfg.cashier.putback_jitter_rate, 0.75);
        assert_eq!(
            cfg.cashier.association,
            crate::association::AssociationKind::Closest
        );
    }
}
