//! Change-point detection: rolling statistics → discrete weight events.
//!
//! # Algorithm (per gondola, per shelf)
//! 1. Mark every sample whose rolling std exceeds `std_shelf` as active
//! 2. Scan left to right; each maximal run of active samples is a candidate
//! 3. Track the sample of maximum std inside the run (the peak)
//! 4. Drop runs shorter than `min_event_length`
//! 5. Emit an event when `|mean[end] − mean[begin]| > mean_shelf`, with the
//!    same begin/end difference taken for every plate
//!
//! The scan resumes right after the consumed run, so each shelf is a single
//! O(samples) pass.

use crate::{
    error::{CheckoutError, Result},
    event::WeightEvent,
    rolling::RollingStats,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Detection thresholds. The lightest stocked product weighs about 24 g.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorThresholds {
    /// Rolling std above which a shelf is considered active (g)
    pub std_shelf: f64,
    /// Minimum absolute shelf-mean change for an event (g)
    pub mean_shelf: f64,
    /// Minimum plate-mean change (g). Reserved; not used by the shelf scan.
    pub mean_plate: f64,
    /// Minimum number of consecutive active samples
    pub min_event_length: usize,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            std_shelf: 20.0,
            mean_shelf: 10.0,
            mean_plate: 5.0,
            min_event_length: 30,
        }
    }
}

/// Detects weight events on rolling statistics.
#[derive(Clone, Debug, Default)]
pub struct EventDetector {
    pub thresholds: DetectorThresholds,
}

impl EventDetector {
    pub fn new(thresholds: DetectorThresholds) -> Self {
        Self { thresholds }
    }

    /// Detect events on one gondola. `timestamps` must already be trimmed to
    /// the rolling-window valid region.
    pub fn detect(&self, stats: &RollingStats, timestamps: &[f64]) -> Result<Vec<WeightEvent>> {
        if timestamps.len() != stats.len() {
            return Err(CheckoutError::DimensionMismatch {
                gondola: stats.gondola_id,
                timestamps: timestamps.len(),
                stats: stats.len(),
            });
        }

        let mut events = Vec::new();
        for shelf_idx in 0..stats.num_shelves() {
            self.scan_shelf(stats, shelf_idx, timestamps, &mut events);
        }
        Ok(events)
    }

    /// Detect events on several gondolas in parallel. Results are returned in
    /// input order; the first consistency error aborts the whole batch.
    pub fn detect_all(&self, inputs: &[(RollingStats, Vec<f64>)]) -> Result<Vec<WeightEvent>> {
        let per_gondola: Vec<Result<Vec<WeightEvent>>> = inputs
            .par_iter()
            .map(|(stats, ts)| self.detect(stats, ts))
            .collect();
        let mut events = Vec::new();
        for res in per_gondola {
            events.extend(res?);
        }
        Ok(events)
    }

    fn scan_shelf(
        &self,
        stats: &RollingStats,
        shelf_idx: usize,
        timestamps: &[f64],
        events: &mut Vec<WeightEvent>,
    ) {
        let th = &self.thresholds;
        let std = stats.shelf_std.row(shelf_idx);
        let mean = stats.shelf_mean.row(shelf_idx);
        let active = |k: usize| std[k] > th.std_shelf;
        let len = std.len();

        let mut i = 0;
        while i < len {
            if !active(i) {
                i += 1;
                continue;
            }
            let n_begin = i;
            let mut n_end = i;
            let mut n_peak = i;
            while n_end + 1 < len && active(n_end + 1) {
                n_end += 1;
                if std[n_end] > std[n_peak] {
                    n_peak = n_end;
                }
            }
            i = n_end + 1;

            if n_end - n_begin + 1 < th.min_event_length {
                continue;
            }
            let delta_weight = mean[n_end] - mean[n_begin];
            if delta_weight.abs() <= th.mean_shelf {
                continue;
            }

            let plate_mean = &stats.plate_mean[shelf_idx];
            let delta_weights = (0..plate_mean.nrows())
                .map(|p| plate_mean[(p, n_end)] - plate_mean[(p, n_begin)])
                .collect();

            let event = WeightEvent {
                trigger_begin: timestamps[n_begin],
                trigger_end: timestamps[n_end],
                peak_time: timestamps[n_peak],
                n_begin,
                n_end,
                delta_weight,
                gondola_id: stats.gondola_id,
                shelf_id: shelf_idx as u32 + 1,
                delta_weights,
            };
            tracing::debug!("Detected event {}", event);
            events.push(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    /// One-shelf, one-plate stats with the given std/mean rows.
    fn stats(std: &[f64], mean: &[f64]) -> RollingStats {
        let t = std.len();
        RollingStats {
            gondola_id: 3,
            window: 60,
            shelf_mean: DMatrix::from_row_slice(1, t, mean),
            shelf_std: DMatrix::from_row_slice(1, t, std),
            plate_mean: vec![DMatrix::from_row_slice(1, t, mean)],
            plate_std: vec![DMatrix::from_row_slice(1, t, std)],
        }
    }

    fn timestamps(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn detects_single_pickup() {
        let mut std = vec![0.0; 100];
        let mut mean = vec![500.0; 100];
        for k in 20..60 {
            std[k] = 30.0 + k as f64;
        }
        for m in mean.iter_mut().skip(59) {
            *m = 300.0;
        }
        let events = EventDetector::default()
            .detect(&stats(&std, &mean), &timestamps(100))
            .unwrap();
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!((e.n_begin, e.n_end), (20, 59));
        assert_eq!(e.delta_weight, -200.0);
        assert_eq!(e.delta_weights, vec![-200.0]);
        assert_eq!(e.shelf_id, 1);
        assert_eq!(e.gondola_id, 3);
        assert!((e.peak_time - (100.0 + 5.9)).abs() < 1e-9);
    }

    #[test]
    fn short_runs_are_ignored() {
        let mut std = vec![0.0; 100];
        let mut mean = vec![500.0; 100];
        for k in 10..30 {
            std[k] = 50.0;
            mean[k] = 100.0;
        }
        let events = EventDetector::default()
            .detect(&stats(&std, &mean), &timestamps(100))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn small_net_change_is_ignored() {
        let mut std = vec![0.0; 100];
        let mut mean = vec![500.0; 100];
        for k in 10..50 {
            std[k] = 50.0;
        }
        mean[49] = 505.0;
        let events = EventDetector::default()
            .detect(&stats(&std, &mean), &timestamps(100))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn two_runs_give_two_events() {
        let mut std = vec![0.0; 200];
        let mut mean = vec![500.0; 200];
        for k in 10..50 {
            std[k] = 50.0;
        }
        for k in 49..200 {
            mean[k] = 400.0;
        }
        for k in 100..140 {
            std[k] = 50.0;
        }
        for k in 139..200 {
            mean[k] = 450.0;
        }
        let events = EventDetector::default()
            .detect(&stats(&std, &mean), &timestamps(200))
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].delta_weight < 0.0);
        assert!(events[1].is_putback());
    }

    #[test]
    fn misaligned_timestamps_are_fatal() {
        let err = EventDetector::default()
            .detect(&stats(&[0.0; 10], &[0.0; 10]), &timestamps(9))
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::DimensionMismatch {
                gondola: 3,
                timestamps: 9,
                stats: 10
            }
        ));
    }
}
