//! Weight aggregation: raw gondola readings → per-gondola time series.
//!
//! # Processing per reading
//! 1. Discard readings older than the session cutoff
//! 2. Replace NaN cells with 0
//! 3. Drop the calibration border (first row, first column)
//! 4. Zero the non-existent plates 10–12 on narrow gondolas
//! 5. Append every frame as one column of the shelf and plate series
//!
//! Readings arrive at irregular intervals but each one packs
//! [`SAMPLES_PER_READING`] frames, so the time axis is resampled by splitting
//! every inter-reading gap into equal sub-steps.

use crate::types::{PlateReading, NARROW_GONDOLAS, PLATES_PER_NARROW_SHELF, SAMPLES_PER_READING};
use nalgebra::DMatrix;
use std::collections::BTreeMap;

/// Shelves per gondola once the calibration border is removed.
pub const GRID_SHELVES: usize = 12;

/// Plate columns per shelf once the calibration border is removed.
pub const GRID_PLATES: usize = 12;

/// Spacing used to extrapolate the sub-steps after the last reading (s).
pub const LAST_READING_STEP: f64 = 1.0 / 60.0;

/// Aggregated weight history of one gondola.
#[derive(Clone, Debug)]
pub struct AggregatedSeries {
    pub gondola_id: u32,
    /// Shelf totals `[shelf × time]` (grams)
    pub shelf: DMatrix<f64>,
    /// Per-shelf plate weights, each `[plate × time]` (grams)
    pub plates: Vec<DMatrix<f64>>,
    /// Timestamp of every reading, one per `SAMPLES_PER_READING` columns
    pub reading_times: Vec<f64>,
}

impl AggregatedSeries {
    /// Number of samples on the time axis.
    pub fn len(&self) -> usize {
        self.shelf.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.shelf.ncols() == 0
    }

    /// Resampled timestamp of every sample (see [`resample_timestamps`]).
    pub fn timestamps(&self) -> Vec<f64> {
        resample_timestamps(&self.reading_times)
    }
}

/// Subdivide each reading interval into `SAMPLES_PER_READING` equal steps.
///
/// The last reading has no successor, so its sub-steps are spaced by
/// [`LAST_READING_STEP`]. Output length is `SAMPLES_PER_READING × n`.
pub fn resample_timestamps(reading_times: &[f64]) -> Vec<f64> {
    let n = SAMPLES_PER_READING;
    let mut out = Vec::with_capacity(reading_times.len() * n);
    for (i, &t) in reading_times.iter().enumerate() {
        let step = match reading_times.get(i + 1) {
            Some(&next) => (next - t) / n as f64,
            None => LAST_READING_STEP,
        };
        out.extend((0..n).map(|j| t + step * j as f64));
    }
    out
}

/// Column-major accumulation buffer for one gondola.
#[derive(Default)]
struct GondolaBuffer {
    /// One `GRID_SHELVES × GRID_PLATES` row-major grid per frame
    frames: Vec<Vec<f64>>,
    reading_times: Vec<f64>,
}

/// Collects readings from all gondolas of a session.
pub struct WeightAggregator {
    test_start_time: f64,
    buffers: BTreeMap<u32, GondolaBuffer>,
    skipped: usize,
}

impl WeightAggregator {
    /// Readings strictly before `test_start_time` are discarded.
    pub fn new(test_start_time: f64) -> Self {
        Self {
            test_start_time,
            buffers: BTreeMap::new(),
            skipped: 0,
        }
    }

    /// Feed one reading. Readings must arrive in time order per gondola.
    pub fn ingest(&mut self, reading: &PlateReading) {
        if reading.timestamp < self.test_start_time {
            return;
        }
        if reading.samples.len() != SAMPLES_PER_READING {
            tracing::warn!(
                "Gondola {}: reading at {:.3} has {} frames, expected {}; skipped",
                reading.gondola_id,
                reading.timestamp,
                reading.samples.len(),
                SAMPLES_PER_READING
            );
            self.skipped += 1;
            return;
        }
        let buffer = self.buffers.entry(reading.gondola_id).or_default();
        for frame in &reading.samples {
            buffer.frames.push(clean_frame(reading.gondola_id, frame));
        }
        buffer.reading_times.push(reading.timestamp);
    }

    /// Feed many readings.
    pub fn ingest_all<'a>(&mut self, readings: impl IntoIterator<Item = &'a PlateReading>) {
        for r in readings {
            self.ingest(r);
        }
    }

    /// Readings rejected for a malformed frame count.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Build the series. Gondolas without any accepted reading are absent.
    pub fn finish(self) -> BTreeMap<u32, AggregatedSeries> {
        self.buffers
            .into_iter()
            .filter(|(_, b)| !b.frames.is_empty())
            .map(|(gondola_id, b)| {
                let t = b.frames.len();
                let shelf = DMatrix::from_fn(GRID_SHELVES, t, |s, k| {
                    b.frames[k][s * GRID_PLATES..(s + 1) * GRID_PLATES]
                        .iter()
                        .sum::<f64>()
                });
                let plates = (0..GRID_SHELVES)
                    .map(|s| {
                        DMatrix::from_fn(GRID_PLATES, t, |p, k| b.frames[k][s * GRID_PLATES + p])
                    })
                    .collect();
                let series = AggregatedSeries {
                    gondola_id,
                    shelf,
                    plates,
                    reading_times: b.reading_times,
                };
                (gondola_id, series)
            })
            .collect()
    }
}

/// Convert a raw frame into a clean `GRID_SHELVES × GRID_PLATES` grid.
fn clean_frame(gondola_id: u32, raw: &[Vec<f64>]) -> Vec<f64> {
    let narrow = NARROW_GONDOLAS.contains(&gondola_id);
    let mut grid = vec![0.0; GRID_SHELVES * GRID_PLATES];
    for s in 0..GRID_SHELVES {
        let Some(row) = raw.get(s + 1) else { break };
        for p in 0..GRID_PLATES {
            if narrow && p >= PLATES_PER_NARROW_SHELF {
                continue;
            }
            let v = row.get(p + 1).copied().unwrap_or(0.0);
            grid[s * GRID_PLATES + p] = if v.is_nan() { 0.0 } else { v };
        }
    }
    grid
}

/// Session cutoff: the video start time when it lies at least 10 s after the
/// first plate reading, otherwise 0 (keep everything).
pub fn test_start_time(video_start_time: Option<f64>, first_reading_time: f64) -> f64 {
    match video_start_time {
        Some(v) if v - first_reading_time >= 10.0 => v,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 13×13 raw frame with the border filled with NaN and `value` elsewhere.
    fn raw_frame(value: f64) -> Vec<Vec<f64>> {
        (0..13)
            .map(|r| {
                (0..13)
                    .map(|c| if r == 0 || c == 0 { f64::NAN } else { value })
                    .collect()
            })
            .collect()
    }

    fn reading(gondola_id: u32, timestamp: f64, value: f64) -> PlateReading {
        PlateReading {
            gondola_id,
            timestamp,
            samples: vec![raw_frame(value); SAMPLES_PER_READING],
        }
    }

    #[test]
    fn resample_subdivides_gaps() {
        let ts = resample_timestamps(&[10.0, 11.2, 11.8]);
        assert_eq!(ts.len(), 36);
        assert_abs_diff_eq!(ts[1], 10.1, epsilon = 1e-12);
        assert_abs_diff_eq!(ts[12], 11.2, epsilon = 1e-12);
        assert_abs_diff_eq!(ts[13], 11.25, epsilon = 1e-12);
        assert_abs_diff_eq!(ts[35], 11.8 + 11.0 / 60.0, epsilon = 1e-12);
    }

    #[test]
    fn aggregates_shelf_and_plate_series() {
        let mut agg = WeightAggregator::new(0.0);
        agg.ingest(&reading(1, 1.0, 10.0));
        agg.ingest(&reading(1, 2.0, 20.0));
        let series = agg.finish();
        let g1 = &series[&1];
        assert_eq!(g1.len(), 24);
        assert_eq!(g1.shelf.nrows(), GRID_SHELVES);
        assert_eq!(g1.plates[0].nrows(), GRID_PLATES);
        assert_abs_diff_eq!(g1.shelf[(0, 0)], 120.0);
        assert_abs_diff_eq!(g1.shelf[(3, 23)], 240.0);
        assert_abs_diff_eq!(g1.plates[2][(5, 13)], 20.0);
        assert_eq!(g1.timestamps().len(), g1.len());
    }

    #[test]
    fn narrow_gondolas_mask_missing_plates() {
        let mut agg = WeightAggregator::new(0.0);
        agg.ingest(&reading(4, 1.0, 10.0));
        let g4 = &agg.finish()[&4];
        assert_abs_diff_eq!(g4.plates[0][(8, 0)], 10.0);
        assert_abs_diff_eq!(g4.plates[0][(9, 0)], 0.0);
        assert_abs_diff_eq!(g4.plates[0][(11, 0)], 0.0);
        assert_abs_diff_eq!(g4.shelf[(0, 0)], 90.0);
    }

    #[test]
    fn readings_before_cutoff_are_dropped() {
        let mut agg = WeightAggregator::new(100.0);
        agg.ingest(&reading(1, 50.0, 10.0));
        agg.ingest(&reading(2, 150.0, 10.0));
        let series = agg.finish();
        assert!(!series.contains_key(&1), "gondola without readings is skipped");
        assert!(series.contains_key(&2));
    }

    #[test]
    fn malformed_readings_are_skipped() {
        let mut agg = WeightAggregator::new(0.0);
        let mut bad = reading(1, 1.0, 10.0);
        bad.samples.truncate(5);
        agg.ingest(&bad);
        assert_eq!(agg.skipped(), 1);
        assert!(agg.finish().is_empty());
    }

    #[test]
    fn cutoff_uses_video_start_only_when_well_after_first_reading() {
        assert_eq!(test_start_time(Some(120.0), 100.0), 120.0);
        assert_eq!(test_start_time(Some(105.0), 100.0), 0.0);
        assert_eq!(test_start_time(None, 100.0), 0.0);
    }
}
