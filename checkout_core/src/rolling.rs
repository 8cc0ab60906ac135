//! Moving-window mean / standard deviation over aggregated series.
//!
//! A window of `w` samples over a series of length `T` yields `T − w + 1`
//! values; value `k` summarises samples `k..k+w`. The standard deviation is
//! the population one (divisor `w`).

use crate::aggregation::AggregatedSeries;
use nalgebra::DMatrix;

/// Samples per moving window.
pub const DEFAULT_WINDOW: usize = 60;

/// Rolling statistics of one gondola.
#[derive(Clone, Debug)]
pub struct RollingStats {
    pub gondola_id: u32,
    pub window: usize,
    /// `[shelf × time']`
    pub shelf_mean: DMatrix<f64>,
    pub shelf_std: DMatrix<f64>,
    /// Per shelf, `[plate × time']`
    pub plate_mean: Vec<DMatrix<f64>>,
    pub plate_std: Vec<DMatrix<f64>>,
}

impl RollingStats {
    /// Compute shelf- and plate-level statistics. Returns `None` when the
    /// series is shorter than one window.
    pub fn compute(series: &AggregatedSeries, window: usize) -> Option<Self> {
        if window == 0 || series.len() < window {
            return None;
        }
        let (shelf_mean, shelf_std) = rolling_rows(&series.shelf, window);
        let (plate_mean, plate_std) = series
            .plates
            .iter()
            .map(|m| rolling_rows(m, window))
            .unzip();
        Some(Self {
            gondola_id: series.gondola_id,
            window,
            shelf_mean,
            shelf_std,
            plate_mean,
            plate_std,
        })
    }

    /// Length of the time axis of every statistic.
    pub fn len(&self) -> usize {
        self.shelf_mean.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_shelves(&self) -> usize {
        self.shelf_mean.nrows()
    }
}

/// Rolling mean and std of every row of `m`.
fn rolling_rows(m: &DMatrix<f64>, window: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    let out_len = m.ncols() + 1 - window;
    let mut mean = DMatrix::zeros(m.nrows(), out_len);
    let mut std = DMatrix::zeros(m.nrows(), out_len);
    let w = window as f64;
    for r in 0..m.nrows() {
        let row: Vec<f64> = m.row(r).iter().copied().collect();
        for (k, win) in row.windows(window).enumerate() {
            let mu = win.iter().sum::<f64>() / w;
            let var = win.iter().map(|x| (x - mu) * (x - mu)).sum::<f64>() / w;
            mean[(r, k)] = mu;
            std[(r, k)] = var.sqrt();
        }
    }
    (mean, std)
}

/// Align resampled timestamps with the valid region of a rolling window:
/// drop `window / 2` leading and `window − 1 − window / 2` trailing samples
/// (30 and 29 for the default window).
pub fn trim_timestamps(timestamps: &[f64], window: usize) -> Vec<f64> {
    let head = window / 2;
    let tail = window.saturating_sub(1 + head);
    if timestamps.len() < head + tail {
        return Vec::new();
    }
    timestamps[head..timestamps.len() - tail].to_vec()
}
