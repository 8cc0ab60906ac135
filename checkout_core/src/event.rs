//! Weight-change events detected on a shelf.

use crate::types::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous period of shelf activity with a net weight change.
///
/// `delta_weight > 0` means weight was added (putback), `< 0` means weight was
/// removed (pickup).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightEvent {
    /// Timestamp of the first active sample
    pub trigger_begin: f64,
    /// Timestamp of the last active sample
    pub trigger_end: f64,
    /// Timestamp of the highest standard deviation inside the run
    pub peak_time: f64,
    pub n_begin: usize,
    pub n_end: usize,
    /// Shelf-level mean weight change (grams)
    pub delta_weight: f64,
    pub gondola_id: u32,
    pub shelf_id: u32,
    /// Per-plate mean weight change, index = plate − 1
    pub delta_weights: Vec<f64>,
}

impl WeightEvent {
    pub fn is_putback(&self) -> bool {
        self.delta_weight > 0.0
    }

    /// Plate with the largest absolute weight change (plate 1 when all plates
    /// are flat).
    pub fn most_likely_position(&self) -> Position {
        let mut best = 0.0;
        let mut plate = 1;
        for (i, d) in self.delta_weights.iter().enumerate() {
            if d.abs() > best {
                best = d.abs();
                plate = i as u32 + 1;
            }
        }
        Position::new(self.gondola_id, self.shelf_id, plate)
    }

    /// Plates whose change covers at least `coverage × |delta_weight|`.
    pub fn positions_above(&self, coverage: f64) -> Vec<Position> {
        let threshold = coverage * self.delta_weight.abs();
        self.delta_weights
            .iter()
            .enumerate()
            .filter(|(_, d)| d.abs() >= threshold)
            .map(|(i, _)| Position::new(self.gondola_id, self.shelf_id, i as u32 + 1))
            .collect()
    }
}

impl fmt::Display for WeightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}] Δw={:.1}g peak={:.3} G{}/S{} plates=[",
            self.trigger_begin,
            self.trigger_end,
            self.delta_weight,
            self.peak_time,
            self.gondola_id,
            self.shelf_id
        )?;
        for (i, d) in self.delta_weights.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{d:.1}")?;
        }
        f.write_str("]")
    }
}
