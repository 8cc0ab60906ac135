//! Product scoring for pickup events.
//!
//! # Score components
//! - **Arrangement**: the event's plate deltas normalised into a probability
//!   distribution; a product collects the probability of every plate it
//!   occupies on the event shelf.
//! - **Weight**: overlap area between N(|Δw|, σ) and N(product weight, σ).
//!
//! Total = `arrangement · w_arr + weight · w_weight`.

use crate::{
    catalog::ProductCatalog,
    event::WeightEvent,
    planogram::Planogram,
    types::Barcode,
};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;

/// Std dev of the observed event weight (g).
pub const EVENT_WEIGHT_SIGMA: f64 = 10.0;

/// Std dev of a catalog product weight (g).
pub const PRODUCT_WEIGHT_SIGMA: f64 = 10.0;

/// Contribution of each score component to the total.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub arrangement: f64,
    pub weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            arrangement: 0.5,
            weight: 0.5,
        }
    }
}

/// Score of one catalog product for one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductScore {
    pub barcode: Barcode,
    pub arrangement_score: f64,
    pub weight_score: f64,
    pub total: f64,
}

/// Ranks all catalog products for one pickup event.
pub struct ScoreCalculator {
    ranking: Vec<ProductScore>,
    index: HashMap<Barcode, usize>,
}

impl ScoreCalculator {
    pub fn new(
        event: &WeightEvent,
        catalog: &ProductCatalog,
        planogram: &Planogram,
        weights: &ScoreWeights,
    ) -> Self {
        let mut scores: Vec<ProductScore> = catalog
            .iter()
            .map(|p| ProductScore {
                barcode: p.barcode.clone(),
                arrangement_score: 0.0,
                weight_score: gaussian_overlap(
                    event.delta_weight.abs(),
                    EVENT_WEIGHT_SIGMA,
                    p.weight,
                    PRODUCT_WEIGHT_SIGMA,
                ),
                total: 0.0,
            })
            .collect();
        let slot: HashMap<Barcode, usize> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| (s.barcode.clone(), i))
            .collect();

        let prob = plate_distribution(&event.delta_weights);
        for barcode in planogram.products_on_shelf(event.gondola_id, event.shelf_id) {
            let (Some(product), Some(&i)) = (catalog.get(barcode), slot.get(barcode)) else {
                continue;
            };
            scores[i].arrangement_score += product
                .positions
                .iter()
                .filter(|pos| pos.gondola == event.gondola_id && pos.shelf == event.shelf_id)
                .filter_map(|pos| (pos.plate as usize).checked_sub(1).and_then(|i| prob.get(i)))
                .sum::<f64>();
        }

        for s in &mut scores {
            s.total = weights.arrangement * s.arrangement_score + weights.weight * s.weight_score;
        }
        // Stable sort keeps catalog order among equal totals.
        scores.sort_by(|a, b| b.total.total_cmp(&a.total));

        let index = scores
            .iter()
            .enumerate()
            .map(|(i, s)| (s.barcode.clone(), i))
            .collect();
        Self {
            ranking: scores,
            index,
        }
    }

    /// Best `k` products, highest total first.
    pub fn top_k(&self, k: usize) -> &[ProductScore] {
        &self.ranking[..k.min(self.ranking.len())]
    }

    pub fn score_of(&self, barcode: &Barcode) -> Option<&ProductScore> {
        self.index.get(barcode).map(|&i| &self.ranking[i])
    }

    pub fn ranking(&self) -> &[ProductScore] {
        &self.ranking
    }
}

/// Normalise plate deltas into per-plate probabilities.
///
/// A zero sum falls back to a uniform distribution. Mixed-sign deltas that
/// cancel out also land here; that case is kept as is.
pub fn plate_distribution(delta_weights: &[f64]) -> Vec<f64> {
    let total: f64 = delta_weights.iter().sum();
    if total == 0.0 {
        let n = delta_weights.len().max(1) as f64;
        return vec![1.0 / n; delta_weights.len()];
    }
    delta_weights.iter().map(|d| d / total).collect()
}

/// Overlap area of two normal densities N(m1, s1) and N(m2, s2).
///
/// The curves cross at the root of `a·x² + b·x + c = 0`; the overlap is the
/// upper tail of the lower-mean density beyond that point plus the lower tail
/// of the higher-mean density below it. Returns a value in [0, 1].
pub fn gaussian_overlap(m1: f64, s1: f64, m2: f64, s2: f64) -> f64 {
    let (m1, s1, m2, s2) = if m1 > m2 { (m2, s2, m1, s1) } else { (m1, s1, m2, s2) };
    let (Ok(lo), Ok(hi)) = (Normal::new(m1, s1), Normal::new(m2, s2)) else {
        return 0.0;
    };

    let a = 1.0 / (2.0 * s1 * s1) - 1.0 / (2.0 * s2 * s2);
    let b = m2 / (s2 * s2) - m1 / (s1 * s1);
    let c = m1 * m1 / (2.0 * s1 * s1) - m2 * m2 / (2.0 * s2 * s2) - (s2 / s1).ln();

    let Some(x) = intersection(a, b, c, m1, m2) else {
        // identical distributions
        return 1.0;
    };
    (hi.cdf(x) + (1.0 - lo.cdf(x))).clamp(0.0, 1.0)
}

/// Crossing point of the two densities. Prefers the root between the means.
fn intersection(a: f64, b: f64, c: f64, m1: f64, m2: f64) -> Option<f64> {
    const EPS: f64 = 1e-12;
    if a.abs() < EPS {
        if b.abs() < EPS {
            return None;
        }
        return Some(-c / b);
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return Some(-b / (2.0 * a));
    }
    let sq = disc.sqrt();
    let r1 = (-b + sq) / (2.0 * a);
    let r2 = (-b - sq) / (2.0 * a);
    if (m1..=m2).contains(&r2) && !(m1..=m2).contains(&r1) {
        Some(r2)
    } else {
        Some(r1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
