//! Customer association: which tracked target caused a weight event.
//!
//! Every strategy compares the event coordinate against the body parts of the
//! targets seen during the event window:
//! - [`NaiveAssociation`]: head distance only
//! - [`ClosestAssociation`]: closest confident body part
//! - [`ConfidenceWeightedAssociation`]: confidence-weighted mean distance
//!
//! Strategies that cannot rank any target fall back to the first target of
//! the window and report it as [`Association::FallbackArbitrary`].

use crate::{
    tracker::TargetWindow,
    types::{Coordinate, TargetId},
};
use serde::{Deserialize, Serialize};

/// Minimum confidence for a body part to be used by [`ClosestAssociation`].
pub const BODY_THRESH: f64 = 0.8;

/// Outcome of associating an event with a customer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Association {
    /// The target was selected on distance evidence.
    Matched(TargetId),
    /// No evidence was usable; the first target of the window was taken.
    FallbackArbitrary(TargetId),
}

impl Association {
    pub fn target_id(&self) -> &TargetId {
        match self {
            Association::Matched(id) | Association::FallbackArbitrary(id) => id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Association::FallbackArbitrary(_))
    }
}

/// Picks the customer responsible for an event at `coordinate`.
pub trait AssociationStrategy {
    fn associate(&self, coordinate: &Coordinate, targets: &TargetWindow) -> Option<Association>;
}

/// Selectable association strategies.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    #[default]
    Naive,
    Closest,
    ConfidenceWeighted,
}

impl AssociationKind {
    pub fn strategy(self) -> Box<dyn AssociationStrategy + Send + Sync> {
        match self {
            AssociationKind::Naive => Box::new(NaiveAssociation),
            AssociationKind::Closest => Box::new(ClosestAssociation::default()),
            AssociationKind::ConfidenceWeighted => Box::new(ConfidenceWeightedAssociation),
        }
    }
}

// ---------------------------------------------------------------------------
// Naive
// ---------------------------------------------------------------------------

/// Nearest head. Targets without a head are ignored; the first of several
/// equidistant heads wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveAssociation;

impl AssociationStrategy for NaiveAssociation {
    fn associate(&self, coordinate: &Coordinate, targets: &TargetWindow) -> Option<Association> {
        let mut best: Option<(&TargetId, f64)> = None;
        for target in targets.iter() {
            let Some(head) = &target.head else { continue };
            let d = head.distance_to(coordinate);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((&target.id, d));
            }
        }
        best.map(|(id, _)| Association::Matched(id.clone()))
    }
}

// ---------------------------------------------------------------------------
// Closest body part
// ---------------------------------------------------------------------------

/// Nearest body part among parts tracked with confidence above `min_confidence`.
#[derive(Clone, Copy, Debug)]
pub struct ClosestAssociation {
    pub min_confidence: f64,
}

impl Default for ClosestAssociation {
    fn default() -> Self {
        Self {
            min_confidence: BODY_THRESH,
        }
    }
}

impl AssociationStrategy for ClosestAssociation {
    fn associate(&self, coordinate: &Coordinate, targets: &TargetWindow) -> Option<Association> {
        let mut best: Option<(&TargetId, f64)> = None;
        for target in targets.iter() {
            for part in target.body_parts() {
                if part.confidence <= self.min_confidence {
                    continue;
                }
                let d = part.distance_to(coordinate);
                // later targets win ties
                if best.map_or(true, |(_, best_d)| d <= best_d) {
                    best = Some((&target.id, d));
                }
            }
        }
        match best {
            Some((id, _)) => Some(Association::Matched(id.clone())),
            None => fallback(targets),
        }
    }
}

// ---------------------------------------------------------------------------
// Confidence weighted
// ---------------------------------------------------------------------------

/// Minimum of `Σ dᵢ·cᵢ / Σ cᵢ` over each target's body parts. A target whose
/// parts all have zero confidence scores +∞.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfidenceWeightedAssociation;

impl ConfidenceWeightedAssociation {
    pub fn weighted_distance(coordinate: &Coordinate, target: &crate::types::Target) -> f64 {
        let (num, den) = target.body_parts().fold((0.0, 0.0), |(num, den), part| {
            (
                num + part.distance_to(coordinate) * part.confidence,
                den + part.confidence,
            )
        });
        if den == 0.0 {
            f64::INFINITY
        } else {
            num / den
        }
    }
}

impl AssociationStrategy for ConfidenceWeightedAssociation {
    fn associate(&self, coordinate: &Coordinate, targets: &TargetWindow) -> Option<Association> {
        let mut best: Option<(&TargetId, f64)> = None;
        for target in targets.iter() {
            let score = Self::weighted_distance(coordinate, target);
            if score.is_infinite() {
                continue;
            }
            if best.map_or(true, |(_, best_s)| score <= best_s) {
                best = Some((&target.id, score));
            }
        }
        match best {
            Some((id, _)) => Some(Association::Matched(id.clone())),
            None => fallback(targets),
        }
    }
}

fn fallback(targets: &TargetWindow) -> Option<Association> {
    let first = targets.iter().next()?;
    tracing::debug!("No usable body part; falling back to {}", first.id);
    Some(Association::FallbackArbitrary(first.id.clone()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyPart, Target};

    fn at(x: f64, confidence: f64) -> BodyPart {
        BodyPart::new(Coordinate::new(x, 0.0, 0.0), confidence)
    }

    fn window(targets: Vec<Target>) -> TargetWindow {
        let mut w = TargetWindow::default();
        for t in targets {
            w.upsert(t);
        }
        w
    }

    #[test]
    fn naive_picks_nearest_head() {
        let w = window(vec![
            Target::with_head("1", at(3.0, 0.9)),
            Target::with_head("2", at(1.0, 0.9)),
            Target::with_head("3", at(1.0, 0.9)),
        ]);
        let assoc = NaiveAssociation.associate(&Coordinate::zeros(), &w);
        assert_eq!(assoc, Some(Association::Matched("2".into())));
    }

    #[test]
    fn naive_without_heads_is_none() {
        let mut headless = Target::with_head("1", at(0.0, 1.0));
        headless.head = None;
        headless.left_hand = Some(at(0.1, 1.0));
        assert_eq!(NaiveAssociation.associate(&Coordinate::zeros(), &window(vec![headless])), None);
        assert_eq!(NaiveAssociation.associate(&Coordinate::zeros(), &TargetWindow::default()), None);
    }

    #[test]
    fn closest_uses_confident_hands() {
        let mut reaching = Target::with_head("far", at(2.0, 0.9));
        reaching.right_hand = Some(at(0.2, 0.95));
        let near_head = Target::with_head("near", at(0.5, 0.9));
        let w = window(vec![near_head, reaching]);
        let assoc = ClosestAssociation::default().associate(&Coordinate::zeros(), &w);
        assert_eq!(assoc, Some(Association::Matched("far".into())));
    }

    #[test]
    fn closest_ties_go_to_later_target() {
        let w = window(vec![
            Target::with_head("a", at(1.0, 0.9)),
            Target::with_head("b", at(-1.0, 0.9)),
        ]);
        let assoc = ClosestAssociation::default().associate(&Coordinate::zeros(), &w);
        assert_eq!(assoc.unwrap().target_id(), &TargetId::from("b"));
    }

    #[test]
    fn closest_falls_back_when_nothing_is_confident() {
        let w = window(vec![
            Target::with_head("a", at(5.0, 0.8)),
            Target::with_head("b", at(0.0, 0.1)),
        ]);
        let assoc = ClosestAssociation::default()
            .associate(&Coordinate::zeros(), &w)
            .unwrap();
        assert!(assoc.is_fallback());
        assert_eq!(assoc.target_id(), &TargetId::from("a"));
    }

    #[test]
    fn confidence_weighted_mean_distance() {
        let mut t = Target::with_head("a", at(1.0, 1.0));
        t.left_hand = Some(at(3.0, 3.0));
        let d = ConfidenceWeightedAssociation::weighted_distance(&Coordinate::zeros(), &t);
        assert!((d - 2.5).abs() < 1e-12);

        let mut other = Target::with_head("b", at(2.0, 1.0));
        other.right_hand = Some(at(2.0, 1.0));
        let assoc = ConfidenceWeightedAssociation.associate(&Coordinate::zeros(), &window(vec![t, other]));
        assert_eq!(assoc, Some(Association::Matched("b".into())));
    }

    #[test]
    fn confidence_weighted_zero_confidence_is_infinite() {
        let w = window(vec![
            Target::with_head("a", at(0.0, 0.0)),
            Target::with_head("b", at(9.0, 0.5)),
        ]);
        let assoc = ConfidenceWeightedAssociation.associate(&Coordinate::zeros(), &w);
        assert_eq!(assoc, Some(Association::Matched("b".into())));

        let all_zero = window(vec![Target::with_head("z", at(0.0, 0.0))]);
        let assoc = ConfidenceWeightedAssociation
            .associate(&Coordinate::zeros(), &all_zero)
            .unwrap();
        assert_eq!(assoc, Association::FallbackArbitrary("z".into()));
    }

    #[test]
    fn kind_builds_matching_strategy() {
        let w = window(vec![Target::with_head("1", at(0.0, 0.9))]);
        for kind in [
            AssociationKind::Naive,
            AssociationKind::Closest,
            AssociationKind::ConfidenceWeighted,
        ] {
            let assoc = kind.strategy().associate(&Coordinate::zeros(), &w).unwrap();
            assert_eq!(assoc.target_id(), &TargetId::from("1"));
        }
        let parsed: AssociationKind = serde_json::from_str("\"confidence_weighted\"").unwrap();
        assert_eq!(parsed, AssociationKind::ConfidenceWeighted);
    }
}
