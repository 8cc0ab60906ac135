//! Simulated customers and their shelf interactions.

use checkout_core::{
    metrics::GroundTruthEvent,
    types::{BodyPart, Coordinate, Position, Target},
};
use serde::{Deserialize, Serialize};

/// Seconds a hand stays at the shelf around an action.
pub const REACH_DURATION: f64 = 1.0;

/// Head height above the floor (m).
pub const HEAD_HEIGHT: f64 = 1.6;

/// One pickup or putback.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShelfAction {
    /// Offset from session start (s)
    pub time: f64,
    pub barcode: String,
    pub plate: Position,
    pub count: u32,
    pub putback: bool,
}

/// A customer standing in front of the shelves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Shopper {
    pub id: String,
    /// Where the customer stands (floor point)
    pub standing: Coordinate,
    pub actions: Vec<ShelfAction>,
}

impl Shopper {
    pub fn new(id: &str, standing: Coordinate) -> Self {
        Self {
            id: id.to_owned(),
            standing,
            actions: Vec::new(),
        }
    }

    pub fn pickup(mut self, time: f64, barcode: &str, plate: Position, count: u32) -> Self {
        self.actions.push(ShelfAction {
            time,
            barcode: barcode.to_owned(),
            plate,
            count,
            putback: false,
        });
        self
    }

    pub fn putback(mut self, time: f64, barcode: &str, plate: Position, count: u32) -> Self {
        self.actions.push(ShelfAction {
            time,
            barcode: barcode.to_owned(),
            plate,
            count,
            putback: true,
        });
        self
    }

    /// Action whose reach window contains `t`, if any.
    pub fn reaching_at(&self, t: f64) -> Option<&ShelfAction> {
        self.actions
            .iter()
            .find(|a| (t - a.time).abs() <= REACH_DURATION / 2.0)
    }

    /// Noise-free tracker observation at offset `t`. The right wrist sits on
    /// the shelf while reaching and at hip height otherwise.
    pub fn observe(&self, t: f64, plate_coordinate: impl Fn(Position) -> Coordinate) -> Target {
        let head = self.standing + Coordinate::new(0.0, 0.0, HEAD_HEIGHT);
        let hand = match self.reaching_at(t) {
            Some(action) => plate_coordinate(action.plate),
            None => self.standing + Coordinate::new(0.3, 0.0, 1.0),
        };
        let mut target = Target::with_head(self.id.as_str(), BodyPart::new(head, 0.95));
        target.left_hand = Some(BodyPart::new(
            self.standing + Coordinate::new(-0.3, 0.0, 1.0),
            0.9,
        ));
        target.right_hand = Some(BodyPart::new(hand, 0.9));
        target
    }

    /// One ground-truth entry per item moved.
    pub fn ground_truth(&self) -> Vec<(f64, GroundTruthEvent)> {
        self.actions
            .iter()
            .flat_map(|a| {
                (0..a.count).map(move |_| {
                    (
                        a.time,
                        GroundTruthEvent {
                            customer: self.id.as_str().into(),
                            products: vec![a.barcode.as_str().into()],
                            putback: a.putback,
                        },
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_reaches_plate_during_action() {
        let plate = Position::new(1, 2, 3);
        let shopper = Shopper::new("1", Coordinate::new(0.0, -0.7, 0.0)).pickup(10.0, "x", plate, 1);
        let at_shelf = Coordinate::new(9.0, 9.0, 9.0);
        let t = shopper.observe(10.2, |_| at_shelf);
        assert_eq!(t.right_hand.unwrap().position, at_shelf);
        let t = shopper.observe(12.0, |_| at_shelf);
        assert_ne!(t.right_hand.unwrap().position, at_shelf);
    }

    #[test]
    fn ground_truth_is_per_item() {
        let plate = Position::new(1, 1, 1);
        let shopper = Shopper::new("1", Coordinate::zeros())
            .pickup(5.0, "a", plate, 2)
            .putback(9.0, "a", plate, 1);
        let gt = shopper.ground_truth();
        assert_eq!(gt.len(), 3);
        assert!(gt[2].1.putback);
    }
}
