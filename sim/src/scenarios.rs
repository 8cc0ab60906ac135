//! Scenario definitions.
//!
//! Each scenario is a named store + customer script. All scenarios are
//! deterministic given the same seed.

use crate::{
    replay::SessionLog,
    shopper::Shopper,
    store::{SimStore, GONDOLA_SPACING},
    weight_sim::{SensorParams, SensorSimulator},
};
use checkout_core::types::{Coordinate, Position};
use serde::{Deserialize, Serialize};

/// Session start used for generated timestamps (seconds since epoch).
pub const SCENARIO_EPOCH: f64 = 1_580_000_000.0;

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// One customer takes one can of cola
    SinglePickup,
    /// One customer takes two chocolate bars and returns one
    PickupAndPutback,
    /// Two customers shopping at different gondolas
    TwoCustomers,
    /// One customer grabs cola and cereal from the same shelf at once
    MultiPlateSplit,
}

/// A fully configured session scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    /// Seconds
    pub duration: f64,
    pub store: SimStore,
    pub shoppers: Vec<Shopper>,
    pub sensors: SensorParams,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::SinglePickup => Self::single_pickup(seed),
            ScenarioKind::PickupAndPutback => Self::pickup_and_putback(seed),
            ScenarioKind::TwoCustomers => Self::two_customers(seed),
            ScenarioKind::MultiPlateSplit => Self::multi_plate_split(seed),
        }
    }

    fn new(name: &str, seed: u64, duration: f64, shoppers: Vec<Shopper>) -> Self {
        Self {
            name: name.to_owned(),
            seed,
            duration,
            store: SimStore::standard(),
            shoppers,
            sensors: SensorParams::default(),
        }
    }

    fn single_pickup(seed: u64) -> Self {
        let shopper = Shopper::new("1", in_front_of(1, 0.2))
            .pickup(8.0, COLA, Position::new(1, 2, 1), 1);
        Self::new("single_pickup", seed, 16.0, vec![shopper])
    }

    fn pickup_and_putback(seed: u64) -> Self {
        let plate = Position::new(1, 4, 3);
        let shopper = Shopper::new("1", in_front_of(1, 0.3))
            .pickup(6.0, CHOCOLATE, plate, 2)
            .putback(14.0, CHOCOLATE, plate, 1);
        Self::new("pickup_and_putback", seed, 20.0, vec![shopper])
    }

    fn two_customers(seed: u64) -> Self {
        let first = Shopper::new("1", in_front_of(1, 0.4))
            .pickup(6.0, COLA, Position::new(1, 2, 2), 1)
            .pickup(18.0, MAC_AND_CHEESE, Position::new(1, 4, 9), 1);
        let second = Shopper::new("2", in_front_of(3, 0.1))
            .pickup(12.0, COFFEE, Position::new(3, 1, 2), 2);
        Self::new("two_customers", seed, 24.0, vec![first, second])
    }

    fn multi_plate_split(seed: u64) -> Self {
        let shopper = Shopper::new("1", in_front_of(1, 0.4))
            .pickup(8.0, COLA, Position::new(1, 2, 2), 1)
            .pickup(8.0, CEREAL, Position::new(1, 2, 7), 1);
        Self::new("multi_plate_split", seed, 16.0, vec![shopper])
    }

    /// Generate sensor data and ground truth.
    pub fn simulate(&self) -> SessionLog {
        let mut sensors = SensorSimulator::new(self.sensors.clone(), self.seed);
        let readings = sensors.readings(&self.store, &self.shoppers, SCENARIO_EPOCH, self.duration);
        let frames = sensors.target_frames(&self.shoppers, SCENARIO_EPOCH, self.duration);

        let mut ground_truth: Vec<_> = self.shoppers.iter().flat_map(Shopper::ground_truth).collect();
        ground_truth.sort_by(|a, b| a.0.total_cmp(&b.0));

        SessionLog {
            scenario_name: self.name.clone(),
            seed: self.seed,
            duration: self.duration,
            video_start_time: None,
            products: self.store.records(),
            planogram: self.store.planogram_entries(),
            geometry: self.store.geometry(),
            readings,
            frames,
            ground_truth: ground_truth.into_iter().map(|(_, e)| e).collect(),
        }
    }
}

pub const COLA: &str = "049000028911";
pub const CEREAL: &str = "016000275287";
pub const CHOCOLATE: &str = "034000002405";
pub const MAC_AND_CHEESE: &str = "021000658831";
pub const COFFEE: &str = "011110038364";

/// Standing point 0.7 m in front of `gondola`, `along` metres from its edge.
fn in_front_of(gondola: u32, along: f64) -> Coordinate {
    Coordinate::new(GONDOLA_SPACING * (gondola - 1) as f64 + along, -0.7, 0.0)
}
