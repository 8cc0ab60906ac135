//! `sim`: synthetic shopping sessions (store layout, shoppers, shelf and
//! tracker sensors) and replay logs.

pub mod replay;
pub mod scenarios;
pub mod shopper;
pub mod store;
pub mod weight_sim;

pub use replay::{load_log, save_log, SessionLog};
pub use scenarios::{Scenario, ScenarioKind};
pub use shopper::{ShelfAction, Shopper};
pub use store::{SimStore, StockedProduct};
pub use weight_sim::{SensorParams, SensorSimulator};
