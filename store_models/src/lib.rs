//! `store_models`: JSON document models for store metadata and recorded
//! sessions, with conversions into `checkout_core` types.

pub mod dump;
pub mod plate_data;
pub mod products;
pub mod store_meta;
pub mod targets;

pub use dump::SessionDump;
pub use plate_data::PlateDataDoc;
pub use products::{load_store, PlanogramDoc, ProductDoc};
pub use store_meta::StoreMeta;
pub use targets::{TargetsDoc, INCH_TO_METER};
