//! `checkout_core`: weight-event detection and receipt attribution.
//!
//! # Module layout
//! - [`types`] Fundamental types (IDs, positions, readings, targets)
//! - [`error`] Error type and `Result` alias
//! - [`geometry`] Store coordinate resolution
//! - [`catalog`] Product records
//! - [`planogram`] Product placement per plate
//! - [`aggregation`] Readings → per-gondola shelf/plate series
//! - [`rolling`] Moving mean / std
//! - [`detection`] Change-point event detection
//! - [`event`] Weight event type
//! - [`splitter`] Multi-product event splitting
//! - [`scoring`] Product ranking for pickups
//! - [`tracker`] Sensor sources, target window folding
//! - [`association`] Event → customer strategies
//! - [`receipt`] Customer receipts
//! - [`cashier`] Receipt engine
//! - [`session`] Full session orchestrator
//! - [`metrics`] Precision / recall against ground truth

pub mod aggregation;
pub mod association;
pub mod cashier;
pub mod catalog;
pub mod detection;
pub mod error;
pub mod event;
pub mod geometry;
pub mod metrics;
pub mod planogram;
pub mod receipt;
pub mod rolling;
pub mod scoring;
pub mod session;
pub mod splitter;
pub mod tracker;
pub mod types;

pub use association::{Association, AssociationKind, AssociationStrategy};
pub use cashier::{Cashier, CashierConfig, EventOutcome, ProcessedEvent};
pub use catalog::{ProductCatalog, ProductRecord};
pub use error::{CheckoutError, Result};
pub use event::WeightEvent;
pub use geometry::StoreGeometry;
pub use planogram::{Planogram, PlanogramEntry};
pub use receipt::{CustomerReceipt, PurchaseEntry};
pub use session::{SessionConfig, SessionOutput, SessionPipeline};
pub use tracker::{ReadingSource, RecordedReadings, RecordedTargets, TargetFrame, TargetSource};
pub use types::{
    Barcode, BodyPart, Coordinate, PlateReading, Position, RawFrame, Target, TargetId,
};
