//! Receipt engine: turns sorted weight events into customer receipts.
//!
//! # Processing steps per event
//! 1. Fold the tracker frames of the event window into a [`TargetWindow`]
//!    and open an empty receipt for every newly seen customer
//! 2. Skip the event when nobody was around
//! 3. Resolve the store coordinate of the plate with the largest change
//! 4. Associate the event with a customer
//! 5. Putback: match the weight against the customer's receipt, restock the
//!    planogram, decrement the receipt
//! 6. Pickup: rank products, check the weight, add to the receipt
//!
//! Events that cannot be attributed are recorded as an [`EventOutcome`] and
//! never abort the run.

use crate::{
    association::{Association, AssociationKind, AssociationStrategy},
    catalog::{ProductCatalog, ProductRecord},
    error::CheckoutError,
    event::WeightEvent,
    geometry::StoreGeometry,
    planogram::Planogram,
    receipt::CustomerReceipt,
    scoring::{ScoreCalculator, ScoreWeights},
    tracker::{fold_targets, TargetSource},
    types::{Barcode, TargetId},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the receipt engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashierConfig {
    pub association: AssociationKind,
    /// A putback must move at least this fraction of the product weight
    pub putback_jitter_rate: f64,
    /// A pickup must move at least this fraction of the product weight
    pub pickup_jitter_rate: f64,
    /// Plates moving at least this fraction of a putback get the product
    pub putback_coverage: f64,
    pub score_weights: ScoreWeights,
}

impl Default for CashierConfig {
    fn default() -> Self {
        Self {
            association: AssociationKind::default(),
            putback_jitter_rate: 0.75,
            pickup_jitter_rate: 0.4,
            putback_coverage: 0.2,
            score_weights: ScoreWeights::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventOutcome {
    Purchase(Attribution),
    Putback(Attribution),
    Rejected(RejectReason),
    Skipped(SkipReason),
}

impl EventOutcome {
    pub fn attribution(&self) -> Option<&Attribution> {
        match self {
            EventOutcome::Purchase(a) | EventOutcome::Putback(a) => Some(a),
            _ => None,
        }
    }
}

/// A receipt change caused by an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    pub customer: TargetId,
    pub barcode: Barcode,
    pub quantity: u32,
    /// The customer was picked without distance evidence
    pub fallback: bool,
}

/// Why an attributable event changed no receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The customer holds nothing that could have been returned
    NoPutbackCandidate,
    /// The catalog is empty
    NoScoredProduct,
    /// The weight change is too small for the matched product
    WeightJitter { delta_weight: f64, product_weight: f64 },
}

/// Why an event was not attributed at all.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    NoTargets,
    MissingMetadata(String),
    NoAssociation,
}

/// An event together with what the cashier made of it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub event: WeightEvent,
    pub outcome: EventOutcome,
}

// ---------------------------------------------------------------------------
// Cashier
// ---------------------------------------------------------------------------

/// Owns the store state that events mutate and the receipts they build.
pub struct Cashier {
    pub config: CashierConfig,
    strategy: Box<dyn AssociationStrategy + Send + Sync>,
    catalog: ProductCatalog,
    planogram: Planogram,
    geometry: StoreGeometry,
    receipts: BTreeMap<TargetId, CustomerReceipt>,
}

impl Cashier {
    pub fn new(
        config: CashierConfig,
        catalog: ProductCatalog,
        planogram: Planogram,
        geometry: StoreGeometry,
    ) -> Self {
        let strategy = config.association.strategy();
        Self {
            config,
            strategy,
            catalog,
            planogram,
            geometry,
            receipts: BTreeMap::new(),
        }
    }

    /// Process events in `trigger_begin` order. Events with equal start times
    /// keep their input order.
    pub fn process(
        &mut self,
        mut events: Vec<WeightEvent>,
        targets: &dyn TargetSource,
    ) -> Vec<ProcessedEvent> {
        events.sort_by(|a, b| a.trigger_begin.total_cmp(&b.trigger_begin));
        events
            .into_iter()
            .map(|event| {
                let outcome = self.process_event(&event, targets);
                match &outcome {
                    EventOutcome::Purchase(a) | EventOutcome::Putback(a) => tracing::info!(
                        "{} → {} x{} for {}",
                        event,
                        a.barcode,
                        a.quantity,
                        a.customer
                    ),
                    other => tracing::debug!("{} dropped: {:?}", event, other),
                }
                ProcessedEvent { event, outcome }
            })
            .collect()
    }

    fn process_event(&mut self, event: &WeightEvent, source: &dyn TargetSource) -> EventOutcome {
        let frames = source.frames_in_window(event.trigger_begin, event.trigger_end);
        let window = fold_targets(frames, event.peak_time);
        for id in window.ids() {
            self.receipts
                .entry(id.clone())
                .or_insert_with(|| CustomerReceipt::new(id.clone()));
        }
        if window.is_empty() {
            return EventOutcome::Skipped(SkipReason::NoTargets);
        }

        let pos = event.most_likely_position();
        let coordinate = match self.geometry.resolve(pos.gondola, pos.shelf, pos.plate) {
            Ok(c) => c,
            Err(CheckoutError::MissingMetadata(key)) => {
                tracing::warn!("No coordinates for {}: {}", pos, key);
                return EventOutcome::Skipped(SkipReason::MissingMetadata(key));
            }
            Err(e) => {
                tracing::warn!("Cannot locate {}: {}", pos, e);
                return EventOutcome::Skipped(SkipReason::MissingMetadata(e.to_string()));
            }
        };

        let Some(association) = self.strategy.associate(&coordinate, &window) else {
            return EventOutcome::Skipped(SkipReason::NoAssociation);
        };
        if event.is_putback() {
            self.putback(event, association)
        } else {
            self.pickup(event, association)
        }
    }

    fn putback(&mut self, event: &WeightEvent, association: Association) -> EventOutcome {
        let fallback = association.is_fallback();
        let customer = association.target_id().clone();
        let Some(receipt) = self.receipts.get_mut(&customer) else {
            return EventOutcome::Rejected(RejectReason::NoPutbackCandidate);
        };

        // First (product, count) whose total weight is closest to the change
        let mut best: Option<(&ProductRecord, u32, f64)> = None;
        for entry in &receipt.purchases {
            for count in 1..=entry.quantity {
                let err = (entry.product.weight * count as f64 - event.delta_weight).abs();
                if best.map_or(true, |(_, _, e)| err < e) {
                    best = Some((&entry.product, count, err));
                }
            }
        }
        let Some((product, count, _)) = best else {
            return EventOutcome::Rejected(RejectReason::NoPutbackCandidate);
        };
        if event.delta_weight.abs() < self.config.putback_jitter_rate * product.weight {
            return EventOutcome::Rejected(RejectReason::WeightJitter {
                delta_weight: event.delta_weight,
                product_weight: product.weight,
            });
        }
        let barcode = product.barcode.clone();

        receipt.putback(&barcode, count);
        for pos in event.positions_above(self.config.putback_coverage) {
            self.planogram.add(pos, barcode.clone());
            if let Some(record) = self.catalog.get_mut(&barcode) {
                record.positions.insert(pos);
            }
        }
        EventOutcome::Putback(Attribution {
            customer,
            barcode,
            quantity: count,
            fallback,
        })
    }

    fn pickup(&mut self, event: &WeightEvent, association: Association) -> EventOutcome {
        let calc = ScoreCalculator::new(
            event,
            &self.catalog,
            &self.planogram,
            &self.config.score_weights,
        );
        for (rank, s) in calc.top_k(5).iter().enumerate() {
            tracing::debug!(
                "  #{} {} total={:.3} arrangement={:.3} weight={:.3}",
                rank + 1,
                s.barcode,
                s.total,
                s.arrangement_score,
                s.weight_score
            );
        }
        let Some(product) = calc.top_k(1).first().and_then(|s| self.catalog.get(&s.barcode)) else {
            return EventOutcome::Rejected(RejectReason::NoScoredProduct);
        };
        let delta = event.delta_weight.abs();
        if delta < self.config.pickup_jitter_rate * product.weight {
            return EventOutcome::Rejected(RejectReason::WeightJitter {
                delta_weight: event.delta_weight,
                product_weight: product.weight,
            });
        }
        let quantity = ((delta / product.weight).round_ties_even() as u32).max(1);

        let fallback = association.is_fallback();
        let customer = association.target_id().clone();
        self.receipts
            .entry(customer.clone())
            .or_insert_with(|| CustomerReceipt::new(customer.clone()))
            .purchase(product, quantity);
        EventOutcome::Purchase(Attribution {
            customer,
            barcode: product.barcode.clone(),
            quantity,
            fallback,
        })
    }

    pub fn receipts(&self) -> &BTreeMap<TargetId, CustomerReceipt> {
        &self.receipts
    }

    pub fn into_receipts(self) -> BTreeMap<TargetId, CustomerReceipt> {
        self.receipts
    }

    pub fn planogram(&self) -> &Planogram {
        &self.planogram
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
