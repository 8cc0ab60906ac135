//! Event splitting: one shelf event → independent per-product-region events.
//!
//! Several plates of a shelf often trigger together because a customer took
//! two different items at once. Plates are grouped by planogram adjacency: an
//! active plate joins the current group when it stocks at least one product
//! already stocked somewhere in that group. Each group becomes a sibling
//! event that keeps the timing of the original one.

use crate::{
    catalog::ProductCatalog,
    event::WeightEvent,
    planogram::Planogram,
    types::{plates_on_gondola, Barcode, Position},
};
use std::collections::BTreeSet;

/// Fraction of the lightest shelf product a plate must move to count.
pub const PLATE_ACTIVE_FRACTION: f64 = 1.0 / 3.0;

/// Splits pickup events using a read-only view of the store.
pub struct EventSplitter<'a> {
    planogram: &'a Planogram,
    catalog: &'a ProductCatalog,
}

impl<'a> EventSplitter<'a> {
    pub fn new(planogram: &'a Planogram, catalog: &'a ProductCatalog) -> Self {
        Self { planogram, catalog }
    }

    /// Split every event. Putbacks pass through unchanged.
    pub fn split_all(&self, events: Vec<WeightEvent>) -> Vec<WeightEvent> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            if event.is_putback() {
                out.push(event);
            } else {
                out.extend(self.split(&event));
            }
        }
        out
    }

    /// Split one pickup event into sibling events, one per plate group.
    ///
    /// A shelf without any known product yields no event.
    pub fn split(&self, event: &WeightEvent) -> Vec<WeightEvent> {
        let groups = self.plate_groups(event);
        let n_slots = event.delta_weights.len();
        groups
            .into_iter()
            .map(|group| {
                let mut delta_weights = vec![0.0; n_slots];
                let mut delta_weight = 0.0;
                for plate in group {
                    let d = event.delta_weights[plate as usize - 1];
                    delta_weights[plate as usize - 1] = d;
                    delta_weight += d;
                }
                WeightEvent {
                    delta_weight,
                    delta_weights,
                    ..event.clone()
                }
            })
            .collect()
    }

    /// Minimum product weight stocked on a shelf, `None` when it is empty.
    pub fn min_weight_on_shelf(&self, gondola: u32, shelf: u32) -> Option<f64> {
        self.planogram
            .products_on_shelf(gondola, shelf)
            .into_iter()
            .filter_map(|b| self.catalog.get(b))
            .map(|p| p.weight)
            .min_by(f64::total_cmp)
    }

    /// Active plates (1-based) grouped by shared-product adjacency.
    fn plate_groups(&self, event: &WeightEvent) -> Vec<Vec<u32>> {
        let Some(min_weight) = self.min_weight_on_shelf(event.gondola_id, event.shelf_id) else {
            tracing::debug!(
                "No known product on G{}/S{}; dropping event",
                event.gondola_id,
                event.shelf_id
            );
            return Vec::new();
        };
        let threshold = min_weight * PLATE_ACTIVE_FRACTION;
        let n_plates = plates_on_gondola(event.gondola_id).min(event.delta_weights.len());

        let pos = |plate: u32| Position::new(event.gondola_id, event.shelf_id, plate);
        let mut groups: Vec<Vec<u32>> = Vec::new();
        // Products stocked anywhere in the current group
        let mut group_products: BTreeSet<&Barcode> = BTreeSet::new();
        for plate in (1..=n_plates as u32).filter(|&p| {
            event.delta_weights[p as usize - 1].abs() >= threshold
        }) {
            let stocked: Vec<&Barcode> = self.planogram.products_at(pos(plate)).collect();
            let joins = stocked.iter().any(|b| group_products.contains(b));
            match groups.last_mut() {
                Some(group) if joins => group.push(plate),
                _ => {
                    groups.push(vec![plate]);
                    group_products.clear();
                }
            }
            group_products.extend(stocked);
        }
        groups
    }
}
