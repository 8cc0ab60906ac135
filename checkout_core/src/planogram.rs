//! Planogram: which products are stocked on which plate.

use crate::{
    catalog::ProductCatalog,
    types::{Barcode, Position},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One planogram row: a product declared on a set of plates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanogramEntry {
    pub barcode: Barcode,
    pub positions: Vec<Position>,
}

/// Spatial index `Position → {barcode}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Planogram {
    cells: BTreeMap<Position, BTreeSet<Barcode>>,
}

impl Planogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the planogram from declared entries and record each position on
    /// the matching catalog product. Entries for products missing from the
    /// catalog (e.g. weightless ones) are skipped.
    pub fn load(entries: &[PlanogramEntry], catalog: &mut ProductCatalog) -> Self {
        let mut planogram = Self::new();
        for entry in entries {
            let Some(product) = catalog.get_mut(&entry.barcode) else {
                tracing::debug!("Planogram entry for unknown product {}", entry.barcode);
                continue;
            };
            for &pos in &entry.positions {
                planogram.add(pos, entry.barcode.clone());
                product.positions.insert(pos);
            }
        }
        planogram
    }

    /// Stock `barcode` at `pos`.
    pub fn add(&mut self, pos: Position, barcode: Barcode) {
        self.cells.entry(pos).or_default().insert(barcode);
    }

    /// Products declared on one plate (empty when nothing is stocked there).
    pub fn products_at(&self, pos: Position) -> impl Iterator<Item = &Barcode> {
        self.cells.get(&pos).into_iter().flatten()
    }

    /// Union of products stocked anywhere on a shelf.
    pub fn products_on_shelf(&self, gondola: u32, shelf: u32) -> BTreeSet<&Barcode> {
        let lo = Position::new(gondola, shelf, 0);
        let hi = Position::new(gondola, shelf, u32::MAX);
        self.cells
            .range(lo..=hi)
            .flat_map(|(_, products)| products.iter())
            .collect()
    }

    /// Number of stocked plate slots.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;

    fn entry(code: &str, plates: &[(u32, u32, u32)]) -> PlanogramEntry {
        PlanogramEntry {
            barcode: code.into(),
            positions: plates
                .iter()
                .map(|&(g, s, p)| Position::new(g, s, p))
                .collect(),
        }
    }

    #[test]
    fn load_records_positions_on_products() {
        let mut catalog = ProductCatalog::from_records([
            ProductRecord::new("x", "X", 100.0),
            ProductRecord::new("y", "Y", 200.0),
        ]);
        let planogram = Planogram::load(
            &[
                entry("x", &[(1, 1, 1), (1, 1, 2)]),
                entry("y", &[(1, 1, 2), (1, 2, 1)]),
                entry("ghost", &[(1, 1, 3)]),
            ],
            &mut catalog,
        );
        assert_eq!(planogram.len(), 3);
        assert_eq!(catalog.get(&"x".into()).unwrap().positions.len(), 2);
        assert_eq!(planogram.products_at(Position::new(1, 1, 2)).count(), 2);
        assert_eq!(planogram.products_at(Position::new(1, 1, 3)).count(), 0);
    }

    #[test]
    fn shelf_query_stays_on_shelf() {
        let mut p = Planogram::new();
        p.add(Position::new(1, 1, 1), "a".into());
        p.add(Position::new(1, 1, 12), "b".into());
        p.add(Position::new(1, 2, 1), "c".into());
        p.add(Position::new(2, 1, 1), "d".into());
        let shelf: Vec<&str> = p
            .products_on_shelf(1, 1)
            .into_iter()
            .map(|b| b.as_str())
            .collect();
        assert_eq!(shelf, ["a", "b"]);
    }
}
