//! Product catalog: barcode → product record, in load order.

use crate::types::{Barcode, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Catalog entries whose recorded weight is known to be wrong, with the
/// weight measured on the shelf scales (grams).
pub const WEIGHT_CORRECTIONS: [(&str, f64); 2] =
    [("898999010007", 538.0), ("041508922487", 1064.0)];

/// A stocked product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: Barcode,
    pub name: String,
    /// Grams
    pub weight: f64,
    pub price: f64,
    pub thumbnail: String,
    /// Plate slots holding this product. Grows on planogram load and putbacks.
    #[serde(default)]
    pub positions: BTreeSet<Position>,
}

impl ProductRecord {
    pub fn new(barcode: impl Into<Barcode>, name: impl Into<String>, weight: f64) -> Self {
        Self {
            barcode: barcode.into(),
            name: name.into(),
            weight,
            price: 0.0,
            thumbnail: String::new(),
            positions: BTreeSet::new(),
        }
    }
}

/// All products of the store, keyed by barcode.
///
/// Iteration follows insertion order so that score ties resolve the same way
/// on every run.
#[derive(Clone, Debug, Default)]
pub struct ProductCatalog {
    products: Vec<ProductRecord>,
    index: HashMap<Barcode, usize>,
}

impl ProductCatalog {
    /// Build a catalog, dropping weightless entries and applying
    /// [`WEIGHT_CORRECTIONS`].
    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Add or replace a product. Weightless products are ignored.
    pub fn insert(&mut self, mut record: ProductRecord) {
        if record.weight == 0.0 {
            tracing::debug!("Skipping weightless product {}", record.barcode);
            return;
        }
        if let Some((_, w)) = WEIGHT_CORRECTIONS
            .iter()
            .find(|(code, _)| *code == record.barcode.as_str())
        {
            record.weight = *w;
        }
        match self.index.get(&record.barcode) {
            Some(&i) => self.products[i] = record,
            None => {
                self.index.insert(record.barcode.clone(), self.products.len());
                self.products.push(record);
            }
        }
    }

    pub fn get(&self, barcode: &Barcode) -> Option<&ProductRecord> {
        self.index.get(barcode).map(|&i| &self.products[i])
    }

    pub fn get_mut(&mut self, barcode: &Barcode) -> Option<&mut ProductRecord> {
        self.index.get(barcode).map(|&i| &mut self.products[i])
    }

    pub fn contains(&self, barcode: &Barcode) -> bool {
        self.index.contains_key(barcode)
    }

    /// Products in load order.
    pub fn iter(&self) -> impl Iterator<Item = &ProductRecord> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
