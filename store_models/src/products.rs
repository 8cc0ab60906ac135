//! Product and planogram documents.

use checkout_core::{
    catalog::{ProductCatalog, ProductRecord},
    planogram::{Planogram, PlanogramEntry},
    types::{Barcode, Position},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductId {
    #[serde(default)]
    pub barcode_type: String,
    pub id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductMetadata {
    pub name: String,
    pub thumbnail: String,
    pub price: f64,
    pub weight: f64,
}

/// One row of the products collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDoc {
    pub product_id: ProductId,
    pub metadata: ProductMetadata,
}

impl From<&ProductDoc> for ProductRecord {
    fn from(doc: &ProductDoc) -> Self {
        let mut record = ProductRecord::new(
            doc.product_id.id.as_str(),
            doc.metadata.name.clone(),
            doc.metadata.weight,
        );
        record.price = doc.metadata.price;
        record.thumbnail = doc.metadata.thumbnail.clone();
        record
    }
}

/// Product reference inside a planogram row. The id is absent for empty slots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanogramProductId {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GondolaRef {
    pub id: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfRef {
    pub gondola_id: GondolaRef,
    pub shelf_index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateRef {
    pub shelf_id: ShelfRef,
    pub plate_index: u32,
}

impl From<PlateRef> for Position {
    fn from(p: PlateRef) -> Self {
        Position::new(p.shelf_id.gondola_id.id, p.shelf_id.shelf_index, p.plate_index)
    }
}

/// One row of the planogram collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanogramDoc {
    pub planogram_product_id: PlanogramProductId,
    #[serde(default)]
    pub plate_ids: Vec<PlateRef>,
}

impl PlanogramDoc {
    /// Planogram entry, `None` for rows without a product id.
    pub fn to_entry(&self) -> Option<PlanogramEntry> {
        let id = self.planogram_product_id.id.as_deref().filter(|id| !id.is_empty())?;
        Some(PlanogramEntry {
            barcode: Barcode::from(id),
            positions: self.plate_ids.iter().map(|&p| p.into()).collect(),
        })
    }
}

/// Build the catalog and the planogram. Weight overrides and the removal of
/// weightless products are applied by the catalog.
pub fn load_store(products: &[ProductDoc], planogram: &[PlanogramDoc]) -> (ProductCatalog, Planogram) {
    let mut catalog = ProductCatalog::from_records(products.iter().map(ProductRecord::from));
    let entries: Vec<PlanogramEntry> = planogram.iter().filter_map(PlanogramDoc::to_entry).collect();
    let planogram = Planogram::load(&entries, &mut catalog);
    tracing::info!(
        "Loaded {} products ({} dropped), {} planogram cells",
        catalog.len(),
        products.len() - catalog.len(),
        planogram.len()
    );
    (catalog, planogram)
}
