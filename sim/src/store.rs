//! Synthetic store layout shared by all scenarios.
//!
//! Gondolas stand side by side along x, shelves stack along z and plates run
//! along x inside a shelf. Customers stand in front of the gondolas at
//! negative y.

use checkout_core::{
    catalog::{ProductCatalog, ProductRecord},
    geometry::StoreGeometry,
    planogram::{Planogram, PlanogramEntry},
    types::{plates_on_gondola, Coordinate, Position},
};
use serde::{Deserialize, Serialize};

/// Distance between two gondolas along x (m).
pub const GONDOLA_SPACING: f64 = 2.0;
/// Vertical distance between shelves (m).
pub const SHELF_SPACING: f64 = 0.3;
/// Plate width along x (m).
pub const PLATE_WIDTH: f64 = 0.1;

/// One stocked product and where it sits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StockedProduct {
    pub barcode: String,
    pub name: String,
    /// Grams per item
    pub weight: f64,
    pub positions: Vec<Position>,
    /// Items on each of its plates at session start
    pub items_per_plate: u32,
}

/// Store used by a scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimStore {
    pub gondolas: Vec<u32>,
    pub products: Vec<StockedProduct>,
}

impl SimStore {
    /// Two regular gondolas (1 and 3) with five products.
    pub fn standard() -> Self {
        let on = |g: u32, s: u32, plates: &[u32]| -> Vec<Position> {
            plates.iter().map(|&p| Position::new(g, s, p)).collect()
        };
        let product = |barcode: &str, name: &str, weight: f64, positions: Vec<Position>| StockedProduct {
            barcode: barcode.to_owned(),
            name: name.to_owned(),
            weight,
            positions,
            items_per_plate: 6,
        };
        Self {
            gondolas: vec![1, 3],
            products: vec![
                product("049000028911", "Cola 12oz", 355.0, on(1, 2, &[1, 2])),
                product("016000275287", "Oat cereal", 500.0, on(1, 2, &[7, 8])),
                product("034000002405", "Chocolate bar", 200.0, on(1, 4, &[3, 4])),
                product("021000658831", "Mac and cheese", 250.0, on(1, 4, &[9])),
                product("011110038364", "Ground coffee", 400.0, on(3, 1, &[1, 2, 3])),
            ],
        }
    }

    pub fn product(&self, barcode: &str) -> Option<&StockedProduct> {
        self.products.iter().find(|p| p.barcode == barcode)
    }

    pub fn records(&self) -> Vec<ProductRecord> {
        self.products
            .iter()
            .map(|p| ProductRecord::new(p.barcode.as_str(), p.name.clone(), p.weight))
            .collect()
    }

    pub fn planogram_entries(&self) -> Vec<PlanogramEntry> {
        self.products
            .iter()
            .map(|p| PlanogramEntry {
                barcode: p.barcode.as_str().into(),
                positions: p.positions.clone(),
            })
            .collect()
    }

    pub fn catalog_and_planogram(&self) -> (ProductCatalog, Planogram) {
        let mut catalog = ProductCatalog::from_records(self.records());
        let planogram = Planogram::load(&self.planogram_entries(), &mut catalog);
        (catalog, planogram)
    }

    pub fn geometry(&self) -> StoreGeometry {
        let mut geometry = StoreGeometry::new();
        for &g in &self.gondolas {
            geometry.insert_gondola(g, Coordinate::new(GONDOLA_SPACING * (g - 1) as f64, 0.0, 0.0));
            for s in 1..=12 {
                geometry.insert_shelf(g, s, Coordinate::new(0.0, 0.0, SHELF_SPACING * s as f64));
                for p in 1..=plates_on_gondola(g) as u32 {
                    geometry.insert_plate(
                        g,
                        s,
                        p,
                        Coordinate::new(PLATE_WIDTH * (p - 1) as f64, 0.0, 0.0),
                    );
                }
            }
        }
        geometry
    }

    /// Coordinate of a plate, consistent with [`SimStore::geometry`].
    pub fn plate_coordinate(pos: Position) -> Coordinate {
        Coordinate::new(
            GONDOLA_SPACING * (pos.gondola - 1) as f64 + PLATE_WIDTH * (pos.plate - 1) as f64,
            0.0,
            SHELF_SPACING * pos.shelf as f64,
        )
    }

    /// Initial load of every plate, grams.
    pub fn initial_load(&self, pos: Position) -> f64 {
        self.products
            .iter()
            .filter(|p| p.positions.contains(&pos))
            .map(|p| p.weight * p.items_per_plate as f64)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn plate_coordinate_matches_geometry() {
        let store = SimStore::standard();
        let geometry = store.geometry();
        for pos in [Position::new(1, 2, 7), Position::new(3, 1, 3)] {
            let resolved = geometry.resolve(pos.gondola, pos.shelf, pos.plate).unwrap();
            assert_abs_diff_eq!(resolved, SimStore::plate_coordinate(pos), epsilon = 1e-12);
        }
    }

    #[test]
    fn planogram_covers_all_products() {
        let (catalog, planogram) = SimStore::standard().catalog_and_planogram();
        assert_eq!(catalog.len(), 5);
        assert_eq!(planogram.products_on_shelf(1, 2).len(), 2);
        assert_eq!(SimStore::standard().initial_load(Position::new(1, 4, 9)), 1500.0);
    }
}
