//! Store-meta documents: gondola, shelf and plate placement.
//!
//! ```json
//! {"gondolas": [{"id": {"id": 1},
//!                "coordinates": {"transform": {"translation": {"x": 0, "y": 0, "z": 0}}}}]}
//! ```
//! Shelves are keyed by `id.gondola_id.id` + `id.shelf_index`, plates by
//! `id.shelf_id.gondola_id.id` + `id.shelf_id.shelf_index` + `id.plate_index`.

use checkout_core::{error::Result, geometry::StoreGeometry, types::Coordinate};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const GONDOLAS_FILE: &str = "Gondolas.json";
pub const SHELVES_FILE: &str = "Shelves.json";
pub const PLATES_FILE: &str = "Plates.json";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Translation> for Coordinate {
    fn from(t: Translation) -> Self {
        Coordinate::new(t.x, t.y, t.z)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Translation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub transform: Transform,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GondolaId {
    pub id: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfId {
    pub gondola_id: GondolaId,
    pub shelf_index: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateId {
    pub shelf_id: ShelfId,
    pub plate_index: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GondolaMeta {
    pub id: GondolaId,
    pub coordinates: Coordinates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShelfMeta {
    pub id: ShelfId,
    pub coordinates: Coordinates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateMeta {
    pub id: PlateId,
    pub coordinates: Coordinates,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GondolasDoc {
    pub gondolas: Vec<GondolaMeta>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ShelvesDoc {
    pub shelves: Vec<ShelfMeta>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlatesDoc {
    pub plates: Vec<PlateMeta>,
}

/// The three store-meta documents of a store.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreMeta {
    pub gondolas: GondolasDoc,
    pub shelves: ShelvesDoc,
    pub plates: PlatesDoc,
}

impl StoreMeta {
    /// Read `Gondolas.json`, `Shelves.json` and `Plates.json` from `dir`.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| fs::read_to_string(dir.join(name));
        Ok(Self {
            gondolas: serde_json::from_str(&read(GONDOLAS_FILE)?)?,
            shelves: serde_json::from_str(&read(SHELVES_FILE)?)?,
            plates: serde_json::from_str(&read(PLATES_FILE)?)?,
        })
    }

    pub fn to_geometry(&self) -> StoreGeometry {
        let mut geometry = StoreGeometry::new();
        for g in &self.gondolas.gondolas {
            geometry.insert_gondola(g.id.id, g.coordinates.transform.translation.into());
        }
        for s in &self.shelves.shelves {
            geometry.insert_shelf(
                s.id.gondola_id.id,
                s.id.shelf_index,
                s.coordinates.transform.translation.into(),
            );
        }
        for p in &self.plates.plates {
            geometry.insert_plate(
                p.id.shelf_id.gondola_id.id,
                p.id.shelf_id.shelf_index,
                p.id.plate_index,
                p.coordinates.transform.translation.into(),
            );
        }
        tracing::debug!(
            "Store geometry: {} gondolas, {} shelves, {} plates",
            self.gondolas.gondolas.len(),
            self.shelves.shelves.len(),
            self.plates.plates.len()
        );
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const GONDOLAS: &str = r#"{"gondolas": [
        {"id": {"id": 1}, "coordinates": {"transform": {"translation": {"x": 1.0, "y": 2.0, "z": 0.0}}}}
    ]}"#;
    const SHELVES: &str = r#"{"shelves": [
        {"id": {"gondola_id": {"id": 1}, "shelf_index": 3},
         "coordinates": {"transform": {"translation": {"x": 0.0, "y": 0.0, "z": 1.5}}}}
    ]}"#;
    const PLATES: &str = r#"{"plates": [
        {"id": {"shelf_id": {"gondola_id": {"id": 1}, "shelf_index": 3}, "plate_index": 2},
         "coordinates": {"transform": {"translation": {"x": 0.25, "y": 0.0, "z": 0.0}}}}
    ]}"#;

    #[test]
    fn parses_and_resolves_plate() {
        let meta = StoreMeta {
            gondolas: serde_json::from_str(GONDOLAS).unwrap(),
            shelves: serde_json::from_str(SHELVES).unwrap(),
            plates: serde_json::from_str(PLATES).unwrap(),
        };
        let c = meta.to_geometry().resolve(1, 3, 2).unwrap();
        assert_abs_diff_eq!(c, Coordinate::new(1.25, 2.0, 1.5));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = StoreMeta::load_dir("/nonexistent/store/meta").unwrap_err();
        assert!(matches!(err, checkout_core::CheckoutError::Io(_)));
    }
}
