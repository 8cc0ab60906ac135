//! Store geometry: (gondola, shelf, plate) → absolute 3D coordinate.
//!
//! Every level of the store hierarchy carries a translation relative to its
//! parent. The absolute position of a plate is the sum of the gondola, shelf
//! and plate translations. Gondola 5 is mounted rotated by 90°, so its shelf
//! and plate offsets are applied as (−y, x, z).

use crate::{
    error::{CheckoutError, Result},
    types::Coordinate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gondola whose local frame is rotated by 90° about z.
pub const ROTATED_GONDOLA: u32 = 5;

/// Translation tables keyed by `"{g}"`, `"{g}_{s}"` and `"{g}_{s}_{p}"`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreGeometry {
    pub gondolas: HashMap<String, Coordinate>,
    pub shelves: HashMap<String, Coordinate>,
    pub plates: HashMap<String, Coordinate>,
}

pub fn gondola_key(gondola: u32) -> String {
    gondola.to_string()
}

pub fn shelf_key(gondola: u32, shelf: u32) -> String {
    format!("{gondola}_{shelf}")
}

pub fn plate_key(gondola: u32, shelf: u32, plate: u32) -> String {
    format!("{gondola}_{shelf}_{plate}")
}

impl StoreGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_gondola(&mut self, gondola: u32, translation: Coordinate) {
        self.gondolas.insert(gondola_key(gondola), translation);
    }

    pub fn insert_shelf(&mut self, gondola: u32, shelf: u32, translation: Coordinate) {
        self.shelves.insert(shelf_key(gondola, shelf), translation);
    }

    pub fn insert_plate(&mut self, gondola: u32, shelf: u32, plate: u32, translation: Coordinate) {
        self.plates
            .insert(plate_key(gondola, shelf, plate), translation);
    }

    /// Absolute coordinate of a plate.
    ///
    /// Fails when the gondola or shelf translation is unknown. A missing plate
    /// translation is tolerated: the shelf-level coordinate is returned.
    pub fn resolve(&self, gondola: u32, shelf: u32, plate: u32) -> Result<Coordinate> {
        let g_key = gondola_key(gondola);
        let s_key = shelf_key(gondola, shelf);

        let g = self
            .gondolas
            .get(&g_key)
            .ok_or(CheckoutError::MissingMetadata(g_key))?;
        let s = self
            .shelves
            .get(&s_key)
            .ok_or(CheckoutError::MissingMetadata(s_key))?;

        let orient = |t: &Coordinate| {
            if gondola == ROTATED_GONDOLA {
                Coordinate::new(-t.y, t.x, t.z)
            } else {
                *t
            }
        };

        let mut absolute = Coordinate::zeros() + g + orient(s);
        if let Some(p) = self.plates.get(&plate_key(gondola, shelf, plate)) {
            absolute += orient(p);
        }
        Ok(absolute)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
