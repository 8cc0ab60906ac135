//! Fundamental types used across the entire workspace.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Absolute store coordinate [x, y, z] in meters.
pub type Coordinate = Vector3<f64>;

/// Gondolas whose shelves only carry 9 physical plates.
pub const NARROW_GONDOLAS: [u32; 3] = [2, 4, 5];

/// Plates per shelf on a regular gondola.
pub const PLATES_PER_SHELF: usize = 12;

/// Plates per shelf on a narrow gondola (see [`NARROW_GONDOLAS`]).
pub const PLATES_PER_NARROW_SHELF: usize = 9;

/// Number of physical plates on each shelf of `gondola`.
pub fn plates_on_gondola(gondola: u32) -> usize {
    if NARROW_GONDOLAS.contains(&gondola) {
        PLATES_PER_NARROW_SHELF
    } else {
        PLATES_PER_SHELF
    }
}

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

/// Product barcode, the catalog key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Barcode(pub String);

impl Barcode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Barcode {
    fn from(s: &str) -> Self {
        Barcode(s.to_owned())
    }
}

/// Tracked customer identifier, as issued by the camera tracker.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub String);

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        TargetId(s.to_owned())
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A plate slot in the store hierarchy. All indices are 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub gondola: u32,
    pub shelf: u32,
    pub plate: u32,
}

impl Position {
    pub fn new(gondola: u32, shelf: u32, plate: u32) -> Self {
        Self {
            gondola,
            shelf,
            plate,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}/S{}/P{}", self.gondola, self.shelf, self.plate)
    }
}

// ---------------------------------------------------------------------------
// PlateReading: one timestamped weight message from a gondola
// ---------------------------------------------------------------------------

/// Number of raw frames the weight collector packs into one reading.
pub const SAMPLES_PER_READING: usize = 12;

/// Raw sensor grid `[row][col]`; row 0 and column 0 are a calibration border.
pub type RawFrame = Vec<Vec<f64>>;

/// A weight message from one gondola.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlateReading {
    pub gondola_id: u32,
    /// Seconds since epoch
    pub timestamp: f64,
    /// `SAMPLES_PER_READING` frames, oldest first. NaN cells are allowed
    /// and travel as JSON `null`.
    #[serde(with = "nullable_frames")]
    pub samples: Vec<RawFrame>,
}

mod nullable_frames {
    use super::RawFrame;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    type Cells = Vec<Vec<Vec<Option<f64>>>>;

    pub fn serialize<S: Serializer>(frames: &[RawFrame], s: S) -> Result<S::Ok, S::Error> {
        let cells: Cells = frames
            .iter()
            .map(|f| {
                f.iter()
                    .map(|row| row.iter().map(|&v| (!v.is_nan()).then_some(v)).collect())
                    .collect()
            })
            .collect();
        cells.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RawFrame>, D::Error> {
        let cells = Cells::deserialize(d)?;
        Ok(cells
            .into_iter()
            .map(|f| {
                f.into_iter()
                    .map(|row| row.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
                    .collect()
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tracked customers
// ---------------------------------------------------------------------------

/// One tracked body part with the tracker's confidence score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyPart {
    pub position: Coordinate,
    pub confidence: f64,
}

impl BodyPart {
    pub fn new(position: Coordinate, confidence: f64) -> Self {
        Self {
            position,
            confidence,
        }
    }

    /// Euclidean distance from this part to `point`.
    pub fn distance_to(&self, point: &Coordinate) -> f64 {
        (self.position - point).norm()
    }
}

/// A customer seen by the tracker during an event window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub head: Option<BodyPart>,
    pub left_hand: Option<BodyPart>,
    pub right_hand: Option<BodyPart>,
    pub valid_entrance: bool,
}

impl Target {
    /// Head-only target, as reported by trackers without wrist keypoints.
    pub fn with_head(id: impl Into<TargetId>, head: BodyPart) -> Self {
        Self {
            id: id.into(),
            head: Some(head),
            left_hand: None,
            right_hand: None,
            valid_entrance: true,
        }
    }

    /// All body parts present on this observation.
    pub fn body_parts(&self) -> impl Iterator<Item = &BodyPart> {
        [&self.head, &self.left_hand, &self.right_hand]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        TargetId(s)
    }
}
