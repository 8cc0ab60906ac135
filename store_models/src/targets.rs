//! Camera-tracker documents.
//!
//! Keypoints are reported in inches and converted to metres on load. A
//! keypoint with an empty `point` object was not detected in that frame.

use checkout_core::{
    tracker::TargetFrame,
    types::{BodyPart, Coordinate, Target},
};
use serde::{Deserialize, Serialize};

pub const INCH_TO_METER: f64 = 0.0254;

/// Tracker state of a customer that entered through the store entrance.
pub const TARGETSTATE_VALID_ENTRANCE: &str = "TARGETSTATE_VALID_ENTRANCE";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointDoc {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointDoc {
    pub point: PointDoc,
    pub score: f64,
}

impl KeypointDoc {
    pub fn to_body_part(&self) -> Option<BodyPart> {
        let PointDoc {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        } = self.point
        else {
            return None;
        };
        Some(BodyPart::new(
            Coordinate::new(x, y, z) * INCH_TO_METER,
            self.score,
        ))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetIdDoc {
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetDoc {
    pub target_id: TargetIdDoc,
    #[serde(default)]
    pub target_state: String,
    #[serde(default)]
    pub head: Option<KeypointDoc>,
    #[serde(default)]
    pub l_wrist: Option<KeypointDoc>,
    #[serde(default)]
    pub r_wrist: Option<KeypointDoc>,
}

impl TargetDoc {
    /// Wrists are only kept when both are reported.
    pub fn to_target(&self) -> Target {
        let (left_hand, right_hand) = match (&self.l_wrist, &self.r_wrist) {
            (Some(l), Some(r)) => (l.to_body_part(), r.to_body_part()),
            _ => (None, None),
        };
        Target {
            id: self.target_id.id.as_str().into(),
            head: self.head.as_ref().and_then(KeypointDoc::to_body_part),
            left_hand,
            right_hand,
            valid_entrance: self.target_state == TARGETSTATE_VALID_ENTRANCE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetList {
    #[serde(default)]
    pub targets: Option<Vec<TargetDoc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetsBody {
    pub targets: TargetList,
}

/// One tracker message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetsDoc {
    pub timestamp: f64,
    pub document: TargetsBody,
}

impl From<&TargetsDoc> for TargetFrame {
    fn from(doc: &TargetsDoc) -> Self {
        let targets = doc
            .document
            .targets
            .targets
            .iter()
            .flatten()
            .map(TargetDoc::to_target)
            .collect();
        TargetFrame {
            timestamp: doc.timestamp,
            targets,
        }
    }
}
