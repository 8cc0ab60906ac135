//! Weight-sensor documents.

use checkout_core::types::{PlateReading, RawFrame};
use serde::{Deserialize, Serialize};

/// One plate-data message: `data[frame][row][col]` in grams. Dead cells are
/// stored as `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlateDataDoc {
    pub gondola_id: u32,
    /// Seconds since epoch
    pub timestamp: f64,
    pub data: Vec<Vec<Vec<Option<f64>>>>,
}

impl From<&PlateDataDoc> for PlateReading {
    fn from(doc: &PlateDataDoc) -> Self {
        let samples = doc
            .data
            .iter()
            .map(|frame| -> RawFrame {
                frame
                    .iter()
                    .map(|row| row.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
                    .collect()
            })
            .collect();
        PlateReading {
            gondola_id: doc.gondola_id,
            timestamp: doc.timestamp,
            samples,
        }
    }
}

impl From<&PlateReading> for PlateDataDoc {
    fn from(reading: &PlateReading) -> Self {
        let data = reading
            .samples
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .map(|row| row.iter().map(|&v| (!v.is_nan()).then_some(v)).collect())
                    .collect()
            })
            .collect();
        Self {
            gondola_id: reading.gondola_id,
            timestamp: reading.timestamp,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_cells_become_nan() {
        let doc: PlateDataDoc = serde_json::from_str(
            r#"{"gondola_id": 2, "timestamp": 1580000000.5,
                "data": [[[null, null], [null, 125.5]]]}"#,
        )
        .unwrap();
        let reading = PlateReading::from(&doc);
        assert_eq!(reading.gondola_id, 2);
        assert!(reading.samples[0][0][0].is_nan());
        assert_eq!(reading.samples[0][1][1], 125.5);
        assert_eq!(PlateDataDoc::from(&reading), doc);
    }
}
