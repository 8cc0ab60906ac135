//! A recorded session: every collection of one session in a single JSON file.

use crate::{
    plate_data::PlateDataDoc,
    products::{load_store, PlanogramDoc, ProductDoc},
    targets::TargetsDoc,
};
use checkout_core::{
    catalog::ProductCatalog,
    error::Result,
    metrics::GroundTruthEvent,
    planogram::Planogram,
    tracker::{RecordedReadings, RecordedTargets, TargetFrame},
    types::PlateReading,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDump {
    pub video_start_time: Option<f64>,
    pub products: Vec<ProductDoc>,
    pub planogram: Vec<PlanogramDoc>,
    pub plate_data: Vec<PlateDataDoc>,
    pub targets: Vec<TargetsDoc>,
    /// Labelled actions, when the session was annotated
    pub ground_truth: Vec<GroundTruthEvent>,
}

impl SessionDump {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn store(&self) -> (ProductCatalog, Planogram) {
        load_store(&self.products, &self.planogram)
    }

    pub fn readings(&self) -> RecordedReadings {
        RecordedReadings::new(self.plate_data.iter().map(PlateReading::from).collect())
    }

    pub fn target_frames(&self) -> RecordedTargets {
        RecordedTargets::new(self.targets.iter().map(TargetFrame::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkout_core::tracker::{ReadingSource, TargetSource};

    #[test]
    fn partial_dump_uses_defaults() {
        let dump: SessionDump = serde_json::from_str(
            r#"{"plate_data": [{"gondola_id": 1, "timestamp": 5.0, "data": []},
                               {"gondola_id": 1, "timestamp": 2.0, "data": []}],
                "targets": [{"timestamp": 3.0, "document": {"targets": {"targets": []}}}]}"#,
        )
        .unwrap();
        assert!(dump.video_start_time.is_none());
        assert!(dump.products.is_empty());
        let times: Vec<f64> = dump.readings().plate_readings(0.0).iter().map(|r| r.timestamp).collect();
        assert_eq!(times, [2.0, 5.0]);
        assert_eq!(dump.target_frames().frames_in_window(0.0, 10.0).len(), 1);
    }
}
