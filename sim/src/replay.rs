//! Replay: serialize/deserialize session logs for offline re-processing.

use checkout_core::{
    catalog::{ProductCatalog, ProductRecord},
    geometry::StoreGeometry,
    metrics::GroundTruthEvent,
    planogram::{Planogram, PlanogramEntry},
    session::{SessionConfig, SessionOutput, SessionPipeline},
    tracker::{RecordedReadings, RecordedTargets, TargetFrame},
    types::PlateReading,
};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A full recorded session: store layout, sensor streams and ground truth.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionLog {
    pub scenario_name: String,
    pub seed: u64,
    pub duration: f64,
    #[serde(default)]
    pub video_start_time: Option<f64>,
    pub products: Vec<ProductRecord>,
    pub planogram: Vec<PlanogramEntry>,
    pub geometry: StoreGeometry,
    /// All weight readings in chronological order
    pub readings: Vec<PlateReading>,
    /// Tracker frames in chronological order
    pub frames: Vec<TargetFrame>,
    /// One entry per item moved, in time order
    pub ground_truth: Vec<GroundTruthEvent>,
}

impl SessionLog {
    pub fn store(&self) -> (ProductCatalog, Planogram) {
        let mut catalog = ProductCatalog::from_records(self.products.iter().cloned());
        let planogram = Planogram::load(&self.planogram, &mut catalog);
        (catalog, planogram)
    }

    pub fn sources(&self) -> (RecordedReadings, RecordedTargets) {
        (
            RecordedReadings::new(self.readings.clone()),
            RecordedTargets::new(self.frames.clone()),
        )
    }

    /// Pipeline over this log's store. A recorded video start time overrides
    /// the one in `config`.
    pub fn pipeline(&self, mut config: SessionConfig) -> SessionPipeline {
        if self.video_start_time.is_some() {
            config.video_start_time = self.video_start_time;
        }
        let (catalog, planogram) = self.store();
        SessionPipeline::new(config, catalog, planogram, self.geometry.clone())
    }

    pub fn run(&self, config: SessionConfig) -> checkout_core::Result<SessionOutput> {
        let (readings, targets) = self.sources();
        self.pipeline(config).run(&readings, &targets)
    }
}

/// Save a session log to a JSON file.
pub fn save_log(log: &SessionLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, log)?;
    Ok(())
}

/// Load a session log from a JSON file.
pub fn load_log(path: &Path) -> anyhow::Result<SessionLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: SessionLog = serde_json::from_reader(reader)?;
    Ok(log)
}
