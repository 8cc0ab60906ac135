//! Sensor sources and per-event target windows.
//!
//! The camera tracker emits frames of targets; the cashier asks for the
//! frames overlapping an event and folds them into one [`TargetWindow`] with
//! [`fold_targets`].

use crate::types::{PlateReading, Target, TargetId};
use serde::{Deserialize, Serialize};

/// All targets reported by the tracker at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetFrame {
    pub timestamp: f64,
    pub targets: Vec<Target>,
}

/// Source of weight readings for a session.
pub trait ReadingSource {
    /// Readings at or after `session_start`, any gondola, in time order.
    fn plate_readings(&self, session_start: f64) -> Vec<PlateReading>;
}

/// Source of tracker frames for a session.
pub trait TargetSource {
    /// Frames with `begin <= timestamp < end`.
    fn frames_in_window(&self, begin: f64, end: f64) -> Vec<TargetFrame>;
}

// ---------------------------------------------------------------------------
// TargetWindow
// ---------------------------------------------------------------------------

/// Latest observation of every target seen in an event window, in first-seen
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetWindow {
    targets: Vec<Target>,
}

impl TargetWindow {
    /// Insert `target`, replacing an earlier observation with the same id in
    /// place.
    pub fn upsert(&mut self, target: Target) {
        match self.targets.iter_mut().find(|t| t.id == target.id) {
            Some(slot) => *slot = target,
            None => self.targets.push(target),
        }
    }

    pub fn get(&self, id: &TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| &t.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.targets.iter().map(|t| &t.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Fold the frames of an event window into one observation per target.
///
/// Frames are visited in time order and later observations overwrite earlier
/// ones. Folding stops after the frame at index `i` once `i > n / 2` or once
/// that frame lies past `peak_time`. Frames without targets are skipped
/// before either check.
pub fn fold_targets(mut frames: Vec<TargetFrame>, peak_time: f64) -> TargetWindow {
    frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    let n = frames.len();
    let mut window = TargetWindow::default();
    for (i, frame) in frames.into_iter().enumerate() {
        if frame.targets.is_empty() {
            continue;
        }
        let timestamp = frame.timestamp;
        for target in frame.targets {
            window.upsert(target);
        }
        if i > n / 2 || timestamp > peak_time {
            break;
        }
    }
    window
}

// ---------------------------------------------------------------------------
// In-memory sources
// ---------------------------------------------------------------------------

/// Recorded tracker frames, e.g. from a replay log.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordedTargets {
    pub frames: Vec<TargetFrame>,
}

impl RecordedTargets {
    pub fn new(mut frames: Vec<TargetFrame>) -> Self {
        frames.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { frames }
    }
}

impl TargetSource for RecordedTargets {
    fn frames_in_window(&self, begin: f64, end: f64) -> Vec<TargetFrame> {
        self.frames
            .iter()
            .filter(|f| f.timestamp >= begin && f.timestamp < end)
            .cloned()
            .collect()
    }
}

/// Recorded weight readings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordedReadings {
    pub readings: Vec<PlateReading>,
}

impl RecordedReadings {
    pub fn new(mut readings: Vec<PlateReading>) -> Self {
        readings.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self { readings }
    }
}

impl ReadingSource for RecordedReadings {
    fn plate_readings(&self, session_start: f64) -> Vec<PlateReading> {
        self.readings
            .iter()
            .filter(|r| r.timestamp >= session_start)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyPart, Coordinate};

    fn frame(t: f64, ids: &[(&str, f64)]) -> TargetFrame {
        TargetFrame {
            timestamp: t,
            targets: ids
                .iter()
                .map(|&(id, x)| {
                    Target::with_head(id, BodyPart::new(Coordinate::new(x, 0.0, 0.0), 0.9))
                })
                .collect(),
        }
    }

    fn head_x(w: &TargetWindow, id: &str) -> f64 {
        w.get(&id.into()).unwrap().head.unwrap().position.x
    }

    #[test]
    fn later_observations_overwrite_earlier() {
        let frames = vec![frame(1.0, &[("a", 1.0)]), frame(0.0, &[("a", 0.0), ("b", 5.0)])];
        let w = fold_targets(frames, 10.0);
        assert_eq!(w.len(), 2);
        assert_eq!(head_x(&w, "a"), 1.0);
        let ids: Vec<&TargetId> = w.ids().collect();
        assert_eq!(ids, [&TargetId::from("a"), &TargetId::from("b")]);
    }

    #[test]
    fn stops_after_peak_time() {
        let frames = vec![
            frame(0.0, &[("a", 0.0)]),
            frame(1.0, &[("a", 1.0)]),
            frame(2.0, &[("a", 2.0), ("late", 0.0)]),
            frame(3.0, &[("a", 3.0)]),
            frame(4.0, &[("a", 4.0)]),
            frame(5.0, &[("a", 5.0)]),
        ];
        // frame at 1.0 is past the peak and is the last one folded
        let w = fold_targets(frames, 0.5);
        assert_eq!(head_x(&w, "a"), 1.0);
        assert!(w.get(&"late".into()).is_none());
    }

    #[test]
    fn stops_past_half_of_the_frames() {
        let frames: Vec<TargetFrame> = (0..6).map(|i| frame(i as f64, &[("a", i as f64)])).collect();
        // n = 6: frames 0..=4 are folded (4 > 3 triggers the stop)
        let w = fold_targets(frames, 100.0);
        assert_eq!(head_x(&w, "a"), 4.0);
    }

    #[test]
    fn empty_frames_are_skipped_before_checks() {
        let frames = vec![
            frame(0.0, &[]),
            frame(1.0, &[]),
            frame(2.0, &[("a", 2.0)]),
            frame(3.0, &[("b", 3.0)]),
        ];
        let w = fold_targets(frames, 0.0);
        // frame 2 is past the peak: folded, then the loop stops
        assert_eq!(w.len(), 1);
        assert!(w.get(&"a".into()).is_some());
        assert!(fold_targets(Vec::new(), 0.0).is_empty());
    }

    #[test]
    fn recorded_window_is_half_open() {
        let source = RecordedTargets::new(vec![
            frame(2.0, &[("c", 0.0)]),
            frame(1.0, &[("b", 0.0)]),
            frame(0.0, &[("a", 0.0)]),
        ]);
        let frames = source.frames_in_window(0.0, 2.0);
        let times: Vec<f64> = frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(times, [0.0, 1.0]);
    }

    #[test]
    fn readings_filtered_by_session_start() {
        let reading = |t: f64| PlateReading {
            gondola_id: 1,
            timestamp: t,
            samples: Vec::new(),
        };
        let source = RecordedReadings::new(vec![reading(3.0), reading(1.0), reading(2.0)]);
        let got: Vec<f64> = source.plate_readings(2.0).iter().map(|r| r.timestamp).collect();
        assert_eq!(got, [2.0, 3.0]);
    }
}
