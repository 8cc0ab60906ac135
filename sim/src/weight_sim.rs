//! Sensor simulator: shelf loads → plate readings, shoppers → tracker frames.
//!
//! Generates:
//! - Weight readings of `SAMPLES_PER_READING` frames per gondola, with
//!   uniform per-cell noise and a linear ramp for every load change
//! - Tracker frames with uniform keypoint jitter

use crate::{
    shopper::Shopper,
    store::SimStore,
};
use checkout_core::{
    tracker::TargetFrame,
    types::{plates_on_gondola, BodyPart, PlateReading, Position, RawFrame, SAMPLES_PER_READING},
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Sensor timing and noise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SensorParams {
    /// Seconds between two weight readings
    pub reading_interval: f64,
    /// Half-width of the uniform weight noise per cell (g)
    pub weight_noise: f64,
    /// Seconds for a load change to settle
    pub ramp_duration: f64,
    /// Seconds between two tracker frames
    pub frame_interval: f64,
    /// Half-width of the uniform keypoint jitter (m)
    pub position_noise: f64,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            reading_interval: 0.2,
            weight_noise: 2.0,
            ramp_duration: 0.5,
            frame_interval: 0.1,
            position_noise: 0.02,
        }
    }
}

/// A load change on one plate.
#[derive(Clone, Copy, Debug)]
struct LoadChange {
    time: f64,
    plate: Position,
    grams: f64,
}

pub struct SensorSimulator {
    pub params: SensorParams,
    rng: ChaCha8Rng,
}

impl SensorSimulator {
    pub fn new(params: SensorParams, seed: u64) -> Self {
        Self {
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn uniform(&mut self, half_width: f64) -> f64 {
        self.rng.gen::<f64>() * half_width * 2.0 - half_width
    }

    /// Weight readings of every gondola over `[0, duration)`, stamped from
    /// `epoch`, in time order.
    pub fn readings(
        &mut self,
        store: &SimStore,
        shoppers: &[Shopper],
        epoch: f64,
        duration: f64,
    ) -> Vec<PlateReading> {
        let changes: Vec<LoadChange> = shoppers
            .iter()
            .flat_map(|s| s.actions.iter())
            .filter_map(|a| {
                let weight = store.product(&a.barcode)?.weight;
                let sign = if a.putback { 1.0 } else { -1.0 };
                Some(LoadChange {
                    time: a.time,
                    plate: a.plate,
                    grams: sign * weight * a.count as f64,
                })
            })
            .collect();

        let n_readings = steps_in(duration, self.params.reading_interval);
        let sub_step = self.params.reading_interval / SAMPLES_PER_READING as f64;
        let mut out = Vec::with_capacity(n_readings * store.gondolas.len());
        for k in 0..n_readings {
            let t_reading = k as f64 * self.params.reading_interval;
            for &g in &store.gondolas {
                let samples = (0..SAMPLES_PER_READING)
                    .map(|j| self.frame(store, &changes, g, t_reading + j as f64 * sub_step))
                    .collect();
                out.push(PlateReading {
                    gondola_id: g,
                    timestamp: epoch + t_reading,
                    samples,
                });
            }
        }
        out
    }

    /// One raw 13×13 frame at offset `t`. Border and missing plates are NaN.
    fn frame(&mut self, store: &SimStore, changes: &[LoadChange], gondola: u32, t: f64) -> RawFrame {
        let n_plates = plates_on_gondola(gondola) as u32;
        let mut frame = vec![vec![f64::NAN; 13]; 13];
        for s in 1..=12u32 {
            for p in 1..=n_plates {
                let pos = Position::new(gondola, s, p);
                let load = store.initial_load(pos) + self.settled_change(changes, pos, t);
                frame[s as usize][p as usize] = load + self.uniform(self.params.weight_noise);
            }
        }
        frame
    }

    fn settled_change(&self, changes: &[LoadChange], pos: Position, t: f64) -> f64 {
        let ramp = self.params.ramp_duration;
        changes
            .iter()
            .filter(|c| c.plate == pos)
            .map(|c| c.grams * ((t - c.time) / ramp).clamp(0.0, 1.0))
            .sum()
    }

    /// Tracker frames over `[0, duration)`, stamped from `epoch`.
    pub fn target_frames(&mut self, shoppers: &[Shopper], epoch: f64, duration: f64) -> Vec<TargetFrame> {
        let n_frames = steps_in(duration, self.params.frame_interval);
        let mut frames = Vec::with_capacity(n_frames);
        for k in 0..n_frames {
            let t = k as f64 * self.params.frame_interval;
            let mut targets = Vec::with_capacity(shoppers.len());
            for shopper in shoppers {
                let mut target = shopper.observe(t, SimStore::plate_coordinate);
                for part in [&mut target.head, &mut target.left_hand, &mut target.right_hand]
                    .into_iter()
                    .flatten()
                {
                    *part = self.jitter(*part);
                }
                targets.push(target);
            }
            frames.push(TargetFrame {
                timestamp: epoch + t,
                targets,
            });
        }
        frames
    }

    fn jitter(&mut self, part: BodyPart) -> BodyPart {
        let a = self.params.position_noise;
        let mut position = part.position;
        for i in 0..3 {
            position[i] += self.uniform(a);
        }
        BodyPart::new(position, part.confidence)
    }
}

/// Number of `k` with `k * interval < duration`.
fn steps_in(duration: f64, interval: f64) -> usize {
    (duration / interval - 1e-9).ceil().max(0.0) as usize
}
