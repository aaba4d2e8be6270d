//! Read-only metrics for the overlay

use std::collections::BTreeMap;

use serde::Serialize;

use super::shapes::PrimitiveKind;
use super::state::SimulationState;

/// One metrics sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationMetrics {
    pub ball_speed: f32,
    pub ball_height: f32,
    pub active_primitives: usize,
    /// Active obstacles per kind, sorted by kind
    pub distribution: BTreeMap<PrimitiveKind, usize>,
    pub kinetic_energy: f32,
    pub potential_energy: f32,
    pub total_energy: f32,
    pub collision_count: u64,
    pub resets: u32,
    /// Simulated seconds
    pub time: f64,
}

impl SimulationMetrics {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Takes a sample every `interval` frames
#[derive(Debug, Clone)]
pub struct MetricsSampler {
    interval: u32,
    frame: u32,
    latest: Option<SimulationMetrics>,
}

impl MetricsSampler {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            frame: 0,
            latest: None,
        }
    }

    /// Count a frame; returns the fresh sample on every `interval`th call
    pub fn frame(&mut self, state: &SimulationState) -> Option<&SimulationMetrics> {
        self.frame += 1;
        if self.frame < self.interval {
            return None;
        }
        self.frame = 0;
        self.latest = Some(state.metrics());
        self.latest.as_ref()
    }

    /// Most recent sample, if any
    pub fn latest(&self) -> Option<&SimulationMetrics> {
        self.latest.as_ref()
    }
}
