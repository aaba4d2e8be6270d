//! The ball: the only dynamic body
//!
//! Physics response lives in the engine. The ball keeps the bookkeeping
//! around it: trail and energy history, impact diagnostics, the stagnation
//! nudge and the respawn when it falls out of the world.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use serde::Serialize;

use super::SimRng;
use super::body::Body;
use super::collision::Collision;
use super::manager::PrimitiveId;
use super::math::{random_symmetric, random_unit_vector};
use super::physics::{self, BodyHandle, ForceVector};
use crate::settings::BallSettings;

/// Diagnostics of the most recent contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactRecord {
    /// Ball clock at the hit (seconds)
    pub time: f32,
    pub speed: f32,
    pub contact_point: Vec3,
    pub normal: Vec3,
    pub primitive: Option<PrimitiveId>,
}

/// What happened during a ball update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BallUpdate {
    /// Stagnation impulse to queue on the ball's body
    pub nudge: Option<ForceVector>,
    /// The ball fell out of the world and was respawned
    pub reset: bool,
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub body: Body,
    handle: BodyHandle,
    /// Position at the start of the last fixed step (for interpolation)
    pub previous_position: Vec3,
    trail: VecDeque<Vec3>,
    energy_history: VecDeque<f32>,
    clock: f32,
    last_collision_at: Option<f32>,
    last_stagnation_check: f32,
    /// Fastest speed seen since the last stagnation check
    peak_speed: f32,
    last_impact: Option<ImpactRecord>,
    impacts: u64,
    resets: u32,
    settings: BallSettings,
    gravity: Vec3,
    rng: SimRng,
}

impl Ball {
    pub fn new(settings: &BallSettings, gravity: Vec3, handle: BodyHandle, rng: SimRng) -> Self {
        let body = Body::sphere(
            settings.start_position,
            settings.radius,
            settings.mass,
            settings.restitution,
        );
        Self {
            previous_position: body.position,
            body,
            handle,
            trail: VecDeque::with_capacity(settings.trail_length),
            energy_history: VecDeque::with_capacity(settings.energy_history_length),
            clock: 0.0,
            last_collision_at: None,
            last_stagnation_check: 0.0,
            peak_speed: 0.0,
            last_impact: None,
            impacts: 0,
            resets: 0,
            settings: settings.clone(),
            gravity,
            rng,
        }
    }

    #[inline]
    pub fn handle(&self) -> BodyHandle {
        self.handle
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.body.speed()
    }

    pub fn settings(&self) -> &BallSettings {
        &self.settings
    }

    /// Remember the pre-step position; call before the body moves
    pub fn begin_step(&mut self) {
        self.previous_position = self.body.position;
    }

    /// Bookkeeping after a fixed step
    pub fn update(&mut self, dt: f32) -> BallUpdate {
        self.clock += dt;

        push_bounded(&mut self.trail, self.body.position, self.settings.trail_length);
        let energy = self.kinetic_energy();
        push_bounded(&mut self.energy_history, energy, self.settings.energy_history_length);

        self.peak_speed = self.peak_speed.max(self.speed());
        let nudge = self.check_stagnation();

        if self.body.position.y < self.settings.reset_height {
            self.reset();
            return BallUpdate { nudge: None, reset: true };
        }

        BallUpdate { nudge, reset: false }
    }

    /// Rate-limited check for a ball that has stayed slow since the last check
    fn check_stagnation(&mut self) -> Option<ForceVector> {
        if self.clock - self.last_stagnation_check < self.settings.stagnation_check_interval {
            return None;
        }
        self.last_stagnation_check = self.clock;
        let peak_speed = std::mem::take(&mut self.peak_speed);

        let recently_hit = self
            .last_collision_at
            .is_some_and(|t| self.clock - t < self.settings.stagnation_collision_window);
        if peak_speed >= self.settings.stagnation_speed || recently_hit {
            return None;
        }

        let impulse = random_unit_vector(&mut self.rng) * self.settings.stagnation_impulse;
        log::debug!("Ball stagnant at {:?}, nudging with {:?}", self.body.position, impulse);
        Some(ForceVector::impulse(impulse))
    }

    /// Respawn above the field with a random horizontal drift
    pub fn reset(&mut self) {
        let s = &self.settings;
        let position = Vec3::new(
            random_symmetric(&mut self.rng, s.respawn_horizontal_jitter),
            s.respawn_base_height + self.rng.random::<f32>() * s.respawn_height_jitter,
            random_symmetric(&mut self.rng, s.respawn_horizontal_jitter),
        );
        let velocity = Vec3::new(
            random_symmetric(&mut self.rng, s.respawn_horizontal_speed),
            0.0,
            random_symmetric(&mut self.rng, s.respawn_horizontal_speed),
        );

        self.body.set_position(position);
        self.body.velocity = velocity;
        self.previous_position = position;
        self.trail.clear();
        self.energy_history.clear();
        self.last_collision_at = None;
        self.peak_speed = 0.0;
        self.resets += 1;
        log::info!("Ball fell out of the world, respawned at {:?}", position);
    }

    /// Record contact diagnostics; the response itself is the engine's job
    pub fn handle_collisions(&mut self, collisions: &[Collision]) {
        for hit in collisions {
            self.impacts += 1;
            self.last_collision_at = Some(self.clock);
            self.last_impact = Some(ImpactRecord {
                time: self.clock,
                speed: hit.impact_speed,
                contact_point: hit.contact_point,
                normal: hit.normal,
                primitive: hit.primitive,
            });
        }
    }

    /// Positions of recent steps, oldest first
    pub fn trail(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.trail.iter().copied()
    }

    /// Kinetic energy samples, oldest first
    pub fn energy_history(&self) -> impl Iterator<Item = f32> + '_ {
        self.energy_history.iter().copied()
    }

    pub fn last_impact(&self) -> Option<&ImpactRecord> {
        self.last_impact.as_ref()
    }

    pub fn impacts(&self) -> u64 {
        self.impacts
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    pub fn kinetic_energy(&self) -> f32 {
        physics::kinetic_energy(&self.body)
    }

    /// Potential energy relative to `reference_height`
    pub fn potential_energy(&self, reference_height: f32) -> f32 {
        physics::potential_energy(&self.body, self.gravity, reference_height)
    }

    pub fn total_energy(&self, reference_height: f32) -> f32 {
        physics::total_energy(&self.body, self.gravity, reference_height)
    }
}

/// Append to a ring buffer, dropping the oldest entries past `capacity`
fn push_bounded<T>(buffer: &mut VecDeque<T>, value: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while buffer.len() >= capacity {
        buffer.pop_front();
    }
    buffer.push_back(value);
}
