//! Obstacle field management
//!
//! Keeps a bounded set of obstacles ahead of the ball. Every kind has its own
//! arena of slots plus a free list, so recycled obstacles are reset in place
//! and nothing is deallocated while the simulation runs.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec3;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::SimRng;
use super::body::Body;
use super::collision::Collision;
use super::math::random_symmetric;
use super::primitive::Primitive;
use super::shapes::{PRIMITIVE_KIND_COUNT, PrimitiveKind};
use crate::Settings;
use crate::settings::{AnimationSettings, ShapeTable, SpawnSettings};

/// Stable identity of an obstacle: its kind and slot in that kind's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrimitiveId {
    pub kind: PrimitiveKind,
    pub slot: u32,
}

impl PrimitiveId {
    pub fn new(kind: PrimitiveKind, slot: u32) -> Self {
        Self { kind, slot }
    }
}

/// Result of one spawn attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(PrimitiveId),
    /// The active set is full
    AtCapacity,
    /// The ball has not moved far enough from the last spawn
    TooSoon,
    /// The candidate strayed too far from the predicted path
    OffPath,
    /// The candidate was too close to an active obstacle
    Crowded,
    /// No kinds are enabled
    NoKinds,
}

/// Slots of one kind; `free` lists the pooled ones
#[derive(Debug, Clone, Default)]
struct KindPool {
    slots: Vec<Primitive>,
    free: Vec<u32>,
}

/// Owner of every obstacle, active or pooled
#[derive(Debug, Clone)]
pub struct PrimitiveManager {
    spawn: SpawnSettings,
    animation: AnimationSettings,
    shapes: ShapeTable,
    gravity: Vec3,
    pools: [KindPool; PRIMITIVE_KIND_COUNT],
    /// Active obstacles in spawn order
    active: Vec<PrimitiveId>,
    last_spawn_position: Option<Vec3>,
    /// Recent ball positions, oldest first
    ball_history: VecDeque<Vec3>,
    last_dt: f32,
    rng: SimRng,
}

impl PrimitiveManager {
    pub fn new(settings: &Settings, rng: SimRng) -> Self {
        Self {
            spawn: settings.spawn.clone(),
            animation: settings.animation.clone(),
            shapes: settings.shapes.clone(),
            gravity: settings.physics.gravity,
            pools: std::array::from_fn(|_| KindPool::default()),
            active: Vec::new(),
            last_spawn_position: None,
            ball_history: VecDeque::with_capacity(settings.spawn.history_length),
            last_dt: 0.0,
            rng,
        }
    }

    pub fn spawn_settings(&self) -> &SpawnSettings {
        &self.spawn
    }

    /// Per-tick update: spawn, animate, then evict
    pub fn update(&mut self, ball_position: Vec3, dt: f32) {
        self.record_ball_position(ball_position, dt);
        self.try_spawn(ball_position);

        for &id in &self.active {
            self.pools[id.kind.index()].slots[id.slot as usize].update(dt, &self.animation);
        }

        self.cleanup(ball_position);
    }

    fn record_ball_position(&mut self, position: Vec3, dt: f32) {
        self.ball_history.push_back(position);
        while self.ball_history.len() > self.spawn.history_length.max(2) {
            self.ball_history.pop_front();
        }
        self.last_dt = dt;
    }

    /// Drop the recorded ball path after a teleport such as a respawn
    pub fn forget_ball_history(&mut self) {
        self.ball_history.clear();
        self.last_spawn_position = None;
    }

    /// Ball velocity from the two most recent recorded positions
    pub fn estimated_velocity(&self) -> Vec3 {
        let n = self.ball_history.len();
        if n < 2 || self.last_dt <= 0.0 {
            return Vec3::ZERO;
        }
        (self.ball_history[n - 1] - self.ball_history[n - 2]) / self.last_dt
    }

    /// Ballistic prediction of where the ball is heading
    pub fn predict_path(&self, position: Vec3, velocity: Vec3) -> Vec<Vec3> {
        let step = self.spawn.path_time_step;
        let mut pos = position;
        let mut vel = velocity;
        (0..self.spawn.path_steps)
            .map(|_| {
                vel += self.gravity * step;
                pos += vel * step;
                pos
            })
            .collect()
    }

    /// Try to add one obstacle near the ball's path
    pub fn try_spawn(&mut self, ball_position: Vec3) -> SpawnOutcome {
        if self.active.len() >= self.spawn.max_primitives {
            return SpawnOutcome::AtCapacity;
        }
        if self
            .last_spawn_position
            .is_some_and(|last| last.distance(ball_position) < self.spawn.spawn_travel_distance)
        {
            return SpawnOutcome::TooSoon;
        }
        let Some(&kind) = self.spawn.kinds.choose(&mut self.rng) else {
            return SpawnOutcome::NoKinds;
        };

        let path = if self.spawn.path_prediction {
            self.predict_path(ball_position, self.estimated_velocity())
        } else {
            Vec::new()
        };
        let candidates = self.spawn.path_candidates.min(path.len());
        let anchor = if candidates > 0 {
            path[self.rng.random_range(0..candidates)]
        } else {
            ball_position
        };

        let half_jitter = self.spawn.horizontal_jitter * 0.5;
        let drop = self.spawn.min_drop + self.rng.random::<f32>() * self.spawn.drop_range;
        let candidate = Vec3::new(
            anchor.x + random_symmetric(&mut self.rng, half_jitter),
            anchor.y - drop,
            anchor.z + random_symmetric(&mut self.rng, half_jitter),
        );

        if !path.is_empty()
            && !path
                .iter()
                .any(|point| point.distance(candidate) < self.spawn.path_tolerance)
        {
            return SpawnOutcome::OffPath;
        }
        if self
            .active()
            .any(|p| p.position().distance(candidate) < self.spawn.min_spacing)
        {
            return SpawnOutcome::Crowded;
        }

        let id = self.acquire(kind, candidate);
        self.active.push(id);
        self.last_spawn_position = Some(candidate);
        SpawnOutcome::Spawned(id)
    }

    /// Take an obstacle of `kind` from its pool, or allocate a new slot
    fn acquire(&mut self, kind: PrimitiveKind, position: Vec3) -> PrimitiveId {
        let base = *self.shapes.get(kind);
        let pool = &mut self.pools[kind.index()];

        let id = match pool.free.pop() {
            Some(slot) => {
                let primitive = &mut pool.slots[slot as usize];
                primitive.reset(position, &base, &self.animation);
                log::debug!("Recycled {} slot {} at {:?}", kind, slot, position);
                primitive.id
            }
            None => {
                let id = PrimitiveId::new(kind, pool.slots.len() as u32);
                pool.slots.push(Primitive::new(id, position, &base, &self.animation));
                log::debug!("Spawned {} slot {} at {:?}", kind, id.slot, position);
                id
            }
        };

        let primitive = &mut pool.slots[id.slot as usize];
        if let Some(rotation) = primitive.shape.spawn_rotation(&mut self.rng) {
            primitive.set_rotation(rotation);
        }
        id
    }

    /// Return an active obstacle to its pool; false if it was not active
    pub fn release(&mut self, id: PrimitiveId) -> bool {
        let Some(index) = self.active.iter().position(|&active| active == id) else {
            return false;
        };
        self.active.remove(index);

        let pool = &mut self.pools[id.kind.index()];
        pool.slots[id.slot as usize].deactivate();
        pool.free.push(id.slot);
        log::debug!("Released {} slot {}", id.kind, id.slot);
        true
    }

    /// Evict obstacles that are too far from the ball or have finished fading
    fn cleanup(&mut self, ball_position: Vec3) {
        let radius = self.spawn.cleanup_radius;
        let evicted: Vec<PrimitiveId> = self
            .active()
            .filter(|p| p.marked_for_removal || p.position().distance(ball_position) > radius)
            .map(|p| p.id)
            .collect();

        for id in evicted {
            self.release(id);
        }
    }

    /// Test every active obstacle against the ball
    pub fn check_collisions(&self, ball: &Body) -> Vec<Collision> {
        self.active()
            .filter_map(|p| p.check_collision(ball))
            .inspect(|hit| {
                log::trace!(
                    "Ball hit {:?}: penetration {:.3}, speed {:.2}",
                    hit.primitive,
                    hit.penetration,
                    hit.impact_speed
                )
            })
            .collect()
    }

    /// Start the hit animation of every obstacle that produced a contact
    pub fn handle_collisions(&mut self, collisions: &[Collision]) {
        for id in collisions.iter().filter_map(|c| c.primitive) {
            if let Some(primitive) = self
                .pools
                .get_mut(id.kind.index())
                .and_then(|pool| pool.slots.get_mut(id.slot as usize))
            {
                primitive.on_collision(&self.animation);
            }
        }
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.pools.get(id.kind.index())?.slots.get(id.slot as usize)
    }

    /// Active obstacles in spawn order
    pub fn active(&self) -> impl Iterator<Item = &Primitive> + '_ {
        self.active
            .iter()
            .map(|id| &self.pools[id.kind.index()].slots[id.slot as usize])
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Active obstacle count per kind
    pub fn distribution(&self) -> BTreeMap<PrimitiveKind, usize> {
        let mut counts = BTreeMap::new();
        for id in &self.active {
            *counts.entry(id.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Slots ever allocated for `kind` (active plus pooled)
    pub fn allocated(&self, kind: PrimitiveKind) -> usize {
        self.pools[kind.index()].slots.len()
    }

    /// Slots of `kind` waiting for reuse
    pub fn pooled(&self, kind: PrimitiveKind) -> usize {
        self.pools[kind.index()].free.len()
    }

    pub fn last_spawn_position(&self) -> Option<Vec3> {
        self.last_spawn_position
    }
}
