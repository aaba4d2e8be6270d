//! Force accumulation, integration and collision response
//!
//! The engine keeps one pending-force queue per registered body. Impulses
//! are consumed by the next `integrate_forces` call; continuous forces stay
//! queued until their duration runs out or the queue is cleared.

use glam::Vec3;

use super::SimRng;
use super::body::Body;
use super::collision::Collision;
use super::math::random_unit_vector;
use crate::settings::PhysicsSettings;

/// Index of a body's force queue inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(u32);

impl BodyHandle {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a queued force is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceKind {
    /// Applied once as a velocity change (Δv = F / m), then discarded
    Impulse,
    /// Integrated every tick while its duration lasts
    Continuous,
}

/// A force waiting in a body's queue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceVector {
    pub force: Vec3,
    /// Remaining lifetime in seconds (ignored for impulses)
    pub duration: f32,
    pub kind: ForceKind,
}

impl ForceVector {
    pub fn impulse(force: Vec3) -> Self {
        Self {
            force,
            duration: 0.0,
            kind: ForceKind::Impulse,
        }
    }

    /// A continuous force that expires after `duration` seconds
    pub fn continuous(force: Vec3, duration: f32) -> Self {
        Self {
            force,
            duration,
            kind: ForceKind::Continuous,
        }
    }

    /// A continuous force that lasts until the queue is cleared
    pub fn constant(force: Vec3) -> Self {
        Self::continuous(force, f32::INFINITY)
    }
}

/// Kinetic energy: ½·m·|v|²
#[inline]
pub fn kinetic_energy(body: &Body) -> f32 {
    0.5 * body.mass * body.velocity.length_squared()
}

/// Gravitational potential energy relative to `reference_height`
#[inline]
pub fn potential_energy(body: &Body, gravity: Vec3, reference_height: f32) -> f32 {
    body.mass * gravity.length() * (body.position.y - reference_height)
}

#[inline]
pub fn total_energy(body: &Body, gravity: Vec3, reference_height: f32) -> f32 {
    kinetic_energy(body) + potential_energy(body, gravity, reference_height)
}

/// Rigid-free point-mass physics for the ball
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    settings: PhysicsSettings,
    force_queues: Vec<Vec<ForceVector>>,
    rng: SimRng,
}

impl PhysicsEngine {
    pub fn new(settings: PhysicsSettings, rng: SimRng) -> Self {
        Self {
            settings,
            force_queues: Vec::new(),
            rng,
        }
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    #[inline]
    pub fn gravity(&self) -> Vec3 {
        self.settings.gravity
    }

    /// Allocate a force queue for a new body
    pub fn register_body(&mut self) -> BodyHandle {
        let handle = BodyHandle(self.force_queues.len() as u32);
        self.force_queues.push(Vec::new());
        handle
    }

    /// Forces currently queued for `handle`
    pub fn pending_forces(&self, handle: BodyHandle) -> &[ForceVector] {
        self.force_queues
            .get(handle.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Queue a force; contradictory forces simply sum
    pub fn add_force(&mut self, handle: BodyHandle, force: ForceVector) {
        debug_assert!(handle.index() < self.force_queues.len(), "unregistered body {handle:?}");
        if let Some(queue) = self.force_queues.get_mut(handle.index()) {
            queue.push(force);
        }
    }

    /// Drop every queued force for `handle`
    pub fn clear_forces(&mut self, handle: BodyHandle) {
        if let Some(queue) = self.force_queues.get_mut(handle.index()) {
            queue.clear();
        }
    }

    /// Queue an impulse of `magnitude` in a random direction
    pub fn add_random_force(&mut self, handle: BodyHandle, magnitude: f32) {
        let direction = random_unit_vector(&mut self.rng);
        self.add_force(handle, ForceVector::impulse(direction * magnitude));
    }

    /// Apply gravity and queued forces to the body's velocity
    ///
    /// Impulses are consumed; continuous forces lose `dt` of their duration
    /// and stay queued while any remains. Air resistance and the speed
    /// floor/ceiling are applied afterwards.
    pub fn integrate_forces(&mut self, body: &mut Body, handle: BodyHandle, dt: f32) {
        debug_assert!(body.mass > 0.0, "body mass must be positive");
        let inv_mass = if body.mass > 0.0 { 1.0 / body.mass } else { 0.0 };

        let mut accumulated = self.settings.gravity * body.mass;
        if let Some(queue) = self.force_queues.get_mut(handle.index()) {
            queue.retain_mut(|force| match force.kind {
                ForceKind::Impulse => {
                    body.velocity += force.force * inv_mass;
                    false
                }
                ForceKind::Continuous => {
                    accumulated += force.force;
                    force.duration -= dt;
                    force.duration > 0.0
                }
            });
        }

        let acceleration = accumulated * inv_mass;
        if acceleration.length() > self.settings.force_noise_threshold {
            body.velocity += acceleration * dt;
        }

        body.velocity *= self.settings.air_resistance;
        body.velocity = self.clamp_speed(body.velocity);
    }

    /// Raise nonzero speeds to the floor and cap them at the ceiling
    fn clamp_speed(&self, velocity: Vec3) -> Vec3 {
        let speed = velocity.length();
        if speed > 0.0 && speed < self.settings.min_velocity {
            velocity * (self.settings.min_velocity / speed)
        } else if speed > self.settings.max_velocity {
            velocity * (self.settings.max_velocity / speed)
        } else {
            velocity
        }
    }

    /// Advance position from velocity in equal sub-steps
    pub fn update_position(&self, body: &mut Body, dt: f32) {
        let steps = self.settings.position_substeps.max(1);
        let step_dt = dt / steps as f32;
        for _ in 0..steps {
            body.translate(body.velocity * step_dt);
        }
    }

    /// Respond to a contact against a static obstacle
    ///
    /// Pushes the body out along the normal, then (unless already
    /// separating) queues the bounce impulse and a short tangential friction
    /// force. Ground contacts also damp velocity directly. A body left slower
    /// than the speed floor is relaunched at the floor speed in a random
    /// direction.
    pub fn resolve_collision(&mut self, body: &mut Body, collision: &Collision, handle: BodyHandle) {
        let normal = collision.normal;
        body.translate(normal * collision.penetration);

        let velocity_along_normal = body.velocity.dot(normal);
        if velocity_along_normal > 0.0 {
            return;
        }

        let restitution =
            body.restitution.min(collision.other_restitution) * self.settings.energy_conservation;
        let impulse = -(1.0 + restitution) * velocity_along_normal;
        self.add_force(handle, ForceVector::impulse(normal * impulse * body.mass));

        let tangential = body.velocity - normal * velocity_along_normal;
        if tangential.length_squared() > f32::EPSILON {
            let friction = -tangential * self.settings.friction * body.mass;
            self.add_force(
                handle,
                ForceVector::continuous(friction, self.settings.friction_duration),
            );
        }

        if normal.y > self.settings.ground_normal_threshold {
            body.velocity *= self.settings.rolling_friction;
        }

        if body.speed() < self.settings.min_velocity {
            body.velocity = random_unit_vector(&mut self.rng) * self.settings.min_velocity;
            log::trace!("Collision left body stalled, relaunching at {:?}", body.velocity);
        }
    }

    pub fn kinetic_energy(&self, body: &Body) -> f32 {
        kinetic_energy(body)
    }

    pub fn potential_energy(&self, body: &Body, reference_height: f32) -> f32 {
        potential_energy(body, self.settings.gravity, reference_height)
    }

    pub fn total_energy(&self, body: &Body, reference_height: f32) -> f32 {
        total_energy(body, self.settings.gravity, reference_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn engine_with(settings: PhysicsSettings) -> (PhysicsEngine, BodyHandle) {
        let mut engine = PhysicsEngine::new(settings, SimRng::seed_from_u64(42));
        let handle = engine.register_body();
        (engine, handle)
    }

    fn weightless() -> PhysicsSettings {
        PhysicsSettings {
            gravity: Vec3::ZERO,
            ..Default::default()
        }
    }

    fn ball() -> Body {
        Body::sphere(Vec3::new(0.0, 80.0, 0.0), 0.5, 1.0, 0.8)
    }

    fn ground_hit(penetration: f32, other_restitution: f32) -> Collision {
        let obstacle = Body::sphere(Vec3::ZERO, 1.0, 1.0, other_restitution);
        let probe = Body::sphere(Vec3::new(0.0, 1.5 - penetration, 0.0), 0.5, 1.0, 0.8);
        crate::sim::collision::sphere_vs_sphere(&obstacle, &probe).unwrap()
    }

    #[test]
    fn test_gravity_single_tick() {
        let settings = PhysicsSettings::default();
        let (mut engine, handle) = engine_with(settings.clone());
        let mut body = ball();

        engine.integrate_forces(&mut body, handle, SIM_DT);
        engine.update_position(&mut body, SIM_DT);

        let expected = settings.gravity * SIM_DT * settings.air_resistance;
        assert!((body.velocity - expected).length() < 1e-6);
        assert!((body.position.y - (80.0 + expected.y * SIM_DT)).abs() < 1e-4);
    }

    #[test]
    fn test_free_fall_one_second() {
        // 60 fixed steps from rest at height 80, no obstacles
        let settings = PhysicsSettings::default();
        let (mut engine, handle) = engine_with(settings.clone());
        let mut body = ball();

        let mut expected = 0.0f32;
        for _ in 0..60 {
            engine.integrate_forces(&mut body, handle, SIM_DT);
            engine.update_position(&mut body, SIM_DT);
            expected = (expected + settings.gravity.y * SIM_DT) * settings.air_resistance;
        }

        assert!((body.velocity.y - expected).abs() < 1e-3);
        assert!(body.velocity.x.abs() < 1e-6 && body.velocity.z.abs() < 1e-6);
        // Damping keeps the result just shy of the undamped -9.81
        assert!(body.velocity.y > -9.81 && body.velocity.y < -9.3);
    }

    #[test]
    fn test_impulse_applied_once() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = Body {
            mass: 2.0,
            ..ball()
        };

        engine.add_force(handle, ForceVector::impulse(Vec3::new(4.0, 0.0, 0.0)));
        engine.integrate_forces(&mut body, handle, SIM_DT);
        let air = engine.settings().air_resistance;
        assert!((body.velocity.x - 2.0 * air).abs() < 1e-5);
        assert!(engine.pending_forces(handle).is_empty());

        engine.integrate_forces(&mut body, handle, SIM_DT);
        assert!((body.velocity.x - 2.0 * air * air).abs() < 1e-5);
    }

    #[test]
    fn test_continuous_force_persists_until_cleared() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = ball();

        engine.add_force(handle, ForceVector::constant(Vec3::new(0.0, 0.0, 6.0)));
        for _ in 0..10 {
            engine.integrate_forces(&mut body, handle, SIM_DT);
        }
        assert_eq!(engine.pending_forces(handle).len(), 1);
        assert!(body.velocity.z > 0.9);

        engine.clear_forces(handle);
        assert!(engine.pending_forces(handle).is_empty());
    }

    #[test]
    fn test_timed_continuous_force_expires() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = ball();

        engine.add_force(handle, ForceVector::continuous(Vec3::X, 3.0 * SIM_DT + 1e-4));
        for _ in 0..3 {
            engine.integrate_forces(&mut body, handle, SIM_DT);
            assert_eq!(engine.pending_forces(handle).len(), 1);
        }
        engine.integrate_forces(&mut body, handle, SIM_DT);
        assert!(engine.pending_forces(handle).is_empty());
    }

    #[test]
    fn test_noise_threshold_ignores_tiny_forces() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = ball();
        engine.add_force(handle, ForceVector::constant(Vec3::new(1e-4, 0.0, 0.0)));
        engine.integrate_forces(&mut body, handle, SIM_DT);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_speed_floor_and_ceiling() {
        let (mut engine, handle) = engine_with(weightless());
        let settings = engine.settings().clone();

        let mut slow = Body {
            velocity: Vec3::new(0.01, 0.0, 0.0),
            ..ball()
        };
        engine.integrate_forces(&mut slow, handle, SIM_DT);
        assert!((slow.speed() - settings.min_velocity).abs() < 1e-6);
        assert!(slow.velocity.x > 0.0);

        let mut fast = Body {
            velocity: Vec3::new(0.0, -100.0, 0.0),
            ..ball()
        };
        engine.integrate_forces(&mut fast, handle, SIM_DT);
        assert!((fast.speed() - settings.max_velocity).abs() < 1e-4);

        let mut resting = ball();
        engine.integrate_forces(&mut resting, handle, SIM_DT);
        assert_eq!(resting.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_update_position_substeps() {
        let (engine, _) = engine_with(weightless());
        let mut body = Body {
            velocity: Vec3::new(6.0, 0.0, -3.0),
            bounding_box: Some(crate::sim::math::Aabb::from_center_half_extents(
                Vec3::new(0.0, 80.0, 0.0),
                Vec3::ONE,
            )),
            ..ball()
        };
        engine.update_position(&mut body, 0.5);
        assert!((body.position - Vec3::new(3.0, 80.0, -1.5)).length() < 1e-5);
        assert!((body.bounding_box.unwrap().center() - body.position).length() < 1e-5);
    }

    #[test]
    fn test_resolve_pushes_out_and_queues_bounce() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = Body {
            position: Vec3::new(0.0, 1.4, 0.0),
            velocity: Vec3::new(0.0, -5.0, 0.0),
            ..ball()
        };
        let hit = ground_hit(0.1, 0.6);

        engine.resolve_collision(&mut body, &hit, handle);
        assert!((body.position.y - 1.5).abs() < 1e-5);
        // Ground contact damps immediately; the bounce waits in the queue
        let rolling = engine.settings().rolling_friction;
        assert!((body.velocity.y + 5.0 * rolling).abs() < 1e-5);
        let pending = engine.pending_forces(handle);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ForceKind::Impulse);

        let e = 0.6 * engine.settings().energy_conservation;
        engine.integrate_forces(&mut body, handle, SIM_DT);
        let air = engine.settings().air_resistance;
        let expected = (-5.0 * rolling + (1.0 + e) * 5.0) * air;
        assert!((body.velocity.y - expected).abs() < 1e-4);
    }

    #[test]
    fn test_resolve_separating_is_noop_for_velocity() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = Body {
            velocity: Vec3::new(1.0, 3.0, 0.0),
            ..ball()
        };
        let before = body.velocity;
        engine.resolve_collision(&mut body, &ground_hit(0.05, 0.8), handle);
        assert_eq!(body.velocity, before);
        assert!(engine.pending_forces(handle).is_empty());
    }

    #[test]
    fn test_resolve_queues_tangential_friction() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = Body {
            velocity: Vec3::new(4.0, -2.0, 0.0),
            ..ball()
        };
        engine.resolve_collision(&mut body, &ground_hit(0.05, 0.8), handle);
        let friction = engine
            .pending_forces(handle)
            .iter()
            .find(|f| f.kind == ForceKind::Continuous)
            .copied()
            .expect("friction force");
        assert!(friction.force.x < 0.0);
        assert!(friction.force.y.abs() < 1e-6);
        assert!((friction.duration - engine.settings().friction_duration).abs() < 1e-6);
    }

    #[test]
    fn test_resolve_stall_relaunches_at_floor_speed() {
        let (mut engine, handle) = engine_with(weightless());
        let mut body = Body {
            velocity: Vec3::new(0.0, -0.05, 0.0),
            ..ball()
        };
        engine.resolve_collision(&mut body, &ground_hit(0.01, 0.8), handle);
        let floor = engine.settings().min_velocity;
        assert!((body.speed() - floor).abs() < 1e-6);
    }

    #[test]
    fn test_random_force_is_impulse_of_magnitude() {
        let (mut engine, handle) = engine_with(weightless());
        engine.add_random_force(handle, 2.0);
        let pending = engine.pending_forces(handle);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ForceKind::Impulse);
        assert!((pending[0].force.length() - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_energy() {
        let body = Body {
            velocity: Vec3::new(3.0, 4.0, 0.0),
            mass: 2.0,
            position: Vec3::new(0.0, 10.0, 0.0),
            ..ball()
        };
        let gravity = Vec3::new(0.0, -9.81, 0.0);
        assert!((kinetic_energy(&body) - 25.0).abs() < 1e-4);
        assert!((potential_energy(&body, gravity, 0.0) - 196.2).abs() < 1e-3);
        assert!((potential_energy(&body, gravity, 10.0)).abs() < 1e-6);
        assert!((total_energy(&body, gravity, 0.0) - 221.2).abs() < 1e-3);

        let (engine, _) = engine_with(PhysicsSettings::default());
        assert!((engine.total_energy(&body, 0.0) - 221.2).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_bounce_never_gains_normal_speed(
            vx in -10.0f32..10.0,
            vy in -10.0f32..10.0,
            vz in -10.0f32..10.0,
            nx in -1.0f32..1.0,
            ny in -1.0f32..1.0,
            nz in -1.0f32..1.0,
            restitution in 0.0f32..=1.0,
        ) {
            let normal = Vec3::new(nx, ny, nz);
            prop_assume!(normal.length() > 0.1);
            let normal = normal.normalize();
            let velocity = Vec3::new(vx, vy, vz);
            let approach = velocity.dot(normal);
            prop_assume!(approach < -0.5);

            let (mut engine, handle) = engine_with(weightless());
            let mut body = Body { velocity, restitution, ..ball() };
            let hit = Collision {
                primitive: None,
                other_restitution: 1.0,
                normal,
                penetration: 0.1,
                contact_point: Vec3::ZERO,
                impact_speed: velocity.length(),
            };

            engine.resolve_collision(&mut body, &hit, handle);
            engine.integrate_forces(&mut body, handle, SIM_DT);

            prop_assert!(body.velocity.dot(normal).abs() <= approach.abs() + 1e-4);
        }
    }
}
