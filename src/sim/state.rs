//! Simulation state
//!
//! Composes the physics engine, the ball and the obstacle field. One random
//! source seeds every component, so a seeded state replays identically.

use rand::SeedableRng;

use super::SimRng;
use super::ball::Ball;
use super::manager::PrimitiveManager;
use super::metrics::SimulationMetrics;
use super::physics::PhysicsEngine;
use crate::Settings;

/// Energies are measured relative to this height
pub const ENERGY_REFERENCE_HEIGHT: f32 = 0.0;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimulationState {
    /// Run seed; `None` when seeded from the OS
    pub seed: Option<u64>,
    pub settings: Settings,
    pub physics: PhysicsEngine,
    pub ball: Ball,
    pub primitives: PrimitiveManager,
    /// Contacts resolved since the start of the run
    pub collision_count: u64,
    /// Simulated seconds
    pub time: f64,
    /// Fixed steps taken
    pub ticks: u64,
    pub(crate) rng: SimRng,
}

impl SimulationState {
    /// Create a reproducible simulation from `seed`
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self::with_rng(settings, SimRng::seed_from_u64(seed), Some(seed))
    }

    /// Create a simulation seeded from OS entropy
    pub fn from_entropy(settings: Settings) -> Self {
        Self::with_rng(settings, SimRng::from_os_rng(), None)
    }

    fn with_rng(settings: Settings, mut rng: SimRng, seed: Option<u64>) -> Self {
        let mut physics = PhysicsEngine::new(settings.physics.clone(), SimRng::from_rng(&mut rng));
        let handle = physics.register_body();
        let ball = Ball::new(
            &settings.ball,
            settings.physics.gravity,
            handle,
            SimRng::from_rng(&mut rng),
        );
        let primitives = PrimitiveManager::new(&settings, SimRng::from_rng(&mut rng));

        log::info!(
            "Simulation created (seed {:?}, ball at {:?}, up to {} obstacles)",
            seed,
            ball.position(),
            settings.spawn.max_primitives
        );

        Self {
            seed,
            settings,
            physics,
            ball,
            primitives,
            collision_count: 0,
            time: 0.0,
            ticks: 0,
            rng,
        }
    }

    /// Read-only snapshot for the metrics collaborator
    pub fn metrics(&self) -> SimulationMetrics {
        SimulationMetrics {
            ball_speed: self.ball.speed(),
            ball_height: self.ball.position().y,
            active_primitives: self.primitives.active_count(),
            distribution: self.primitives.distribution(),
            kinetic_energy: self.ball.kinetic_energy(),
            potential_energy: self.ball.potential_energy(ENERGY_REFERENCE_HEIGHT),
            total_energy: self.ball.total_energy(ENERGY_REFERENCE_HEIGHT),
            collision_count: self.collision_count,
            resets: self.ball.resets(),
            time: self.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SimulationState::new(Settings::new(), 7);
        assert_eq!(state.seed, Some(7));
        assert_eq!(state.ticks, 0);
        assert_eq!(state.primitives.active_count(), 0);
        assert_eq!(state.ball.position(), state.settings.ball.start_position);
        assert!(state.physics.pending_forces(state.ball.handle()).is_empty());
    }

    #[test]
    fn test_entropy_state_has_no_seed() {
        let state = SimulationState::from_entropy(Settings::new());
        assert_eq!(state.seed, None);
    }

    #[test]
    fn test_initial_metrics() {
        let state = SimulationState::new(Settings::new(), 1);
        let metrics = state.metrics();
        assert_eq!(metrics.ball_speed, 0.0);
        assert_eq!(metrics.kinetic_energy, 0.0);
        assert!((metrics.potential_energy - 9.81 * 50.0).abs() < 1e-2);
        assert_eq!(metrics.total_energy, metrics.potential_energy);
        assert!(metrics.distribution.is_empty());
    }
}
