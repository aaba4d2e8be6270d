//! Fixed timestep simulation tick
//!
//! One call to `tick` is one physics step. `FixedStepper` turns variable
//! frame deltas into a whole number of steps plus an interpolation alpha.

use rand::Rng;

use super::state::SimulationState;
use crate::consts::*;

/// What happened during one fixed step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Contacts resolved this step
    pub collisions: usize,
    /// A random impulse was queued on the ball
    pub random_impulse: bool,
    /// The stagnation nudge fired
    pub nudged: bool,
    /// The ball fell out of the world and respawned
    pub reset: bool,
}

/// Advance the simulation by one fixed timestep
pub fn tick(state: &mut SimulationState, dt: f32) -> TickReport {
    let handle = state.ball.handle();
    let mut report = TickReport::default();

    // Integrate and move the ball
    state.ball.begin_step();
    state.physics.integrate_forces(&mut state.ball.body, handle, dt);
    state.physics.update_position(&mut state.ball.body, dt);

    // Obstacle field follows the new position
    state.primitives.update(state.ball.position(), dt);

    // Contacts
    let collisions = state.primitives.check_collisions(&state.ball.body);
    for collision in &collisions {
        state
            .physics
            .resolve_collision(&mut state.ball.body, collision, handle);
    }
    report.collisions = collisions.len();
    state.collision_count += collisions.len() as u64;
    state.ball.handle_collisions(&collisions);
    state.primitives.handle_collisions(&collisions);

    // Occasional random kick keeps the fall lively
    let chance = state.settings.physics.random_impulse_chance.clamp(0.0, 1.0);
    if chance > 0.0 && state.rng.random_bool(chance) {
        state
            .physics
            .add_random_force(handle, state.settings.physics.random_impulse_strength);
        report.random_impulse = true;
    }

    // Ball bookkeeping: stagnation nudge and out-of-world respawn
    let update = state.ball.update(dt);
    if update.reset {
        state.physics.clear_forces(handle);
        state.primitives.forget_ball_history();
        report.reset = true;
    }
    if let Some(nudge) = update.nudge {
        state.physics.add_force(handle, nudge);
        report.nudged = true;
    }

    state.ticks += 1;
    state.time += dt as f64;
    report
}

/// Time accumulator driving `tick` at a fixed rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepper {
    accumulator: f32,
    step: f32,
    max_frame_dt: f32,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_FRAME_DT)
    }
}

impl FixedStepper {
    pub fn new(step: f32, max_frame_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            step,
            max_frame_dt,
        }
    }

    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add a frame's wall-clock delta; returns the number of steps to run
    ///
    /// The delta is capped so a long stall does not trigger a burst of steps.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if self.step <= 0.0 || !frame_dt.is_finite() {
            return 0;
        }
        self.accumulator += frame_dt.clamp(0.0, self.max_frame_dt);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < MAX_SUBSTEPS {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    /// Fraction of a step left in the accumulator, for render interpolation
    #[inline]
    pub fn alpha(&self) -> f32 {
        if self.step > 0.0 {
            (self.accumulator / self.step).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Advance and run the resulting steps; returns how many ran
    pub fn run(&mut self, state: &mut SimulationState, frame_dt: f32) -> u32 {
        let steps = self.advance(frame_dt);
        for _ in 0..steps {
            tick(state, self.step);
        }
        steps
    }
}
