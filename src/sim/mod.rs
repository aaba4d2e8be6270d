//! Fixed-timestep simulation module
//!
//! Everything that moves lives here:
//! - Fixed timestep only
//! - Randomness from an injected source only (seeded runs are reproducible)
//! - Stable iteration order (obstacles in spawn order)
//! - No rendering or platform dependencies

pub mod ball;
pub mod body;
pub mod collision;
pub mod manager;
pub mod math;
pub mod metrics;
pub mod physics;
pub mod primitive;
pub mod shapes;
pub mod state;
pub mod tick;

/// Random source injected into every component that needs randomness
pub type SimRng = rand_pcg::Pcg32;

pub use ball::{Ball, BallUpdate, ImpactRecord};
pub use body::Body;
pub use collision::Collision;
pub use manager::{PrimitiveId, PrimitiveManager, SpawnOutcome};
pub use math::Aabb;
pub use metrics::{MetricsSampler, SimulationMetrics};
pub use physics::{BodyHandle, ForceKind, ForceVector, PhysicsEngine};
pub use primitive::{Lifecycle, Material, Primitive, Transform};
pub use shapes::{PrimitiveKind, Shape};
pub use state::SimulationState;
pub use tick::{FixedStepper, TickReport, tick};
