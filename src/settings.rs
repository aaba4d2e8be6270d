//! Simulation settings
//!
//! Every tunable constant of the core lives here with its default. The
//! binary may load overrides from a JSON file; missing fields keep defaults.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::PrimitiveKind;

/// Integration and collision-response constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Gravitational acceleration (m/s²)
    pub gravity: Vec3,
    /// Speed ceiling (m/s)
    pub max_velocity: f32,
    /// Speed floor for moving bodies (m/s); also the anti-stagnation speed
    pub min_velocity: f32,
    /// Multiplicative velocity damping applied every tick (< 1)
    pub air_resistance: f32,
    /// Extra inelastic loss multiplied into every bounce restitution (≤ 1)
    pub energy_conservation: f32,
    /// Tangential friction coefficient applied on contact
    pub friction: f32,
    /// Lifetime of a contact friction force (seconds)
    pub friction_duration: f32,
    /// Velocity multiplier on ground contact
    pub rolling_friction: f32,
    /// Normal y-component above which a contact counts as ground
    pub ground_normal_threshold: f32,
    /// Accelerations at or below this magnitude are ignored
    pub force_noise_threshold: f32,
    /// Position sub-steps per tick
    pub position_substeps: u32,
    /// Chance per fixed step of a random nudge on the ball
    pub random_impulse_chance: f64,
    /// Magnitude of that nudge (N·s)
    pub random_impulse_strength: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            max_velocity: 25.0,
            min_velocity: 0.1,
            air_resistance: 0.999,
            energy_conservation: 0.95,
            friction: 0.3,
            friction_duration: 0.1,
            rolling_friction: 0.98,
            ground_normal_threshold: 0.7,
            force_noise_threshold: 1e-3,
            position_substeps: 4,
            random_impulse_chance: 0.001,
            random_impulse_strength: 2.0,
        }
    }
}

/// Ball body and policy constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    pub radius: f32,
    pub mass: f32,
    pub restitution: f32,
    /// Packed 0xRRGGBB
    pub color: u32,
    pub start_position: Vec3,
    /// Falling below this height triggers a respawn
    pub reset_height: f32,
    pub respawn_base_height: f32,
    pub respawn_height_jitter: f32,
    pub respawn_horizontal_jitter: f32,
    pub respawn_horizontal_speed: f32,
    /// Trail ring buffer capacity (positions)
    pub trail_length: usize,
    /// Kinetic energy ring buffer capacity (samples)
    pub energy_history_length: usize,
    /// Minimum simulated time between stagnation checks (seconds)
    pub stagnation_check_interval: f32,
    /// Speed under which the ball counts as resting
    pub stagnation_speed: f32,
    /// A collision this recent suppresses the stagnation nudge (seconds)
    pub stagnation_collision_window: f32,
    /// Impulse magnitude of the stagnation nudge (N·s)
    pub stagnation_impulse: f32,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            radius: 0.5,
            mass: 1.0,
            restitution: 0.8,
            color: 0x00ffff,
            start_position: Vec3::new(0.0, 50.0, 0.0),
            reset_height: -200.0,
            respawn_base_height: 50.0,
            respawn_height_jitter: 10.0,
            respawn_horizontal_jitter: 10.0,
            respawn_horizontal_speed: 2.0,
            trail_length: 100,
            energy_history_length: 120,
            stagnation_check_interval: 3.0,
            stagnation_speed: 0.5,
            stagnation_collision_window: 1.0,
            stagnation_impulse: 2.0,
        }
    }
}

/// Obstacle field generation constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Active obstacle cap
    pub max_primitives: usize,
    /// Minimum distance between a new obstacle and any active one
    pub min_spacing: f32,
    /// Ball must travel this far from the last spawn point before the next spawn
    pub spawn_travel_distance: f32,
    /// Obstacles farther than this from the ball are recycled
    pub cleanup_radius: f32,
    /// Bias spawns along a ballistic prediction of the ball's path
    pub path_prediction: bool,
    pub path_steps: usize,
    pub path_time_step: f32,
    /// Only the first N predicted points are used as spawn anchors
    pub path_candidates: usize,
    /// Candidates farther than this from every predicted point are rejected
    pub path_tolerance: f32,
    /// Ball positions kept for velocity estimation
    pub history_length: usize,
    /// Horizontal jitter (full width) around the anchor
    pub horizontal_jitter: f32,
    /// Candidates are dropped below the anchor by min_drop..min_drop+drop_range
    pub min_drop: f32,
    pub drop_range: f32,
    /// Kinds eligible for spawning (uniform choice)
    pub kinds: Vec<PrimitiveKind>,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            max_primitives: 15,
            min_spacing: 5.0,
            spawn_travel_distance: 10.0,
            cleanup_radius: 80.0,
            path_prediction: true,
            path_steps: 10,
            path_time_step: 0.5,
            path_candidates: 5,
            path_tolerance: 15.0,
            history_length: 5,
            horizontal_jitter: 12.0,
            min_drop: 5.0,
            drop_range: 15.0,
            kinds: PrimitiveKind::ALL.to_vec(),
        }
    }
}

/// Obstacle animation and fade timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Post-collision animation length (seconds)
    pub animation_duration: f32,
    /// Fade-out length after the animation (seconds)
    pub fade_duration: f32,
    pub base_opacity: f32,
    pub base_emissive: f32,
    pub flash_opacity: f32,
    pub flash_emissive: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            animation_duration: 2.0,
            fade_duration: 1.0,
            base_opacity: 0.9,
            base_emissive: 0.5,
            flash_opacity: 1.0,
            flash_emissive: 1.0,
        }
    }
}

/// Per-kind base geometry and material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeSettings {
    /// Representative radius (half width for boxes and planes, outer radius for tori)
    pub radius: f32,
    /// Packed 0xRRGGBB
    pub color: u32,
    pub restitution: f32,
}

impl ShapeSettings {
    pub const fn new(radius: f32, color: u32, restitution: f32) -> Self {
        Self {
            radius,
            color,
            restitution,
        }
    }
}

/// Shape settings for every kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeTable {
    pub sphere: ShapeSettings,
    #[serde(rename = "box")]
    pub cuboid: ShapeSettings,
    pub cylinder: ShapeSettings,
    pub cone: ShapeSettings,
    pub torus: ShapeSettings,
    pub plane: ShapeSettings,
    pub dodecahedron: ShapeSettings,
}

impl Default for ShapeTable {
    fn default() -> Self {
        Self {
            sphere: ShapeSettings::new(2.0, 0xff4444, 0.8),
            cuboid: ShapeSettings::new(2.0, 0x44ff44, 0.7),
            cylinder: ShapeSettings::new(1.5, 0x4444ff, 0.6),
            cone: ShapeSettings::new(2.0, 0xffff44, 0.5),
            torus: ShapeSettings::new(4.0, 0xff44ff, 0.6),
            plane: ShapeSettings::new(4.0, 0x44ffff, 0.8),
            dodecahedron: ShapeSettings::new(2.5, 0xffffff, 0.9),
        }
    }
}

impl ShapeTable {
    pub fn get(&self, kind: PrimitiveKind) -> &ShapeSettings {
        match kind {
            PrimitiveKind::Sphere => &self.sphere,
            PrimitiveKind::Box => &self.cuboid,
            PrimitiveKind::Cylinder => &self.cylinder,
            PrimitiveKind::Cone => &self.cone,
            PrimitiveKind::Torus => &self.torus,
            PrimitiveKind::Plane => &self.plane,
            PrimitiveKind::Dodecahedron => &self.dodecahedron,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsSettings,
    pub ball: BallSettings,
    pub spawn: SpawnSettings,
    pub animation: AnimationSettings,
    pub shapes: ShapeTable,
    /// Frames between metric samples
    pub metrics_interval: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            physics: PhysicsSettings::default(),
            ball: BallSettings::default(),
            spawn: SpawnSettings::default(),
            animation: AnimationSettings::default(),
            shapes: ShapeTable::default(),
            metrics_interval: Self::DEFAULT_METRICS_INTERVAL,
        }
    }
}

impl Settings {
    /// Default sampling cadence for the metrics overlay
    pub const DEFAULT_METRICS_INTERVAL: u32 = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Settings = serde_json::from_str(json)?;
        if settings.metrics_interval == 0 {
            settings.metrics_interval = Self::DEFAULT_METRICS_INTERVAL;
        }
        Ok(settings)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Invalid settings in {}: {}; using defaults", path.display(), err);
                    Self::new()
                }
            },
            Err(err) => {
                log::info!("No settings at {} ({}); using defaults", path.display(), err);
                Self::new()
            }
        }
    }
}
