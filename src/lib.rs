//! Plummet - a ball falling through an endless field of obstacles
//!
//! Core modules:
//! - `sim`: Fixed-timestep simulation (physics, obstacle field, ball)
//! - `render`: Render-transform sink read by a presentation layer
//! - `settings`: Tunable constants in one serializable structure

pub mod render;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Ceiling on a single frame's wall-clock delta (avoids step bursts after a stall)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Hard cap on fixed steps per frame
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Box obstacles are thin slabs: half height relative to the configured half width
    pub const BOX_HALF_HEIGHT: f32 = 0.5;
    /// Torus tube radius; the configured torus radius is the outer edge
    pub const TORUS_TUBE_RADIUS: f32 = 1.0;
    /// Cylinder and cone half heights (render bounds only, collision is spherical)
    pub const CYLINDER_HALF_HEIGHT: f32 = 3.0;
    pub const CONE_HALF_HEIGHT: f32 = 2.0;

    /// Normals shorter than this are treated as degenerate
    pub const NORMAL_EPSILON: f32 = 1e-6;
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// Convert a packed 0xRRGGBB color to normalized RGBA
#[inline]
pub fn rgb_to_rgba(color: u32, alpha: f32) -> [f32; 4] {
    [
        ((color >> 16) & 0xff) as f32 / 255.0,
        ((color >> 8) & 0xff) as f32 / 255.0,
        (color & 0xff) as f32 / 255.0,
        alpha,
    ]
}
