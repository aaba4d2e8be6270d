//! Render-transform sink
//!
//! The simulation never calls into a renderer. After each frame a
//! presentation layer reads these plain-old-data records and uploads them as
//! instance and vertex buffers.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use crate::rgb_to_rgba;
use crate::sim::{Ball, Primitive, SimulationState};

/// Ball opacity (the ball never fades)
const BALL_OPACITY: f32 = 0.9;

/// Per-instance data for one mesh
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub emissive: f32,
    /// `PrimitiveKind::index()`, or `BALL_MESH` for the ball
    pub mesh: u32,
    pub _pad: [f32; 2],
}

/// Mesh id used for the ball
pub const BALL_MESH: u32 = u32::MAX;

impl RenderInstance {
    /// The ball, interpolated between the last two steps by `alpha`
    pub fn ball(ball: &Ball, alpha: f32) -> Self {
        let position = ball.previous_position.lerp(ball.position(), alpha.clamp(0.0, 1.0));
        let radius = ball.body.radius.unwrap_or(ball.settings().radius);
        Self {
            model: Mat4::from_scale_rotation_translation(Vec3::splat(radius), Quat::IDENTITY, position)
                .to_cols_array_2d(),
            color: rgb_to_rgba(ball.settings().color, BALL_OPACITY),
            emissive: 0.0,
            mesh: BALL_MESH,
            _pad: [0.0; 2],
        }
    }

    pub fn primitive(primitive: &Primitive) -> Self {
        Self {
            model: primitive.transform.matrix().to_cols_array_2d(),
            color: rgb_to_rgba(primitive.material.color, primitive.material.opacity),
            emissive: primitive.material.emissive,
            mesh: primitive.kind().index() as u32,
            _pad: [0.0; 2],
        }
    }
}

/// One point of the ball's trail
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TrailVertex {
    pub position: [f32; 3],
    /// 0 for the oldest point, approaching 1 for the newest
    pub fade: f32,
}

/// Ball first, then every active obstacle in spawn order
pub fn render_instances(state: &SimulationState, alpha: f32) -> Vec<RenderInstance> {
    std::iter::once(RenderInstance::ball(&state.ball, alpha))
        .chain(state.primitives.active().map(RenderInstance::primitive))
        .collect()
}

/// Trail vertices, oldest first
pub fn trail_vertices(ball: &Ball) -> Vec<TrailVertex> {
    let capacity = ball.settings().trail_length.max(1) as f32;
    ball.trail()
        .enumerate()
        .map(|(i, p)| TrailVertex {
            position: p.to_array(),
            fade: i as f32 / capacity,
        })
        .collect()
}
