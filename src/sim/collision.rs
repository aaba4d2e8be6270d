//! Collision detection between the ball and obstacle geometry
//!
//! The ball is always the moving sphere; obstacles never test against each
//! other. Every test returns `None` when either side lacks the geometry it
//! needs, and degenerate normals fall back to a fixed direction instead of
//! failing.

use glam::{Quat, Vec2, Vec3};

use super::body::Body;
use super::manager::PrimitiveId;
use crate::consts::NORMAL_EPSILON;

/// A single ball/obstacle contact, consumed within the tick that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    /// Obstacle that produced the contact (set by the primitive manager)
    pub primitive: Option<PrimitiveId>,
    /// Restitution of the obstacle side
    pub other_restitution: f32,
    /// Unit normal pointing from the obstacle toward the ball
    pub normal: Vec3,
    /// Overlap depth along `normal` (≥ 0)
    pub penetration: f32,
    /// Diagnostic: approximate contact point
    pub contact_point: Vec3,
    /// Diagnostic: ball speed at detection
    pub impact_speed: f32,
}

impl Collision {
    fn new(ball: &Body, other_restitution: f32, normal: Vec3, penetration: f32, contact_point: Vec3) -> Self {
        Self {
            primitive: None,
            other_restitution,
            normal,
            penetration: penetration.max(0.0),
            contact_point,
            impact_speed: ball.speed(),
        }
    }

    /// Tag the contact with the obstacle that produced it
    pub fn with_primitive(mut self, id: PrimitiveId) -> Self {
        self.primitive = Some(id);
        self
    }
}

/// Unit direction of `v`, or world up when `v` is (nearly) zero
#[inline]
fn normal_or_up(v: Vec3) -> Vec3 {
    let len = v.length();
    if len > NORMAL_EPSILON { v / len } else { Vec3::Y }
}

/// Sphere-vs-sphere between two bodies
///
/// Collides when the center distance is below the radius sum. The normal
/// points from `obstacle` to `ball`.
pub fn sphere_vs_sphere(obstacle: &Body, ball: &Body) -> Option<Collision> {
    let radius = obstacle.radius?;
    sphere_vs_radius(obstacle.position, radius, obstacle.restitution, ball)
}

/// Sphere-vs-AABB between a sphere body and a box body
///
/// Clamps the sphere center into the box; a center inside the box yields
/// the default up normal with the full radius as penetration.
pub fn sphere_vs_box(sphere: &Body, boxed: &Body) -> Option<Collision> {
    let radius = sphere.radius?;
    let aabb = boxed.bounding_box?;

    let closest = aabb.clamp_point(sphere.position);
    let offset = sphere.position - closest;
    let distance = offset.length();
    if distance >= radius {
        return None;
    }

    Some(Collision::new(
        sphere,
        boxed.restitution,
        normal_or_up(offset),
        radius - distance,
        closest,
    ))
}

/// Ball against a sphere of `radius` centered at `center`
pub fn sphere_vs_radius(center: Vec3, radius: f32, restitution: f32, ball: &Body) -> Option<Collision> {
    let ball_radius = ball.radius?;

    let offset = ball.position - center;
    let distance = offset.length();
    let min_distance = radius + ball_radius;
    if distance >= min_distance {
        return None;
    }

    let normal = normal_or_up(offset);
    Some(Collision::new(
        ball,
        restitution,
        normal,
        min_distance - distance,
        center + normal * radius,
    ))
}

/// Ball against a box with local `half_extents`, rotated by `rotation`
///
/// The test runs in the box's local frame. When the ball center lies inside
/// the box, the face with the smallest penetration wins.
pub fn sphere_vs_oriented_box(
    center: Vec3,
    half_extents: Vec3,
    rotation: Quat,
    restitution: f32,
    ball: &Body,
) -> Option<Collision> {
    let ball_radius = ball.radius?;

    let local = rotation.inverse() * (ball.position - center);
    let closest = local.clamp(-half_extents, half_extents);
    let offset = local - closest;
    let distance = offset.length();
    if distance >= ball_radius {
        return None;
    }

    let (normal_local, penetration, contact_local) = if distance > NORMAL_EPSILON {
        (offset / distance, ball_radius - distance, closest)
    } else {
        let (axis, depth) = nearest_face(local, half_extents);
        let mut contact = local;
        let index = if axis.x != 0.0 {
            0
        } else if axis.y != 0.0 {
            1
        } else {
            2
        };
        contact[index] = half_extents[index] * axis[index];
        (axis, depth + ball_radius, contact)
    };

    Some(Collision::new(
        ball,
        restitution,
        (rotation * normal_local).normalize_or(Vec3::Y),
        penetration,
        center + rotation * contact_local,
    ))
}

/// Face of a box nearest to an interior point: (outward axis, depth to that face)
///
/// Ties resolve in +x, -x, +y, -y, +z, -z order.
fn nearest_face(local: Vec3, half_extents: Vec3) -> (Vec3, f32) {
    let faces = [
        (Vec3::X, half_extents.x - local.x),
        (Vec3::NEG_X, half_extents.x + local.x),
        (Vec3::Y, half_extents.y - local.y),
        (Vec3::NEG_Y, half_extents.y + local.y),
        (Vec3::Z, half_extents.z - local.z),
        (Vec3::NEG_Z, half_extents.z + local.z),
    ];

    faces
        .into_iter()
        .fold((Vec3::Y, f32::INFINITY), |best, face| if face.1 < best.1 { face } else { best })
}

/// Ball against a thick ring (torus approximation)
///
/// Only the band between `inner_radius` and `outer_radius` collides, widened
/// by the ball radius. Penetration is measured against the band's
/// mid-radius, so a ball resting in the hole or well outside never hits.
pub fn sphere_vs_annulus(
    center: Vec3,
    inner_radius: f32,
    outer_radius: f32,
    restitution: f32,
    ball: &Body,
) -> Option<Collision> {
    let ball_radius = ball.radius?;

    let offset = ball.position - center;
    let distance = offset.length();
    if distance <= inner_radius - ball_radius || distance >= outer_radius + ball_radius {
        return None;
    }

    let mid_radius = (inner_radius + outer_radius) * 0.5;
    let penetration = ball_radius - (distance - mid_radius).abs();
    if penetration <= 0.0 {
        return None;
    }

    let normal = normal_or_up(offset);
    Some(Collision::new(
        ball,
        restitution,
        normal,
        penetration,
        center + normal * mid_radius,
    ))
}

/// Ball against a finite rectangle lying in its local xz-plane
///
/// Distance is the perpendicular offset along the plane's local y axis; the
/// normal faces whichever side the ball is on (up when exactly on the plane).
pub fn sphere_vs_bounded_plane(
    center: Vec3,
    half_size: Vec2,
    rotation: Quat,
    restitution: f32,
    ball: &Body,
) -> Option<Collision> {
    let ball_radius = ball.radius?;

    let local = rotation.inverse() * (ball.position - center);
    let distance = local.y.abs();
    if distance >= ball_radius || local.x.abs() >= half_size.x || local.z.abs() >= half_size.y {
        return None;
    }

    let side = if local.y < 0.0 { -1.0 } else { 1.0 };
    let normal = rotation * Vec3::new(0.0, side, 0.0);
    Some(Collision::new(
        ball,
        restitution,
        normal,
        ball_radius - distance,
        ball.position - normal * distance,
    ))
}
