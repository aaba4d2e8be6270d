//! Obstacle shape variants
//!
//! The variant set is closed: each kind carries its own geometry and is
//! dispatched through a single `match`. Only spheres, boxes, tori and planes
//! get dedicated collision geometry; cylinders, cones and dodecahedra collide
//! as spheres of a representative radius.

use glam::{Quat, Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{
    Collision, sphere_vs_annulus, sphere_vs_bounded_plane, sphere_vs_oriented_box,
    sphere_vs_radius,
};
use crate::consts::*;
use crate::settings::ShapeSettings;

/// Obstacle type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Sphere,
    Box,
    Cylinder,
    Cone,
    Torus,
    Plane,
    Dodecahedron,
}

/// Number of obstacle kinds
pub const PRIMITIVE_KIND_COUNT: usize = 7;

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; PRIMITIVE_KIND_COUNT] = [
        PrimitiveKind::Sphere,
        PrimitiveKind::Box,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Cone,
        PrimitiveKind::Torus,
        PrimitiveKind::Plane,
        PrimitiveKind::Dodecahedron,
    ];

    /// Dense index, stable across runs (used for per-kind pools)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Box => "box",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Torus => "torus",
            PrimitiveKind::Plane => "plane",
            PrimitiveKind::Dodecahedron => "dodecahedron",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry parameters of one obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Cylinder { radius: f32, half_height: f32 },
    Cone { radius: f32, half_height: f32 },
    /// A ring of tubes around the local y axis; collision uses the band
    /// between `inner` and `outer`
    Torus { inner: f32, outer: f32 },
    /// A finite rectangle in the local xz-plane
    Plane { half_size: Vec2 },
    Dodecahedron { radius: f32 },
}

impl Shape {
    /// Build the geometry for `kind` from its base settings
    pub fn for_kind(kind: PrimitiveKind, base: &ShapeSettings) -> Self {
        let r = base.radius;
        match kind {
            PrimitiveKind::Sphere => Shape::Sphere { radius: r },
            PrimitiveKind::Box => Shape::Box {
                half_extents: Vec3::new(r, BOX_HALF_HEIGHT, r),
            },
            PrimitiveKind::Cylinder => Shape::Cylinder {
                radius: r,
                half_height: CYLINDER_HALF_HEIGHT,
            },
            PrimitiveKind::Cone => Shape::Cone {
                radius: r,
                half_height: CONE_HALF_HEIGHT,
            },
            PrimitiveKind::Torus => Shape::Torus {
                inner: (r - 2.0 * TORUS_TUBE_RADIUS).max(0.0),
                outer: r,
            },
            PrimitiveKind::Plane => Shape::Plane {
                half_size: Vec2::splat(r),
            },
            PrimitiveKind::Dodecahedron => Shape::Dodecahedron { radius: r },
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Shape::Sphere { .. } => PrimitiveKind::Sphere,
            Shape::Box { .. } => PrimitiveKind::Box,
            Shape::Cylinder { .. } => PrimitiveKind::Cylinder,
            Shape::Cone { .. } => PrimitiveKind::Cone,
            Shape::Torus { .. } => PrimitiveKind::Torus,
            Shape::Plane { .. } => PrimitiveKind::Plane,
            Shape::Dodecahedron { .. } => PrimitiveKind::Dodecahedron,
        }
    }

    /// Radius used by sphere-like tests; `None` for box-like shapes
    pub fn collision_radius(&self) -> Option<f32> {
        match *self {
            Shape::Sphere { radius }
            | Shape::Cylinder { radius, .. }
            | Shape::Cone { radius, .. }
            | Shape::Dodecahedron { radius } => Some(radius),
            Shape::Torus { outer, .. } => Some(outer),
            Shape::Box { .. } | Shape::Plane { .. } => None,
        }
    }

    /// Unrotated local half extents, for world bounds
    pub fn local_half_extents(&self) -> Vec3 {
        match *self {
            Shape::Sphere { radius } | Shape::Dodecahedron { radius } => Vec3::splat(radius),
            Shape::Box { half_extents } => half_extents,
            Shape::Cylinder {
                radius,
                half_height,
            }
            | Shape::Cone {
                radius,
                half_height,
            } => Vec3::new(radius, half_height, radius),
            Shape::Torus { outer, .. } => Vec3::new(outer, TORUS_TUBE_RADIUS, outer),
            Shape::Plane { half_size } => Vec3::new(half_size.x, 0.0, half_size.y),
        }
    }

    /// Test the ball against this shape placed at `center` with `rotation`
    ///
    /// Rotation only matters for boxes and planes; the other shapes are
    /// rotation-invariant in their collision approximation.
    pub fn check_collision(
        &self,
        center: Vec3,
        rotation: Quat,
        restitution: f32,
        ball: &Body,
    ) -> Option<Collision> {
        match *self {
            Shape::Sphere { radius }
            | Shape::Cylinder { radius, .. }
            | Shape::Cone { radius, .. }
            | Shape::Dodecahedron { radius } => sphere_vs_radius(center, radius, restitution, ball),
            Shape::Box { half_extents } => {
                sphere_vs_oriented_box(center, half_extents, rotation, restitution, ball)
            }
            Shape::Torus { inner, outer } => sphere_vs_annulus(center, inner, outer, restitution, ball),
            Shape::Plane { half_size } => {
                sphere_vs_bounded_plane(center, half_size, rotation, restitution, ball)
            }
        }
    }

    /// Euler rotation to apply when an obstacle of this shape spawns
    ///
    /// Boxes spawn tilted between 22.5° and 60° about x and z (either sign)
    /// with a random yaw, so they never lie flat.
    pub fn spawn_rotation<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Vec3> {
        match self {
            Shape::Box { .. } => {
                let mut tilt = || {
                    let magnitude = rng.random_range(MIN_BOX_TILT..=MAX_BOX_TILT);
                    if rng.random_bool(0.5) { magnitude } else { -magnitude }
                };
                let x = tilt();
                let z = tilt();
                let y = rng.random_range(0.0..std::f32::consts::TAU);
                Some(Vec3::new(x, y, z))
            }
            _ => None,
        }
    }
}

const MIN_BOX_TILT: f32 = std::f32::consts::PI / 8.0;
const MAX_BOX_TILT: f32 = std::f32::consts::PI / 3.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ShapeTable;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn shape(kind: PrimitiveKind) -> Shape {
        Shape::for_kind(kind, ShapeTable::default().get(kind))
    }

    fn ball_at(position: Vec3) -> Body {
        Body::sphere(position, 0.5, 1.0, 0.8)
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_name(kind.as_str()), Some(kind));
            assert_eq!(shape(kind).kind(), kind);
            assert_eq!(PrimitiveKind::ALL[kind.index()], kind);
        }
        assert_eq!(PrimitiveKind::from_name("TORUS"), Some(PrimitiveKind::Torus));
        assert_eq!(PrimitiveKind::from_name("capsule"), None);
    }

    #[test]
    fn test_every_shape_has_collision_geometry() {
        for kind in PrimitiveKind::ALL {
            let s = shape(kind);
            let extents = s.local_half_extents();
            assert!(s.collision_radius().is_some() || extents.x > 0.0, "{kind} has no geometry");
        }
    }

    #[test]
    fn test_approximate_shapes_collide_as_spheres() {
        for kind in [PrimitiveKind::Cylinder, PrimitiveKind::Cone, PrimitiveKind::Dodecahedron] {
            let s = shape(kind);
            let radius = s.collision_radius().unwrap();
            let near = ball_at(Vec3::new(radius + 0.4, 0.0, 0.0));
            let hit = s.check_collision(Vec3::ZERO, Quat::IDENTITY, 0.5, &near).unwrap();
            assert!((hit.penetration - 0.1).abs() < 1e-5, "{kind}");
            let far = ball_at(Vec3::new(radius + 0.6, 0.0, 0.0));
            assert!(s.check_collision(Vec3::ZERO, Quat::IDENTITY, 0.5, &far).is_none());
        }
    }

    #[test]
    fn test_torus_band_from_settings() {
        let s = shape(PrimitiveKind::Torus);
        assert_eq!(s, Shape::Torus { inner: 2.0, outer: 4.0 });
        let ring = ball_at(Vec3::new(0.0, 0.0, 3.0));
        assert!(s.check_collision(Vec3::ZERO, Quat::IDENTITY, 0.6, &ring).is_some());
        let hole = ball_at(Vec3::ZERO);
        assert!(s.check_collision(Vec3::ZERO, Quat::IDENTITY, 0.6, &hole).is_none());
    }

    #[test]
    fn test_plane_respects_rotation() {
        let s = shape(PrimitiveKind::Plane);
        // Tilted 90° about z the plane stands upright facing ±x
        let rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let beside = ball_at(Vec3::new(0.3, 1.0, 0.0));
        let hit = s.check_collision(Vec3::ZERO, rotation, 0.8, &beside).unwrap();
        assert!(hit.normal.x.abs() > 0.999);
        let above = ball_at(Vec3::new(0.0, 0.3, 0.0));
        assert!(s.check_collision(Vec3::ZERO, Quat::IDENTITY, 0.8, &above).is_some());
    }

    #[test]
    fn test_box_spawn_rotation_never_flat() {
        let mut rng = Pcg32::seed_from_u64(11);
        let s = shape(PrimitiveKind::Box);
        for _ in 0..50 {
            let r = s.spawn_rotation(&mut rng).unwrap();
            assert!(r.x.abs() >= MIN_BOX_TILT && r.x.abs() <= MAX_BOX_TILT);
            assert!(r.z.abs() >= MIN_BOX_TILT && r.z.abs() <= MAX_BOX_TILT);
        }
        assert!(shape(PrimitiveKind::Sphere).spawn_rotation(&mut rng).is_none());
    }
}
