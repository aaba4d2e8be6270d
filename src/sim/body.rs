//! Physics body record shared by the ball and every obstacle

use glam::Vec3;

use super::math::Aabb;

/// Position, velocity and collision geometry of one body
///
/// A body carries a radius (sphere-like tests), a world-space bounding box
/// (box-like tests), or both.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    /// Bounciness, 0..=1
    pub restitution: f32,
    pub radius: Option<f32>,
    pub bounding_box: Option<Aabb>,
}

impl Body {
    /// A sphere-like body at rest
    pub fn sphere(position: Vec3, radius: f32, mass: f32, restitution: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            mass,
            restitution,
            radius: Some(radius),
            bounding_box: None,
        }
    }

    /// A box-like body at rest
    pub fn boxed(bounding_box: Aabb, mass: f32, restitution: f32) -> Self {
        Self {
            position: bounding_box.center(),
            velocity: Vec3::ZERO,
            mass,
            restitution,
            radius: None,
            bounding_box: Some(bounding_box),
        }
    }

    /// True when some collision test can run against this body
    #[inline]
    pub fn has_geometry(&self) -> bool {
        self.radius.is_some() || self.bounding_box.is_some()
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Move the body, carrying its bounding box along
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        if let Some(aabb) = self.bounding_box.as_mut() {
            aabb.translate(delta);
        }
    }

    /// Place the body at `position`, carrying its bounding box along
    pub fn set_position(&mut self, position: Vec3) {
        self.translate(position - self.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_moves_bounds() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let mut body = Body::boxed(aabb, 1.0, 0.5);
        body.translate(Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(body.position, Vec3::new(0.0, 3.0, 0.0));
        assert_eq!(body.bounding_box.unwrap().center(), Vec3::new(0.0, 3.0, 0.0));

        body.set_position(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(body.bounding_box.unwrap().min, Vec3::ZERO);
    }

    #[test]
    fn test_geometry_presence() {
        let body = Body::sphere(Vec3::ZERO, 1.0, 1.0, 0.8);
        assert!(body.has_geometry());
        let bare = Body {
            radius: None,
            ..body
        };
        assert!(!bare.has_geometry());
    }
}
