//! Axis-aligned boxes and random vector helpers
//!
//! Vectors are `glam::Vec3`; this module only adds what glam lacks.

use glam::{Mat3, Quat, Vec3};
use rand::Rng;

/// An axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// World bounds of a box with the given local half extents after rotation
    ///
    /// Each world half extent is the row of |R| dotted with the local extents.
    pub fn from_oriented(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        let rotated = Mat3::from_quat(rotation).abs() * half_extents.abs();
        Self::from_center_half_extents(center, rotated)
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Move the box by `delta`
    #[inline]
    pub fn translate(&mut self, delta: Vec3) {
        self.min += delta;
        self.max += delta;
    }

    /// Closest point inside the box to `point`
    #[inline]
    pub fn clamp_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Uniformly distributed unit vector
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    // Uniform z and azimuth give a uniform distribution on the sphere
    let z: f32 = rng.random_range(-1.0..=1.0);
    let theta: f32 = rng.random_range(0.0..std::f32::consts::TAU);
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

/// Uniformly distributed point inside a sphere of `radius` around the origin
pub fn random_in_sphere<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let r = rng.random::<f32>().cbrt() * radius;
    random_unit_vector(rng) * r
}

/// Uniform value in `[-half_width, half_width)`; zero width yields zero
#[inline]
pub fn random_symmetric<R: Rng + ?Sized>(rng: &mut R, half_width: f32) -> f32 {
    (rng.random::<f32>() - 0.5) * 2.0 * half_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_clamp_point() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(aabb.clamp_point(Vec3::new(3.0, 0.5, -4.0)), Vec3::new(1.0, 0.5, -1.0));
        assert_eq!(aabb.clamp_point(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_new_orders_corners() {
        let aabb = Aabb::new(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    fn test_translate() {
        let mut aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        aabb.translate(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(aabb.center(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(aabb.half_extents(), Vec3::ONE);
        assert!(aabb.contains(Vec3::new(4.5, 0.0, 0.0)));
        assert!(!aabb.contains(Vec3::ZERO));
    }

    #[test]
    fn test_from_oriented_quarter_turn() {
        // A 4x1 slab turned 90° about z becomes 1x4
        let aabb = Aabb::from_oriented(
            Vec3::ZERO,
            Vec3::new(2.0, 0.5, 1.0),
            Quat::from_rotation_z(FRAC_PI_2),
        );
        let half = aabb.half_extents();
        assert!((half.x - 0.5).abs() < 1e-5);
        assert!((half.y - 2.0).abs() < 1e-5);
        assert!((half.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_random_vectors() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
            let p = random_in_sphere(&mut rng, 2.0);
            assert!(p.length() <= 2.0 + 1e-4);
            let s = random_symmetric(&mut rng, 3.0);
            assert!((-3.0..3.0).contains(&s));
        }
    }
}
