//! Obstacle instances and their lifecycle
//!
//! A primitive is a static body with a shape, a render transform and a
//! material. Hits start a short animation, after which the primitive fades
//! out and is handed back to its pool.

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::body::Body;
use super::collision::Collision;
use super::manager::PrimitiveId;
use super::math::Aabb;
use super::shapes::{PrimitiveKind, Shape};
use crate::lerp;
use crate::settings::{AnimationSettings, ShapeSettings};

/// Extra glow while a hit animation plays
const ANIMATION_GLOW: f32 = 0.4;

/// Lifecycle of one obstacle instance
///
/// `Idle → Animating → FadingOut → Pooled → (reuse) → Idle`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifecycle {
    /// Waiting for a hit; only the idle glow pulses
    Idle,
    /// Playing the post-hit animation
    Animating { elapsed: f32 },
    /// Fading out after the animation (seconds left)
    FadingOut { remaining: f32 },
    /// Invisible, waiting in its pool
    Pooled,
}

/// Render transform; rotation is XYZ Euler angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }
}

/// Presentation material state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Packed 0xRRGGBB
    pub color: u32,
    pub opacity: f32,
    pub emissive: f32,
}

/// One obstacle in the field
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub shape: Shape,
    /// Static collision body; never integrated
    pub body: Body,
    pub original_position: Vec3,
    pub transform: Transform,
    pub material: Material,
    pub lifecycle: Lifecycle,
    /// Set once the fade completes; the manager evicts on the next update
    pub marked_for_removal: bool,
    idle_clock: f32,
}

impl Primitive {
    pub fn new(id: PrimitiveId, position: Vec3, base: &ShapeSettings, animation: &AnimationSettings) -> Self {
        let shape = Shape::for_kind(id.kind, base);
        let transform = Transform::at(position);
        let body = Body {
            position,
            velocity: Vec3::ZERO,
            mass: 1.0,
            restitution: base.restitution,
            radius: shape.collision_radius(),
            bounding_box: Some(Aabb::from_oriented(
                position,
                shape.local_half_extents(),
                transform.quat(),
            )),
        };

        Self {
            id,
            shape,
            body,
            original_position: position,
            transform,
            material: Material {
                color: base.color,
                opacity: animation.base_opacity,
                emissive: animation.base_emissive,
            },
            lifecycle: Lifecycle::Idle,
            marked_for_removal: false,
            idle_clock: 0.0,
        }
    }

    #[inline]
    pub fn kind(&self) -> PrimitiveKind {
        self.id.kind
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// True while the primitive takes part in the field (not pooled)
    #[inline]
    pub fn is_active(&self) -> bool {
        self.lifecycle != Lifecycle::Pooled
    }

    /// Re-anchor for reuse; the result equals a fresh `new` at `position`
    pub fn reset(&mut self, position: Vec3, base: &ShapeSettings, animation: &AnimationSettings) {
        *self = Self::new(self.id, position, base, animation);
    }

    /// Take the primitive out of the field
    pub fn deactivate(&mut self) {
        self.lifecycle = Lifecycle::Pooled;
        self.material.opacity = 0.0;
    }

    /// Set the Euler rotation and refresh the world bounds
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.transform.rotation = rotation;
        self.refresh_bounds();
    }

    fn refresh_bounds(&mut self) {
        self.body.bounding_box = Some(Aabb::from_oriented(
            self.body.position,
            self.shape.local_half_extents() * self.transform.scale,
            self.transform.quat(),
        ));
    }

    /// Test the ball against this obstacle, tagging the contact with its id
    pub fn check_collision(&self, ball: &Body) -> Option<Collision> {
        if !self.is_active() {
            return None;
        }
        debug_assert!(self.body.has_geometry(), "obstacle {:?} has no collision geometry", self.id);
        self.shape
            .check_collision(self.body.position, self.transform.quat(), self.body.restitution, ball)
            .map(|hit| hit.with_primitive(self.id))
    }

    /// Register a hit: restart the animation and flash
    ///
    /// A hit while fading brings the primitive back to the animation.
    pub fn on_collision(&mut self, animation: &AnimationSettings) {
        if !self.is_active() {
            return;
        }
        self.lifecycle = Lifecycle::Animating { elapsed: 0.0 };
        self.material.opacity = animation.flash_opacity;
        self.material.emissive = animation.flash_emissive;
    }

    /// Advance glow, animation and fade by `dt`
    pub fn update(&mut self, dt: f32, animation: &AnimationSettings) {
        self.idle_clock += dt;
        let pulse = 0.3 + (self.idle_clock * 3.0).sin() * 0.2;

        match self.lifecycle {
            Lifecycle::Idle => {
                self.material.emissive = pulse;
            }
            Lifecycle::Animating { elapsed } => {
                let elapsed = elapsed + dt;
                self.animate(elapsed, dt);
                self.material.emissive = pulse + ANIMATION_GLOW;
                self.material.opacity = animation.flash_opacity;

                self.lifecycle = if elapsed >= animation.animation_duration {
                    Lifecycle::FadingOut {
                        remaining: animation.fade_duration,
                    }
                } else {
                    Lifecycle::Animating { elapsed }
                };
            }
            Lifecycle::FadingOut { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.deactivate();
                    self.material.emissive = 0.0;
                    self.marked_for_removal = true;
                } else {
                    let fraction = if animation.fade_duration > 0.0 {
                        remaining / animation.fade_duration
                    } else {
                        0.0
                    };
                    self.material.opacity = lerp(0.0, animation.flash_opacity, fraction);
                    self.material.emissive = lerp(0.0, animation.base_emissive, fraction);
                    self.lifecycle = Lifecycle::FadingOut { remaining };
                }
            }
            Lifecycle::Pooled => {}
        }
    }

    /// Kinematic post-hit animation; `t` is the time since the hit
    fn animate(&mut self, t: f32, dt: f32) {
        use std::f32::consts::{PI, TAU};

        let tf = &mut self.transform;
        match self.shape {
            Shape::Sphere { .. } => {
                tf.scale = Vec3::splat(1.0 + (t * 8.0).sin() * 0.2);
                tf.rotation.x += dt * 2.0;
                tf.rotation.y += dt * 3.0;
            }
            Shape::Box { .. } => {
                let rock = (t * 3.0).sin() * (PI / 6.0) * dt;
                tf.rotation.z += rock;
                tf.rotation.x += rock * 0.5;
            }
            Shape::Cylinder { .. } => {
                tf.rotation.x = (t * 2.0).sin() * (PI / 2.0);
                tf.rotation.y += dt * 4.0;
            }
            Shape::Cone { .. } => {
                tf.rotation.x = (t * 4.0).sin() * (PI / 3.0);
                tf.rotation.z = tf.rotation.x * 0.5;
                // Wobble is visual only, the body stays anchored
                tf.translation.y = self.original_position.y + (t * 8.0).sin() * 0.1;
            }
            Shape::Torus { .. } => {
                tf.rotation.z = (t * 1.5).sin() * (TAU / 3.0);
                tf.rotation.y += dt * 2.0;
            }
            Shape::Plane { .. } => {
                tf.rotation.x = (t * 3.0).sin() * (PI / 6.0);
                tf.rotation.z = (t * 2.0).cos() * (PI / 6.0);
            }
            Shape::Dodecahedron { .. } => {
                tf.rotation.x += dt * 3.0;
                tf.rotation.y += dt * 2.0;
                tf.rotation.z += dt;
                tf.scale = Vec3::splat(1.0 + (t * 10.0).sin() * 0.1);
            }
        }
        self.refresh_bounds();
    }
}
