//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement so the
//! motion targets can read body state and push impulses without knowing which
//! physics engine integrates them.

use bevy::prelude::*;

/// Snapshot of the rigid-body state a force motion target needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Body mass.
    pub mass: f32,
    /// World-space position of the body.
    pub position: Vec3,
    /// World-space rotation of the body.
    pub rotation: Quat,
    /// Principal moments of inertia.
    pub principal_inertia: Vec3,
    /// Rotation from the body's local frame to its principal inertia axes.
    pub inertia_rotation: Quat,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            mass: 1.0,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            principal_inertia: Vec3::ONE,
            inertia_rotation: Quat::IDENTITY,
        }
    }
}

impl BodyState {
    /// Local up axis in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Local right axis in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Local forward axis in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Trait for physics backend implementations.
///
/// Implement this trait to drive bodies simulated by a particular physics
/// engine. All functions are static and operate on the `World`, so backends
/// carry no state of their own.
pub trait MotionPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Read the body state of an entity.
    ///
    /// Returns `None` if the entity is gone or is not a valid dynamic body
    /// (for example zero or non-finite mass).
    fn body_state(world: &World, entity: Entity) -> Option<BodyState>;

    /// Current world-space pose of an entity, if it has one.
    fn get_pose(world: &World, entity: Entity) -> Option<(Vec3, Quat)>;

    /// Apply a linear impulse (instantaneous momentum change).
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Apply an angular impulse (instantaneous angular momentum change).
    fn apply_angular_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Move an entity directly, bypassing dynamics.
    fn set_pose(world: &mut World, entity: Entity, position: Vec3, rotation: Quat);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.timestep().as_secs_f32())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}
