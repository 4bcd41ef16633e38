//! Avian3D physics backend implementation.
//!
//! Enable with the `avian3d` feature. Impulses are applied directly to the
//! body velocities, so they take effect in the next physics step.

use avian3d::prelude::*;
use bevy::prelude::*;

use super::{BodyState, MotionPhysicsBackend};

/// Avian3D physics backend for the motion targets.
pub struct Avian3dBackend;

impl Avian3dBackend {
    fn mass(world: &World, entity: Entity) -> Option<f32> {
        if !world.get::<RigidBody>(entity).is_some_and(RigidBody::is_dynamic) {
            return None;
        }
        let mass = world.get::<ComputedMass>(entity)?.value();
        (mass > 0.0 && mass.is_finite()).then_some(mass)
    }

    /// Principal moments and their local frame, diagonalized from the
    /// collider-derived [`ComputedAngularInertia`]. Locked or degenerate
    /// axes come back as zero so no torque is applied about them.
    fn inertia(world: &World, entity: Entity) -> Option<(Vec3, Quat)> {
        let computed = world.get::<ComputedAngularInertia>(entity)?;
        let (principal, local_frame) = computed.principal_angular_inertia_with_local_frame();
        let principal = Vec3::select(
            principal.cmpgt(Vec3::ZERO) & principal.is_finite_mask(),
            principal,
            Vec3::ZERO,
        );
        Some((principal, local_frame.normalize()))
    }
}

/// Component-wise reciprocal that maps zero moments to zero.
fn recip_or_zero(v: Vec3) -> Vec3 {
    Vec3::select(v.cmpgt(Vec3::ZERO), v.recip(), Vec3::ZERO)
}

impl MotionPhysicsBackend for Avian3dBackend {
    fn plugin() -> impl Plugin {
        Avian3dBackendPlugin
    }

    fn body_state(world: &World, entity: Entity) -> Option<BodyState> {
        let mass = Self::mass(world, entity)?;
        let (position, rotation) = Self::get_pose(world, entity)?;
        let (principal_inertia, inertia_rotation) = Self::inertia(world, entity)?;
        Some(BodyState {
            mass,
            position,
            rotation,
            principal_inertia,
            inertia_rotation,
        })
    }

    fn get_pose(world: &World, entity: Entity) -> Option<(Vec3, Quat)> {
        // Try Avian's Position/Rotation first, then fall back to Transform
        let physics_pose = world
            .get::<Position>(entity)
            .zip(world.get::<Rotation>(entity))
            .map(|(p, r)| (p.0, r.0));
        physics_pose.or_else(|| {
            world
                .get::<Transform>(entity)
                .map(|t| (t.translation, t.rotation))
        })
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        // Impulse = mass * delta_v, so delta_v = impulse / mass
        let Some(mass) = Self::mass(world, entity) else {
            return;
        };
        if let Some(mut velocity) = world.get_mut::<LinearVelocity>(entity) {
            velocity.0 += impulse / mass;
        }
    }

    fn apply_angular_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        let Some(state) = Self::body_state(world, entity) else {
            return;
        };
        // delta_w = I_world^-1 * L, with I_world = R * diag(I) * R^-1
        let frame = state.rotation * state.inertia_rotation;
        let delta = frame * ((frame.inverse() * impulse) * recip_or_zero(state.principal_inertia));
        if let Some(mut velocity) = world.get_mut::<AngularVelocity>(entity) {
            velocity.0 += delta;
        }
    }

    fn set_pose(world: &mut World, entity: Entity, position: Vec3, rotation: Quat) {
        if let Some(mut p) = world.get_mut::<Position>(entity) {
            p.0 = position;
        }
        if let Some(mut r) = world.get_mut::<Rotation>(entity) {
            r.0 = rotation;
        }
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
            transform.rotation = rotation;
        }
    }
}

/// Plugin that sets up Avian3D-specific pieces of the backend.
pub struct Avian3dBackendPlugin;

impl Plugin for Avian3dBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
