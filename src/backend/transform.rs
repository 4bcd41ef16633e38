//! Transform-based backend for hosts that integrate velocities themselves.
//!
//! Body state is read from [`Transform`] and [`BodyProperties`]. Impulses are
//! accumulated into [`ImpulseAccumulator`], which the host drains once per
//! physics step.

use bevy::prelude::*;

use super::{BodyState, MotionPhysicsBackend};

/// Mass properties of a body driven through [`TransformBackend`].
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[require(Transform, ImpulseAccumulator)]
pub struct BodyProperties {
    pub mass: f32,
    pub principal_inertia: Vec3,
    pub inertia_rotation: Quat,
}

impl Default for BodyProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            principal_inertia: Vec3::ONE,
            inertia_rotation: Quat::IDENTITY,
        }
    }
}

impl BodyProperties {
    pub fn new(mass: f32) -> Self {
        Self {
            mass,
            ..default()
        }
    }

    pub fn with_principal_inertia(mut self, principal_inertia: Vec3) -> Self {
        self.principal_inertia = principal_inertia;
        self
    }

    pub fn with_inertia_rotation(mut self, inertia_rotation: Quat) -> Self {
        self.inertia_rotation = inertia_rotation;
        self
    }
}

/// Impulses applied since the host last drained the accumulator.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct ImpulseAccumulator {
    pub linear: Vec3,
    pub angular: Vec3,
    /// Number of angular impulse applications since the last drain.
    pub angular_applications: u32,
}

impl ImpulseAccumulator {
    /// Take the accumulated impulses, leaving the accumulator empty.
    pub fn take(&mut self) -> (Vec3, Vec3) {
        let taken = (self.linear, self.angular);
        *self = Self::default();
        taken
    }
}

/// Backend over plain transforms and accumulated impulses.
pub struct TransformBackend;

impl MotionPhysicsBackend for TransformBackend {
    fn plugin() -> impl Plugin {
        TransformBackendPlugin
    }

    fn body_state(world: &World, entity: Entity) -> Option<BodyState> {
        let properties = world.get::<BodyProperties>(entity)?;
        if properties.mass <= 0.0 || !properties.mass.is_finite() {
            return None;
        }
        let (position, rotation) = Self::get_pose(world, entity)?;
        Some(BodyState {
            mass: properties.mass,
            position,
            rotation,
            principal_inertia: properties.principal_inertia,
            inertia_rotation: properties.inertia_rotation,
        })
    }

    fn get_pose(world: &World, entity: Entity) -> Option<(Vec3, Quat)> {
        world
            .get::<Transform>(entity)
            .map(|t| (t.translation, t.rotation))
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut accumulator) = world.get_mut::<ImpulseAccumulator>(entity) {
            accumulator.linear += impulse;
        }
    }

    fn apply_angular_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut accumulator) = world.get_mut::<ImpulseAccumulator>(entity) {
            accumulator.angular += impulse;
            accumulator.angular_applications += 1;
        }
    }

    fn set_pose(world: &mut World, entity: Entity, position: Vec3, rotation: Quat) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
            transform.rotation = rotation;
        }
    }
}

/// Registers the component types of [`TransformBackend`].
pub struct TransformBackendPlugin;

impl Plugin for TransformBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<BodyProperties>()
            .register_type::<ImpulseAccumulator>();
    }
}
