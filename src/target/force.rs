//! Force-driven motion target.
//!
//! Each tick the body receives one linear impulse and three angular impulses
//! sized to close the pose error within a single fixed timestep. There is no
//! stiffness or damping: the impulses are velocity corrections and will
//! overshoot if the body already carries velocity.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use super::{DebugFrames, MotionTarget, OriginPose, TargetSelection};
use crate::backend::{BodyState, MotionPhysicsBackend};
use crate::envelope::PoseOffset;

/// Below this cross-product length two axes count as collinear.
const COLLINEAR_EPSILON: f32 = 1e-6;

/// Impulses computed for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceActuation {
    /// Linear impulse.
    pub impulse: Vec3,
    /// Angular impulses for the up, right and forward axes, in that order.
    pub torques: [Vec3; 3],
    /// Desired world pose.
    pub desired: (Vec3, Quat),
}

impl ForceActuation {
    /// Compute the impulses driving `body` toward `origin` composed with
    /// `offset` within one step of `dt` seconds.
    pub fn compute(body: &BodyState, origin: &OriginPose, offset: &PoseOffset, dt: f32) -> Self {
        let (position, rotation) = origin.compose(offset);

        let impulse = (position - body.position) * body.mass / dt;
        let torques = [
            torque_impulse(body, body.up(), rotation * Vec3::Y, dt),
            torque_impulse(body, body.right(), rotation * Vec3::X, dt),
            torque_impulse(body, body.forward(), rotation * Vec3::Z, dt),
        ];

        Self {
            impulse,
            torques,
            desired: (position, rotation),
        }
    }

    /// Sum of the three angular impulses.
    pub fn total_torque(&self) -> Vec3 {
        self.torques.iter().copied().sum()
    }
}

/// Rotation axis and approximate angle that turn `from` toward `to`.
///
/// The angle is `asin(|from × to|)` on the normalized vectors. That matches
/// the true angle near alignment but saturates at 90°, so larger errors are
/// underestimated. Returns `None` when the vectors are already aligned or
/// either is zero. Exactly opposite vectors rotate about
/// `from.any_orthonormal_vector()` by the saturated angle.
///
/// The result is discontinuous at the opposite pole: nearly opposite vectors
/// give an angle near zero (the cross product vanishes) while exactly
/// opposite ones give π/2. Keep it that way. Switching to an `acos` form
/// changes the torque everywhere away from alignment.
pub fn alignment_error(from: Vec3, to: Vec3) -> Option<(Vec3, f32)> {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return None;
    }

    let cross = from.cross(to);
    let magnitude = cross.length();
    if magnitude < COLLINEAR_EPSILON {
        if from.dot(to) >= 0.0 {
            return None;
        }
        return Some((from.any_orthonormal_vector(), FRAC_PI_2));
    }

    Some((cross / magnitude, magnitude.min(1.0).asin()))
}

/// Angular impulse that changes the body's angular velocity by the amount
/// needed to align `from` with `to` in one step, given its anisotropic
/// inertia.
pub fn torque_impulse(body: &BodyState, from: Vec3, to: Vec3, dt: f32) -> Vec3 {
    let Some((axis, angle)) = alignment_error(from, to) else {
        return Vec3::ZERO;
    };

    let angular_velocity_delta = axis * angle / dt;
    let inertia_frame = body.rotation * body.inertia_rotation;
    inertia_frame * (body.principal_inertia * (inertia_frame.inverse() * angular_velocity_delta))
}

/// Drives a rigid body with impulses.
#[derive(Debug, Clone)]
pub struct ForceMotionTarget {
    selection: TargetSelection,
    last_frames: Option<DebugFrames>,
}

impl Default for ForceMotionTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceMotionTarget {
    pub const NAME: &'static str = "Force";

    pub fn new() -> Self {
        Self {
            selection: TargetSelection::new("MotionTarget:Force"),
            last_frames: None,
        }
    }
}

impl MotionTarget for ForceMotionTarget {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn selection(&self) -> &TargetSelection {
        &self.selection
    }

    fn selection_mut(&mut self) -> &mut TargetSelection {
        &mut self.selection
    }

    fn apply<B: MotionPhysicsBackend>(&mut self, world: &mut World, offset: &PoseOffset) {
        self.last_frames = None;
        let Some(target) = self.selection.live_target(world) else {
            return;
        };
        if !offset.is_finite() {
            return;
        }
        let Some(body) = B::body_state(world, target) else {
            return;
        };

        let dt = B::get_fixed_timestep(world);
        let actuation = ForceActuation::compute(&body, &self.selection.origin(), offset, dt);
        if !actuation.impulse.is_finite() {
            return;
        }

        B::apply_impulse(world, target, actuation.impulse);
        for torque in actuation.torques {
            B::apply_angular_impulse(world, target, torque);
        }

        self.last_frames = Some(DebugFrames {
            current: (body.position, body.rotation),
            desired: actuation.desired,
        });
    }

    fn debug_frames(&self) -> Option<DebugFrames> {
        self.last_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BodyProperties, ImpulseAccumulator, TransformBackend};
    use crate::scene::{Atom, ForceReceiver};

    fn body(mass: f32) -> BodyState {
        BodyState {
            mass,
            ..default()
        }
    }

    #[test]
    fn impulse_scales_with_mass_over_dt() {
        let offset = PoseOffset::new(Vec3::new(0.1, 0.0, 0.0), Quat::IDENTITY);
        let actuation = ForceActuation::compute(&body(2.0), &OriginPose::default(), &offset, 0.02);

        assert!(actuation.impulse.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
        assert_eq!(actuation.total_torque(), Vec3::ZERO);
    }

    #[test]
    fn impulse_is_relative_to_origin_frame() {
        let origin = OriginPose::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let state = BodyState {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: origin.rotation,
            ..body(1.0)
        };
        let offset = PoseOffset::new(Vec3::new(0.0, 0.0, 0.5), Quat::IDENTITY);

        let actuation = ForceActuation::compute(&state, &origin, &offset, 0.5);

        // +Z in an origin yawed 90 degrees is world +X
        assert!(actuation.impulse.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
        assert!(actuation.total_torque().abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn aligned_axes_give_zero_torque() {
        let state = body(1.0);
        assert_eq!(torque_impulse(&state, Vec3::Y, Vec3::Y, 0.02), Vec3::ZERO);
        assert_eq!(torque_impulse(&state, Vec3::Y, Vec3::Y * 3.0, 0.02), Vec3::ZERO);
        assert_eq!(torque_impulse(&state, Vec3::ZERO, Vec3::Y, 0.02), Vec3::ZERO);
    }

    #[test]
    fn opposite_axes_use_deterministic_perpendicular() {
        let (axis, angle) = alignment_error(Vec3::Y, Vec3::NEG_Y).unwrap();
        assert!(axis.dot(Vec3::Y).abs() < 1e-6);
        assert!((axis.length() - 1.0).abs() < 1e-6);
        assert_eq!(angle, FRAC_PI_2);
        assert_eq!(alignment_error(Vec3::Y, Vec3::NEG_Y), Some((axis, angle)));
    }

    #[test]
    fn nearly_opposite_axes_jump_from_opposite() {
        let nearly = Quat::from_rotation_z(std::f32::consts::PI - 0.01) * Vec3::Y;
        let (axis, angle) = alignment_error(Vec3::Y, nearly).unwrap();
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-4));
        assert!((angle - 0.01).abs() < 1e-3);

        let (_, exact) = alignment_error(Vec3::Y, Vec3::NEG_Y).unwrap();
        assert_eq!(exact, FRAC_PI_2);
    }

    #[test]
    fn angle_uses_asin_of_cross_length() {
        let to = Quat::from_rotation_z(0.3) * Vec3::Y;
        let (axis, angle) = alignment_error(Vec3::Y, to).unwrap();
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-6));
        assert!((angle - 0.3).abs() < 1e-5);

        // Beyond 90 degrees the approximation folds back
        let far = Quat::from_rotation_z(2.5) * Vec3::Y;
        let (_, angle) = alignment_error(Vec3::Y, far).unwrap();
        assert!((angle - (std::f32::consts::PI - 2.5)).abs() < 1e-4);
    }

    #[test]
    fn torque_scales_by_principal_inertia() {
        let state = BodyState {
            principal_inertia: Vec3::new(1.0, 2.0, 4.0),
            ..body(1.0)
        };
        let to = Quat::from_rotation_z(0.1) * Vec3::Y;
        let dt = 0.02;

        let torque = torque_impulse(&state, Vec3::Y, to, dt);

        let expected = Vec3::Z * 4.0 * 0.1 / dt;
        assert!(torque.abs_diff_eq(expected, 1e-2), "{torque}");
    }

    #[test]
    fn torque_respects_inertia_rotation() {
        // Principal frame rotated so its x axis lies along world z
        let state = BodyState {
            principal_inertia: Vec3::new(5.0, 1.0, 1.0),
            inertia_rotation: Quat::from_rotation_y(-FRAC_PI_2),
            ..body(1.0)
        };
        let to = Quat::from_rotation_z(0.1) * Vec3::Y;

        let torque = torque_impulse(&state, Vec3::Y, to, 1.0);

        assert!(torque.abs_diff_eq(Vec3::Z * 5.0 * 0.1, 1e-4), "{torque}");
    }

    fn spawn_target(world: &mut World) -> ForceMotionTarget {
        let atom = world.spawn((Name::new("Person"), Atom)).id();
        world.spawn((
            Name::new("hip"),
            ForceReceiver,
            BodyProperties::new(2.0),
            Transform::default(),
            ChildOf(atom),
        ));
        world.insert_resource(Time::<Fixed>::from_seconds(0.02));

        let mut target = ForceMotionTarget::new();
        target.select_atom::<TransformBackend>(world, "Person");
        target.select_target::<TransformBackend>(world, "hip");
        target
    }

    #[test]
    fn apply_pushes_impulses_through_backend() {
        let mut world = World::new();
        let mut target = spawn_target(&mut world);
        let hip = target.selection().target().unwrap();

        let offset = PoseOffset::new(Vec3::new(0.1, 0.0, 0.0), Quat::IDENTITY);
        target.apply::<TransformBackend>(&mut world, &offset);

        let accumulator = world.get::<ImpulseAccumulator>(hip).unwrap();
        assert!(accumulator.linear.abs_diff_eq(Vec3::new(10.0, 0.0, 0.0), 1e-4));
        assert_eq!(accumulator.angular_applications, 3);
        assert!(target.debug_frames().is_some());
    }

    #[test]
    fn apply_without_target_is_noop() {
        let mut world = World::new();
        let mut target = spawn_target(&mut world);
        let hip = target.selection().target().unwrap();
        target.select_target::<TransformBackend>(&world, "None");

        let offset = PoseOffset::new(Vec3::splat(f32::NAN), Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0));
        target.apply::<TransformBackend>(&mut world, &offset);

        assert_eq!(
            *world.get::<ImpulseAccumulator>(hip).unwrap(),
            ImpulseAccumulator::default()
        );
        assert!(target.debug_frames().is_none());
    }

    #[test]
    fn apply_with_nan_offset_is_noop() {
        let mut world = World::new();
        let mut target = spawn_target(&mut world);
        let hip = target.selection().target().unwrap();

        let offset = PoseOffset::new(Vec3::new(f32::NAN, 0.0, 0.0), Quat::IDENTITY);
        target.apply::<TransformBackend>(&mut world, &offset);

        assert_eq!(
            *world.get::<ImpulseAccumulator>(hip).unwrap(),
            ImpulseAccumulator::default()
        );
    }

    #[test]
    fn despawned_target_is_noop() {
        let mut world = World::new();
        let mut target = spawn_target(&mut world);
        let hip = target.selection().target().unwrap();
        world.despawn(hip);

        target.apply::<TransformBackend>(&mut world, &PoseOffset::IDENTITY);
        assert!(target.debug_frames().is_none());
    }
}
