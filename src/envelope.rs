//! Pose envelope: normalized axis values to a bounded pose offset.

use bevy::prelude::*;

use crate::axis::{AxisValues, DeviceAxis};
use crate::config::EnvelopeConfig;

/// Desired pose relative to the captured origin of the motion target.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct PoseOffset {
    /// Translation in the origin frame (meters).
    pub translation: Vec3,
    /// Rotation relative to the origin rotation.
    pub rotation: Quat,
}

impl Default for PoseOffset {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PoseOffset {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite()
    }
}

/// Map a normalized value symmetrically into `[-range, +range]`.
#[inline]
pub fn symmetric(value: f32, range: f32) -> f32 {
    (value - 0.5) * 2.0 * range
}

/// Evaluate the envelope for one tick.
///
/// Axis assignment: L0 up, L1 forward, L2 right, R0 yaw about up, R1 roll
/// about forward, R2 pitch about right. The rotation is composed as
/// `yaw * pitch * roll`.
pub fn evaluate(values: &AxisValues, config: &EnvelopeConfig) -> PoseOffset {
    let basis = config.up_direction.basis();
    let up = basis * Vec3::Y;
    let right = basis * Vec3::X;
    let forward = basis * Vec3::Z;

    let translation = up * symmetric(values.get(DeviceAxis::L0), config.up_range)
        + forward * symmetric(values.get(DeviceAxis::L1), config.forward_range)
        + right * symmetric(values.get(DeviceAxis::L2), config.right_range);

    let yaw = symmetric(values.get(DeviceAxis::R0), config.yaw_range).to_radians();
    let roll = symmetric(values.get(DeviceAxis::R1), config.roll_range).to_radians();
    let pitch = symmetric(values.get(DeviceAxis::R2), config.pitch_range).to_radians();

    let rotation = Quat::from_axis_angle(up, yaw)
        * Quat::from_axis_angle(right, pitch)
        * Quat::from_axis_angle(forward, roll);

    PoseOffset {
        translation,
        rotation: rotation.normalize(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RangeAxis, UpDirection};

    fn config() -> EnvelopeConfig {
        EnvelopeConfig::default()
            .with_translation_ranges(0.1, 0.2, 0.05)
            .with_rotation_ranges(30.0, 20.0, 10.0)
    }

    #[test]
    fn neutral_values_give_identity() {
        let offset = evaluate(&AxisValues::neutral(), &config());
        assert_eq!(offset.translation, Vec3::ZERO);
        assert!(offset.rotation.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn translation_is_linear_in_each_axis() {
        let config = config();
        let cases = [
            (DeviceAxis::L0, Vec3::Y, config.up_range),
            (DeviceAxis::L1, Vec3::Z, config.forward_range),
            (DeviceAxis::L2, Vec3::X, config.right_range),
        ];
        for (axis, direction, range) in cases {
            for (input, expected) in [(0.0, -range), (0.25, -range / 2.0), (0.5, 0.0), (1.0, range)] {
                let values = AxisValues::neutral().with(axis, input);
                let offset = evaluate(&values, &config);
                assert!(
                    offset.translation.abs_diff_eq(direction * expected, 1e-6),
                    "{axis} at {input}: {}",
                    offset.translation
                );
            }
        }
    }

    #[test]
    fn yaw_rotates_about_up() {
        let values = AxisValues::neutral().with(DeviceAxis::R0, 1.0);
        let offset = evaluate(&values, &config());
        let (axis, angle) = offset.rotation.to_axis_angle();
        assert!(axis.abs_diff_eq(Vec3::Y, 1e-5));
        assert!((angle - 30f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn pitch_and_roll_axes() {
        let pitch = evaluate(&AxisValues::neutral().with(DeviceAxis::R2, 0.0), &config());
        let (axis, angle) = pitch.rotation.to_axis_angle();
        assert!(axis.abs_diff_eq(Vec3::NEG_X, 1e-5));
        assert!((angle - 20f32.to_radians()).abs() < 1e-5);

        let roll = evaluate(&AxisValues::neutral().with(DeviceAxis::R1, 1.0), &config());
        let (axis, angle) = roll.rotation.to_axis_angle();
        assert!(axis.abs_diff_eq(Vec3::Z, 1e-5));
        assert!((angle - 10f32.to_radians()).abs() < 1e-5);
    }

    #[test]
    fn rotation_order_is_yaw_pitch_roll() {
        let values = AxisValues::neutral()
            .with(DeviceAxis::R0, 0.8)
            .with(DeviceAxis::R1, 0.3)
            .with(DeviceAxis::R2, 0.9);
        let config = config();
        let offset = evaluate(&values, &config);

        let yaw = Quat::from_rotation_y(symmetric(0.8, config.yaw_range).to_radians());
        let pitch = Quat::from_rotation_x(symmetric(0.9, config.pitch_range).to_radians());
        let roll = Quat::from_rotation_z(symmetric(0.3, config.roll_range).to_radians());
        assert!(offset.rotation.abs_diff_eq(yaw * pitch * roll, 1e-6));
    }

    #[test]
    fn up_direction_remaps_stroke() {
        let values = AxisValues::neutral().with(DeviceAxis::L0, 1.0);
        let config = config().with_up_direction(UpDirection::NegativeForward);
        let offset = evaluate(&values, &config);
        assert!(offset.translation.abs_diff_eq(Vec3::NEG_Z * 0.1, 1e-6));
    }

    #[test]
    fn nan_axis_is_neutral() {
        let values = AxisValues::neutral()
            .with(DeviceAxis::L0, f32::NAN)
            .with(DeviceAxis::R0, f32::NAN);
        let offset = evaluate(&values, &config());
        assert!(offset.is_finite());
        assert_eq!(offset, evaluate(&AxisValues::neutral(), &config()));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let values = AxisValues([0.1, 0.7, 0.33, 0.9, 0.05, 0.61]);
        let config = config().with_range(RangeAxis::Roll, 75.0);
        let a = evaluate(&values, &config);
        let b = evaluate(&values, &config);
        assert_eq!(a.translation.to_array(), b.translation.to_array());
        assert_eq!(a.rotation.to_array(), b.rotation.to_array());
    }
}
