//! Configuration for the pose envelope.

use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use thiserror::Error;

/// Which local axis of the target plays the "up" role.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpDirection {
    #[default]
    PositiveUp,
    PositiveRight,
    PositiveForward,
    NegativeUp,
    NegativeRight,
    NegativeForward,
}

/// Error returned when a string does not name an up direction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown up direction `{0}`")]
pub struct ParseUpDirectionError(pub String);

impl UpDirection {
    /// All directions in chooser order.
    pub const ALL: [UpDirection; 6] = [
        UpDirection::PositiveUp,
        UpDirection::PositiveRight,
        UpDirection::PositiveForward,
        UpDirection::NegativeUp,
        UpDirection::NegativeRight,
        UpDirection::NegativeForward,
    ];

    /// Chooser label.
    pub const fn label(self) -> &'static str {
        match self {
            UpDirection::PositiveUp => "+Up",
            UpDirection::PositiveRight => "+Right",
            UpDirection::PositiveForward => "+Forward",
            UpDirection::NegativeUp => "-Up",
            UpDirection::NegativeRight => "-Right",
            UpDirection::NegativeForward => "-Forward",
        }
    }

    /// Rotation taking the canonical frame (up = +Y, right = +X,
    /// forward = +Z) to a frame whose up axis is this direction.
    pub fn basis(self) -> Quat {
        use std::f32::consts::{FRAC_PI_2, PI};

        match self {
            UpDirection::PositiveUp => Quat::IDENTITY,
            UpDirection::PositiveRight => Quat::from_rotation_z(-FRAC_PI_2),
            UpDirection::PositiveForward => Quat::from_rotation_x(FRAC_PI_2),
            UpDirection::NegativeUp => Quat::from_rotation_z(PI),
            UpDirection::NegativeRight => Quat::from_rotation_z(FRAC_PI_2),
            UpDirection::NegativeForward => Quat::from_rotation_x(-FRAC_PI_2),
        }
    }
}

impl fmt::Display for UpDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UpDirection {
    type Err = ParseUpDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.label() == s)
            .ok_or_else(|| ParseUpDirectionError(s.to_owned()))
    }
}

/// One of the six tunable envelope ranges.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeAxis {
    Up,
    Right,
    Forward,
    Yaw,
    Pitch,
    Roll,
}

impl RangeAxis {
    pub const ALL: [RangeAxis; 6] = [
        RangeAxis::Up,
        RangeAxis::Right,
        RangeAxis::Forward,
        RangeAxis::Yaw,
        RangeAxis::Pitch,
        RangeAxis::Roll,
    ];

    /// Whether this range is a translation (meters) rather than a rotation
    /// (degrees).
    pub const fn is_translation(self) -> bool {
        matches!(self, RangeAxis::Up | RangeAxis::Right | RangeAxis::Forward)
    }

    /// Allowed `(min, max)` for this range.
    pub const fn limits(self) -> (f32, f32) {
        if self.is_translation() {
            (0.01, 0.25)
        } else {
            (1.0, 90.0)
        }
    }

    /// Persistence key.
    pub const fn config_key(self) -> &'static str {
        match self {
            RangeAxis::Up => "Plugin:UpRange",
            RangeAxis::Right => "Plugin:RightRange",
            RangeAxis::Forward => "Plugin:ForwardRange",
            RangeAxis::Yaw => "Plugin:YawRange",
            RangeAxis::Pitch => "Plugin:PitchRange",
            RangeAxis::Roll => "Plugin:RollRange",
        }
    }
}

/// Bounds of the motion envelope.
///
/// Translation ranges are in meters and rotation ranges in degrees. Each
/// range is the half-width: an axis at 0.0 or 1.0 produces `-range` or
/// `+range`.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct EnvelopeConfig {
    /// Axis convention of the driven target.
    pub up_direction: UpDirection,

    /// Half-range along up (meters).
    pub up_range: f32,

    /// Half-range along right (meters).
    pub right_range: f32,

    /// Half-range along forward (meters).
    pub forward_range: f32,

    /// Half-range of yaw about up (degrees).
    pub yaw_range: f32,

    /// Half-range of pitch about right (degrees).
    pub pitch_range: f32,

    /// Half-range of roll about forward (degrees).
    pub roll_range: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            up_direction: UpDirection::PositiveUp,
            up_range: 0.08,
            right_range: 0.05,
            forward_range: 0.05,
            yaw_range: 30.0,
            pitch_range: 30.0,
            roll_range: 30.0,
        }
    }
}

impl EnvelopeConfig {
    /// Key of the up direction chooser.
    pub const UP_DIRECTION_KEY: &'static str = "Plugin:UpDirection";

    pub fn range(&self, axis: RangeAxis) -> f32 {
        match axis {
            RangeAxis::Up => self.up_range,
            RangeAxis::Right => self.right_range,
            RangeAxis::Forward => self.forward_range,
            RangeAxis::Yaw => self.yaw_range,
            RangeAxis::Pitch => self.pitch_range,
            RangeAxis::Roll => self.roll_range,
        }
    }

    /// Set a range, clamped to the axis limits. Non-finite values are ignored.
    pub fn set_range(&mut self, axis: RangeAxis, value: f32) {
        if !value.is_finite() {
            return;
        }
        let (min, max) = axis.limits();
        let value = value.clamp(min, max);
        match axis {
            RangeAxis::Up => self.up_range = value,
            RangeAxis::Right => self.right_range = value,
            RangeAxis::Forward => self.forward_range = value,
            RangeAxis::Yaw => self.yaw_range = value,
            RangeAxis::Pitch => self.pitch_range = value,
            RangeAxis::Roll => self.roll_range = value,
        }
    }

    pub fn with_up_direction(mut self, up_direction: UpDirection) -> Self {
        self.up_direction = up_direction;
        self
    }

    pub fn with_range(mut self, axis: RangeAxis, value: f32) -> Self {
        self.set_range(axis, value);
        self
    }

    /// Set all three translation ranges (meters).
    pub fn with_translation_ranges(self, up: f32, right: f32, forward: f32) -> Self {
        self.with_range(RangeAxis::Up, up)
            .with_range(RangeAxis::Right, right)
            .with_range(RangeAxis::Forward, forward)
    }

    /// Set all three rotation ranges (degrees).
    pub fn with_rotation_ranges(self, yaw: f32, pitch: f32, roll: f32) -> Self {
        self.with_range(RangeAxis::Yaw, yaw)
            .with_range(RangeAxis::Pitch, pitch)
            .with_range(RangeAxis::Roll, roll)
    }
}
