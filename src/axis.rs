//! Device axes and the per-tick axis value vector.
//!
//! The six axes follow the TCode naming: three linear axes (`L0`..`L2`) and
//! three rotary axes (`R0`..`R2`). Every axis rests at a neutral value of 0.5.

use std::fmt;
use std::str::FromStr;

use bevy::prelude::*;
use thiserror::Error;

/// One of the six motion axes a values source can drive.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAxis {
    /// Stroke.
    L0,
    /// Surge.
    L1,
    /// Sway.
    L2,
    /// Twist.
    R0,
    /// Roll.
    R1,
    /// Pitch.
    R2,
}

/// Error returned when a string does not name a device axis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown device axis `{0}`")]
pub struct ParseAxisError(pub String);

impl DeviceAxis {
    /// All axes in index order.
    pub const ALL: [DeviceAxis; 6] = [
        DeviceAxis::L0,
        DeviceAxis::L1,
        DeviceAxis::L2,
        DeviceAxis::R0,
        DeviceAxis::R1,
        DeviceAxis::R2,
    ];

    /// Number of axes.
    pub const COUNT: usize = 6;

    /// Stable index of this axis (0..=5).
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look up an axis by index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether `index` refers to an axis.
    pub fn is_valid(index: i32) -> bool {
        (0..Self::COUNT as i32).contains(&index)
    }

    /// Neutral value of the axis.
    pub const fn default_value(self) -> f32 {
        0.5
    }

    /// Canonical name of the axis.
    pub const fn name(self) -> &'static str {
        match self {
            DeviceAxis::L0 => "L0",
            DeviceAxis::L1 => "L1",
            DeviceAxis::L2 => "L2",
            DeviceAxis::R0 => "R0",
            DeviceAxis::R1 => "R1",
            DeviceAxis::R2 => "R2",
        }
    }

    /// Parse an axis name. Comparison is ordinal and case-sensitive.
    pub fn try_parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|axis| axis.name() == name)
    }
}

impl fmt::Display for DeviceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceAxis {
    type Err = ParseAxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse(s).ok_or_else(|| ParseAxisError(s.to_owned()))
    }
}

/// Current normalized value of every device axis, in `[0, 1]`.
///
/// Written by the active values source once per tick and consumed by the
/// pose envelope.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct AxisValues(pub [f32; DeviceAxis::COUNT]);

impl Default for AxisValues {
    fn default() -> Self {
        Self(DeviceAxis::ALL.map(DeviceAxis::default_value))
    }
}

impl AxisValues {
    /// All axes at their neutral value.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Value of `axis`. Non-finite values read back as neutral so a
    /// momentarily broken source never leaks NaN into the envelope.
    pub fn get(&self, axis: DeviceAxis) -> f32 {
        let value = self.0[axis.index()];
        if value.is_finite() {
            value
        } else {
            axis.default_value()
        }
    }

    /// Raw stored value of `axis`, without neutral substitution.
    pub fn raw(&self, axis: DeviceAxis) -> f32 {
        self.0[axis.index()]
    }

    /// Set `axis`, clamping into `[0, 1]`. NaN is stored as-is and read back
    /// as neutral by [`AxisValues::get`].
    pub fn set(&mut self, axis: DeviceAxis, value: f32) {
        self.0[axis.index()] = if value.is_nan() {
            value
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    /// Builder-style [`AxisValues::set`].
    pub fn with(mut self, axis: DeviceAxis, value: f32) -> Self {
        self.set(axis, value);
        self
    }

    /// Reset every axis to neutral.
    pub fn reset(&mut self) {
        *self = Self::neutral();
    }
}
