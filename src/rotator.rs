use crate::{clamp_axis, normalize_axis};
use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// One of the three principal axes an interactable reads or rotates about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InteractionAxis {
    X,
    Y,
    #[default]
    Z,
}

impl InteractionAxis {
    pub fn label(self) -> &'static str {
        match self {
            InteractionAxis::X => "X axis",
            InteractionAxis::Y => "Y axis",
            InteractionAxis::Z => "Z axis",
        }
    }

    pub fn vector(self) -> Vec3 {
        match self {
            InteractionAxis::X => Vec3::X,
            InteractionAxis::Y => Vec3::Y,
            InteractionAxis::Z => Vec3::Z,
        }
    }

    /// Rotation of `degrees` about this axis.
    pub fn rotation(self, degrees: f32) -> Quat {
        Quat::from_axis_angle(self.vector(), degrees.to_radians())
    }
}

/// Euler rotation in degrees. Roll turns about X, pitch about Y and yaw about Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Rotator = Rotator { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    pub fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn from_quat(rotation: Quat) -> Self {
        let (yaw, pitch, roll) = rotation.to_euler(EulerRot::ZYX);
        Self { pitch: pitch.to_degrees(), yaw: yaw.to_degrees(), roll: roll.to_degrees() }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(
            EulerRot::ZYX,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    /// Each component wrapped into `(-180, 180]`.
    pub fn normalized(self) -> Self {
        Self { pitch: normalize_axis(self.pitch), yaw: normalize_axis(self.yaw), roll: normalize_axis(self.roll) }
    }

    /// Each component wrapped into `[0, 360)`.
    pub fn clamped(self) -> Self {
        Self { pitch: clamp_axis(self.pitch), yaw: clamp_axis(self.yaw), roll: clamp_axis(self.roll) }
    }

    pub fn axis_value(self, axis: InteractionAxis) -> f32 {
        match axis {
            InteractionAxis::X => self.roll,
            InteractionAxis::Y => self.pitch,
            InteractionAxis::Z => self.yaw,
        }
    }

    /// Returns a copy with the component read by `axis` replaced.
    pub fn with_axis_value(mut self, axis: InteractionAxis, value: f32) -> Self {
        match axis {
            InteractionAxis::X => self.roll = value,
            InteractionAxis::Y => self.pitch = value,
            InteractionAxis::Z => self.yaw = value,
        }
        self
    }
}

impl Sub for Rotator {
    type Output = Rotator;

    fn sub(self, rhs: Rotator) -> Rotator {
        Rotator { pitch: self.pitch - rhs.pitch, yaw: self.yaw - rhs.yaw, roll: self.roll - rhs.roll }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_across_seam_is_short_way_round() {
        let last = Rotator::new(0.0, 350.0, 0.0);
        let current = Rotator::new(0.0, -5.0, 0.0);
        let delta = (current - last).normalized();
        assert!((delta.axis_value(InteractionAxis::Z) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn axis_value_roundtrips_through_setter() {
        let rot = Rotator::ZERO.with_axis_value(InteractionAxis::X, 42.0);
        assert_eq!(rot.roll, 42.0);
        assert_eq!(rot.axis_value(InteractionAxis::X), 42.0);
        assert_eq!(rot.axis_value(InteractionAxis::Z), 0.0);
    }

    #[test]
    fn quat_conversion_matches_axis_rotation() {
        let rot = Rotator::ZERO.with_axis_value(InteractionAxis::Z, 90.0);
        let expected = InteractionAxis::Z.rotation(90.0);
        assert!(rot.to_quat().abs_diff_eq(expected, 1e-5));
        let back = Rotator::from_quat(rot.to_quat());
        assert!((back.yaw - 90.0).abs() < 1e-3);
    }
}
