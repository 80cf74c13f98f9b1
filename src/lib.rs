pub mod cli;
pub mod config;
pub mod dial;
pub mod ecs;
pub mod events;
pub mod mesh;
pub mod rotator;
pub mod stereo;
pub mod transform;

pub use dial::{DialComponent, GripController};
pub use stereo::{CompositorCapability, StereoLayers, StereoWidget};
pub use transform::Transform3D;

/// Wraps an angle in degrees into `[0, 360)`.
pub fn clamp_axis(degrees: f32) -> f32 {
    let wrapped = degrees % 360.0;
    if wrapped < 0.0 {
        // -0.00001 % 360 + 360 rounds up to 360.0
        let positive = wrapped + 360.0;
        if positive >= 360.0 {
            0.0
        } else {
            positive
        }
    } else {
        wrapped
    }
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn normalize_axis(degrees: f32) -> f32 {
    let wrapped = clamp_axis(degrees);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

pub(crate) fn grid_snap(value: f32, grid: f32) -> f32 {
    if grid == 0.0 {
        value
    } else {
        (value / grid).round() * grid
    }
}

pub(crate) const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

pub(crate) fn is_nearly_zero(value: f32) -> bool {
    value.abs() <= KINDA_SMALL_NUMBER
}

pub(crate) fn is_nearly_equal(a: f32, b: f32) -> bool {
    (a - b).abs() <= KINDA_SMALL_NUMBER
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_axis_wraps_into_positive_turn() {
        assert_eq!(clamp_axis(370.0), 10.0);
        assert_eq!(clamp_axis(-10.0), 350.0);
        assert_eq!(clamp_axis(360.0), 0.0);
        assert_eq!(clamp_axis(-1.0e-6), 0.0);
    }

    #[test]
    fn normalize_axis_keeps_half_turn_positive() {
        assert_eq!(normalize_axis(180.0), 180.0);
        assert_eq!(normalize_axis(-180.0), 180.0);
        assert_eq!(normalize_axis(190.0), -170.0);
        assert_eq!(normalize_axis(-350.0), 10.0);
    }

    #[test]
    fn grid_snap_rounds_to_nearest_line() {
        assert_eq!(grid_snap(44.0, 45.0), 45.0);
        assert_eq!(grid_snap(22.0, 45.0), 0.0);
        assert_eq!(grid_snap(12.5, 0.0), 12.5);
    }
}
