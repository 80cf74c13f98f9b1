use crate::rotator::InteractionAxis;
use crate::{clamp_axis, grid_snap, is_nearly_equal, is_nearly_zero};
use glam::Quat;

/// Angular stops on either side of the dial's rest position, in degrees. Positive rotation is
/// clockwise and stops at `clockwise`; negative rotation stops at `360 - counter_clockwise`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialLimits {
    pub clockwise: f32,
    pub counter_clockwise: f32,
}

impl Default for DialLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl DialLimits {
    pub const fn new(clockwise: f32, counter_clockwise: f32) -> Self {
        Self { clockwise, counter_clockwise }
    }

    /// 180/180 leaves no forbidden arc, so the dial spins freely.
    pub const fn unbounded() -> Self {
        Self { clockwise: 180.0, counter_clockwise: 180.0 }
    }

    /// Start of the counter-clockwise stop when measured as a positive angle.
    pub fn counter_clockwise_stop(&self) -> f32 {
        360.0 - self.counter_clockwise
    }

    /// Open interval the dial cannot enter, if there is one.
    pub fn forbidden_arc(&self) -> Option<(f32, f32)> {
        let stop = self.counter_clockwise_stop();
        (self.clockwise < stop).then_some((self.clockwise, stop))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    pub enabled: bool,
    pub increment: f32,
    pub threshold: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self { enabled: false, increment: 45.0, threshold: 0.0 }
    }
}

/// Outcome of a single [`AngleTracker::advance`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleUpdate {
    pub backend_angle: f32,
    pub dial_angle: f32,
    /// Angle the visual transform was turned by; the grid line when snapped.
    pub visual_angle: f32,
    pub snapped: bool,
    /// Set only on the tick that lands on a new snap line.
    pub snap_reached: Option<f32>,
    pub rotation: Quat,
}

#[derive(Debug, Clone)]
pub struct AngleTracker {
    limits: DialLimits,
    snap: SnapSettings,
    axis: InteractionAxis,
    rest_rotation: Quat,
    backend_angle: f32,
    dial_angle: f32,
    last_snap_angle: f32,
}

impl AngleTracker {
    pub fn new(limits: DialLimits, snap: SnapSettings, axis: InteractionAxis) -> Self {
        Self {
            limits,
            snap,
            axis,
            rest_rotation: Quat::IDENTITY,
            backend_angle: 0.0,
            dial_angle: 0.0,
            last_snap_angle: 0.0,
        }
    }

    pub fn limits(&self) -> DialLimits {
        self.limits
    }

    pub fn snap(&self) -> SnapSettings {
        self.snap
    }

    pub fn axis(&self) -> InteractionAxis {
        self.axis
    }

    pub fn backend_angle(&self) -> f32 {
        self.backend_angle
    }

    pub fn dial_angle(&self) -> f32 {
        self.dial_angle
    }

    pub fn last_snap_angle(&self) -> f32 {
        self.last_snap_angle
    }

    pub fn rest_rotation(&self) -> Quat {
        self.rest_rotation
    }

    /// Re-bases the dial on a new rest rotation and zeroes the tracked angle.
    pub fn reset(&mut self, rest_rotation: Quat) {
        self.rest_rotation = rest_rotation;
        self.backend_angle = 0.0;
        self.dial_angle = 0.0;
        self.last_snap_angle = 0.0;
    }

    /// Rest rotation turned by `angle` degrees about the dial axis.
    pub fn visual_rotation(&self, angle: f32) -> Quat {
        (self.rest_rotation * self.axis.rotation(angle)).normalize()
    }

    /// Feeds one tick of controller rotation (degrees, already normalized to `(-180, 180]`).
    pub fn advance(&mut self, delta: f32) -> AngleUpdate {
        self.backend_angle = self.constrain(delta);

        let mut snap_reached = None;
        let snapped = self.in_snap_zone();
        let visual_angle = if snapped {
            let grid = grid_snap(self.backend_angle, self.snap.increment);
            self.dial_angle = clamp_axis(grid.round());
            if !is_nearly_equal(self.last_snap_angle, self.dial_angle) {
                snap_reached = Some(self.dial_angle);
            }
            self.last_snap_angle = self.dial_angle;
            grid
        } else {
            self.dial_angle = clamp_axis(self.backend_angle.round());
            self.backend_angle
        };

        AngleUpdate {
            backend_angle: self.backend_angle,
            dial_angle: self.dial_angle,
            visual_angle,
            snapped,
            snap_reached,
            rotation: self.visual_rotation(visual_angle),
        }
    }

    /// Final grid snap applied when the dial is let go. Returns the settled visual rotation, or
    /// `None` when snapping is off.
    pub fn snap_to_grid(&mut self) -> Option<Quat> {
        if !self.snap.enabled {
            return None;
        }
        self.backend_angle = grid_snap(self.backend_angle, self.snap.increment);
        self.dial_angle = clamp_axis(self.backend_angle.round());
        Some(self.visual_rotation(self.backend_angle))
    }

    fn in_snap_zone(&self) -> bool {
        if !self.snap.enabled || self.snap.increment <= 0.0 {
            return false;
        }
        let residual = (self.backend_angle % self.snap.increment).abs();
        residual <= self.snap.increment.min(self.snap.threshold)
    }

    fn constrain(&self, delta: f32) -> f32 {
        let clockwise = self.limits.clockwise;
        let ccw_stop = self.limits.counter_clockwise_stop();
        let current = self.backend_angle;
        let proposed = clamp_axis(current + delta);

        if is_nearly_zero(self.limits.counter_clockwise) {
            // No negative travel, so the value never wraps.
            clamp_range(current + delta, 0.0, clockwise)
        } else if is_nearly_zero(clockwise) {
            // Only negative travel: measure around 360 so leaving rest does not jump the seam.
            if current < ccw_stop {
                clamp_range(360.0 + delta, ccw_stop, 360.0)
            } else {
                clamp_range(current + delta, ccw_stop, 360.0)
            }
        } else if proposed > clockwise && proposed < ccw_stop {
            if current < ccw_stop {
                clockwise
            } else {
                ccw_stop
            }
        } else {
            proposed
        }
    }
}

fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}
