use crate::dial::{GripController, InteractorSample};
use crate::transform::Transform3D;
use bevy_ecs::prelude::*;

/// Marks a dial that is currently held, carrying the latest controller sample.
#[derive(Component, Debug, Clone, Copy)]
pub struct ActiveGrip {
    pub controller: Entity,
    pub sample: InteractorSample,
    pub authority: bool,
    pub drop_requested: bool,
}

impl ActiveGrip {
    pub fn new(controller: Entity, sample: InteractorSample, authority: bool) -> Self {
        Self { controller, sample, authority, drop_requested: false }
    }
}

impl GripController for ActiveGrip {
    fn has_grip_authority(&self) -> bool {
        self.authority
    }

    fn drop_object(&mut self) {
        self.drop_requested = true;
    }
}

/// Per-frame headset state shared by the XR systems.
#[derive(Resource, Debug, Clone, Copy)]
pub struct FrameContext {
    pub stereo_active: bool,
    /// Pose of the local player's tracking origin, if one is spawned.
    pub tracking_origin: Option<Transform3D>,
    pub view_count: usize,
    /// Bit `n` set means view `n` sees the widgets.
    pub visibility_map: u32,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self { stereo_active: false, tracking_origin: None, view_count: 1, visibility_map: 0b1 }
    }
}

impl FrameContext {
    /// Both eyes of an active headset.
    pub fn stereo(tracking_origin: Option<Transform3D>) -> Self {
        Self { stereo_active: true, tracking_origin, view_count: 2, visibility_map: 0b11 }
    }
}
