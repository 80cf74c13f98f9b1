pub mod angle_tracker;
pub mod grip;

pub use angle_tracker::{AngleTracker, AngleUpdate, DialLimits, SnapSettings};
pub use grip::{GripController, GripLifecycle, GripState, GripTick};

use crate::config::{DialConfig, MovementReplication};
use crate::rotator::Rotator;
use crate::transform::Transform3D;
use bevy_ecs::prelude::{Component, Entity};
use glam::Vec3;
use log::{debug, info};

/// Controller pose handed to the dial every gripped tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractorSample {
    pub world_transform: Transform3D,
    /// Controller rotation relative to its tracking origin; deltas are taken from this.
    pub relative_rotation: Rotator,
}

impl InteractorSample {
    pub fn new(world_transform: Transform3D, relative_rotation: Rotator) -> Self {
        Self { world_transform, relative_rotation }
    }
}

/// Grippable rotary dial. Turning the gripping controller about `interactor_rotation_axis` turns
/// the dial about `dial_rotation_axis`, within the configured stops.
#[derive(Component, Debug, Clone)]
pub struct DialComponent {
    tracker: AngleTracker,
    grip: GripLifecycle,
    parent_transform: Transform3D,
    relative_transform: Transform3D,
    initial_relative_transform: Transform3D,
    movement_replication: MovementReplication,
}

impl DialComponent {
    pub fn new(config: &DialConfig) -> Self {
        Self {
            tracker: AngleTracker::new(config.limits(), config.snap_settings(), config.dial_rotation_axis),
            grip: GripLifecycle::new(config.interactor_rotation_axis, config.break_distance),
            parent_transform: Transform3D::IDENTITY,
            relative_transform: Transform3D::IDENTITY,
            initial_relative_transform: Transform3D::IDENTITY,
            movement_replication: config.movement_replication,
        }
    }

    pub fn with_relative_transform(mut self, relative: Transform3D) -> Self {
        self.relative_transform = relative;
        self.reset_initial_dial_location();
        self
    }

    pub fn with_parent_transform(mut self, parent: Transform3D) -> Self {
        self.parent_transform = parent;
        self
    }

    /// Captures the current pose as the dial's rest position and zeroes the angle.
    pub fn reset_initial_dial_location(&mut self) {
        self.initial_relative_transform = self.relative_transform;
        self.tracker.reset(self.relative_transform.rotation);
    }

    pub fn set_parent_transform(&mut self, parent: Transform3D) {
        self.parent_transform = parent;
    }

    pub fn relative_transform(&self) -> Transform3D {
        self.relative_transform
    }

    pub fn initial_relative_transform(&self) -> Transform3D {
        self.initial_relative_transform
    }

    pub fn world_transform(&self) -> Transform3D {
        self.relative_transform.compose(&self.parent_transform)
    }

    pub fn current_dial_angle(&self) -> f32 {
        self.tracker.dial_angle()
    }

    pub fn backend_angle(&self) -> f32 {
        self.tracker.backend_angle()
    }

    pub fn tracker(&self) -> &AngleTracker {
        &self.tracker
    }

    pub fn grip_state(&self) -> GripState {
        self.grip.state()
    }

    /// Per-tick updates only run while gripped.
    pub fn is_tick_enabled(&self) -> bool {
        self.grip.is_gripped()
    }

    pub fn is_held(&self) -> bool {
        self.grip.is_gripped()
    }

    pub fn holding_controller(&self) -> Option<Entity> {
        self.grip.holding_controller()
    }

    pub fn grip_break_distance(&self) -> f32 {
        self.grip.break_distance()
    }

    pub fn movement_replication(&self) -> MovementReplication {
        self.movement_replication
    }

    fn interactor_local_location(&self, sample: &InteractorSample) -> Vec3 {
        sample.world_transform.relative_to(&self.world_transform()).translation
    }

    pub fn on_grip(&mut self, controller: Entity, sample: &InteractorSample) {
        let local = self.interactor_local_location(sample);
        self.grip.begin(controller, local, sample.relative_rotation);
        debug!("[dial] gripped by controller {} at local {:?}", controller.index(), local);
    }

    pub fn tick_grip(&mut self, controller: &mut dyn GripController, sample: &InteractorSample) -> GripTick {
        let local = self.interactor_local_location(sample);
        let tick = self.grip.tick(controller, local, sample.relative_rotation, &mut self.tracker);
        match tick {
            GripTick::Advanced(update) => {
                self.relative_transform.rotation = update.rotation;
            }
            GripTick::Dropped { distance } => {
                info!(
                    "[dial] interactor moved {distance:.2} from grip point (break distance {:.2}), dropping",
                    self.grip.break_distance()
                );
            }
            GripTick::Ignored => {}
        }
        tick
    }

    /// Ends the grip and returns the settled dial angle.
    pub fn on_grip_release(&mut self) -> f32 {
        if let Some(rotation) = self.grip.end(&mut self.tracker) {
            self.relative_transform.rotation = rotation;
        }
        debug!("[dial] released at {:.1} degrees", self.tracker.dial_angle());
        self.tracker.dial_angle()
    }
}
