use super::angle_tracker::{AngleTracker, AngleUpdate};
use crate::rotator::{InteractionAxis, Rotator};
use bevy_ecs::prelude::Entity;
use glam::{Quat, Vec3};

/// What the host interaction framework exposes to a gripped interactable.
pub trait GripController {
    /// Whether this side of the session decides when the grip breaks.
    fn has_grip_authority(&self) -> bool;
    /// Asks the framework to let go of the gripped object.
    fn drop_object(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GripState {
    #[default]
    Idle,
    Gripped,
}

/// Result of one gripped tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GripTick {
    /// Not gripped; nothing was evaluated.
    Ignored,
    /// The hand moved past the break distance and a drop was requested.
    Dropped { distance: f32 },
    Advanced(AngleUpdate),
}

#[derive(Debug, Clone)]
pub struct GripLifecycle {
    state: GripState,
    interactor_axis: InteractionAxis,
    break_distance: f32,
    initial_interactor_location: Vec3,
    last_interactor_rotation: Rotator,
    holding_controller: Option<Entity>,
}

impl GripLifecycle {
    pub fn new(interactor_axis: InteractionAxis, break_distance: f32) -> Self {
        Self {
            state: GripState::Idle,
            interactor_axis,
            break_distance,
            initial_interactor_location: Vec3::ZERO,
            last_interactor_rotation: Rotator::ZERO,
            holding_controller: None,
        }
    }

    pub fn state(&self) -> GripState {
        self.state
    }

    pub fn is_gripped(&self) -> bool {
        self.state == GripState::Gripped
    }

    pub fn holding_controller(&self) -> Option<Entity> {
        self.holding_controller
    }

    pub fn break_distance(&self) -> f32 {
        self.break_distance
    }

    pub fn initial_interactor_location(&self) -> Vec3 {
        self.initial_interactor_location
    }

    /// `local_location` is the controller position in the dial's space.
    pub fn begin(&mut self, controller: Entity, local_location: Vec3, rotation: Rotator) {
        self.initial_interactor_location = local_location;
        self.last_interactor_rotation = rotation;
        self.holding_controller = Some(controller);
        self.state = GripState::Gripped;
    }

    pub fn tick(
        &mut self,
        controller: &mut dyn GripController,
        local_location: Vec3,
        rotation: Rotator,
        tracker: &mut AngleTracker,
    ) -> GripTick {
        if self.state != GripState::Gripped {
            return GripTick::Ignored;
        }

        if controller.has_grip_authority() {
            let distance = local_location.distance(self.initial_interactor_location);
            if self.break_distance > 0.0 && distance > self.break_distance {
                controller.drop_object();
                return GripTick::Dropped { distance };
            }
        }

        let delta = (rotation - self.last_interactor_rotation).normalized().axis_value(self.interactor_axis);
        let update = tracker.advance(delta);
        self.last_interactor_rotation = rotation;
        GripTick::Advanced(update)
    }

    /// Leaves the gripped state, returning the settled rotation if a release snap applied.
    pub fn end(&mut self, tracker: &mut AngleTracker) -> Option<Quat> {
        let was_gripped = self.state == GripState::Gripped;
        self.state = GripState::Idle;
        self.holding_controller = None;
        if was_gripped {
            tracker.snap_to_grid()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dial::angle_tracker::{DialLimits, SnapSettings};

    #[derive(Default)]
    struct FakeController {
        authority: bool,
        drops: u32,
    }

    impl GripController for FakeController {
        fn has_grip_authority(&self) -> bool {
            self.authority
        }

        fn drop_object(&mut self) {
            self.drops += 1;
        }
    }

    fn setup() -> (GripLifecycle, AngleTracker) {
        let grip = GripLifecycle::new(InteractionAxis::X, 10.0);
        let tracker = AngleTracker::new(DialLimits::unbounded(), SnapSettings::default(), InteractionAxis::Z);
        (grip, tracker)
    }

    #[test]
    fn idle_ticks_are_ignored() {
        let (mut grip, mut tracker) = setup();
        let mut controller = FakeController { authority: true, drops: 0 };
        let tick = grip.tick(&mut controller, Vec3::ZERO, Rotator::new(0.0, 0.0, 30.0), &mut tracker);
        assert_eq!(tick, GripTick::Ignored);
        assert_eq!(tracker.backend_angle(), 0.0);
    }

    #[test]
    fn exact_break_distance_keeps_grip() {
        let (mut grip, mut tracker) = setup();
        let mut controller = FakeController { authority: true, drops: 0 };
        grip.begin(Entity::from_raw(7), Vec3::ZERO, Rotator::ZERO);
        let tick = grip.tick(&mut controller, Vec3::new(10.0, 0.0, 0.0), Rotator::new(0.0, 0.0, 15.0), &mut tracker);
        assert!(matches!(tick, GripTick::Advanced(_)));
        assert_eq!(controller.drops, 0);
        assert_eq!(tracker.backend_angle(), 15.0);
    }

    #[test]
    fn past_break_distance_drops_without_rotating() {
        let (mut grip, mut tracker) = setup();
        let mut controller = FakeController { authority: true, drops: 0 };
        grip.begin(Entity::from_raw(7), Vec3::ZERO, Rotator::ZERO);
        let tick =
            grip.tick(&mut controller, Vec3::new(10.01, 0.0, 0.0), Rotator::new(0.0, 0.0, 15.0), &mut tracker);
        assert!(matches!(tick, GripTick::Dropped { .. }));
        assert_eq!(controller.drops, 1);
        assert_eq!(tracker.backend_angle(), 0.0);
    }

    #[test]
    fn without_authority_distance_is_not_enforced() {
        let (mut grip, mut tracker) = setup();
        let mut controller = FakeController { authority: false, drops: 0 };
        grip.begin(Entity::from_raw(1), Vec3::ZERO, Rotator::ZERO);
        let tick = grip.tick(&mut controller, Vec3::splat(500.0), Rotator::new(0.0, 0.0, 5.0), &mut tracker);
        assert!(matches!(tick, GripTick::Advanced(_)));
        assert_eq!(controller.drops, 0);
    }

    #[test]
    fn release_returns_to_idle() {
        let (mut grip, mut tracker) = setup();
        grip.begin(Entity::from_raw(3), Vec3::ZERO, Rotator::ZERO);
        assert_eq!(grip.holding_controller(), Some(Entity::from_raw(3)));
        assert!(grip.end(&mut tracker).is_none());
        assert_eq!(grip.state(), GripState::Idle);
        assert!(grip.holding_controller().is_none());
    }
}
