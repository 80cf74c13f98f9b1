use crate::stereo::LayerId;
use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum XrEvent {
    GripStarted { entity: Entity },
    GripReleased { entity: Entity, angle: f32 },
    GripForceDropped { entity: Entity, distance: f32 },
    SnapAngleReached { entity: Entity, angle: f32 },
    LayerCreated { entity: Entity, layer: LayerId },
    LayerDestroyed { entity: Entity, layer: LayerId },
}

impl XrEvent {
    pub fn entity(&self) -> Entity {
        match self {
            XrEvent::GripStarted { entity }
            | XrEvent::GripReleased { entity, .. }
            | XrEvent::GripForceDropped { entity, .. }
            | XrEvent::SnapAngleReached { entity, .. }
            | XrEvent::LayerCreated { entity, .. }
            | XrEvent::LayerDestroyed { entity, .. } => *entity,
        }
    }
}

impl fmt::Display for XrEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XrEvent::GripStarted { entity } => write!(f, "GripStarted entity={}", entity.index()),
            XrEvent::GripReleased { entity, angle } => {
                write!(f, "GripReleased entity={} angle={:.1}", entity.index(), angle)
            }
            XrEvent::GripForceDropped { entity, distance } => {
                write!(f, "GripForceDropped entity={} distance={:.3}", entity.index(), distance)
            }
            XrEvent::SnapAngleReached { entity, angle } => {
                write!(f, "SnapAngleReached entity={} angle={:.1}", entity.index(), angle)
            }
            XrEvent::LayerCreated { entity, layer } => {
                write!(f, "LayerCreated entity={} layer={}", entity.index(), layer.0)
            }
            XrEvent::LayerDestroyed { entity, layer } => {
                write!(f, "LayerDestroyed entity={} layer={}", entity.index(), layer.0)
            }
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<XrEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: XrEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<XrEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
