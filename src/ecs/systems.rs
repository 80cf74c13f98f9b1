use super::types::*;
use crate::dial::{DialComponent, GripTick};
use crate::events::{EventBus, XrEvent};
use crate::stereo::{LayerAction, StereoWidget};
use bevy_ecs::prelude::*;
use bevy_ecs::system::{Commands, Res, ResMut};
use log::debug;

pub fn sys_tick_dials(
    mut commands: Commands,
    mut q: Query<(Entity, &mut DialComponent, &mut ActiveGrip)>,
    mut events: ResMut<EventBus>,
) {
    for (entity, mut dial, mut grip) in &mut q {
        let sample = grip.sample;
        match dial.tick_grip(&mut *grip, &sample) {
            GripTick::Advanced(update) => {
                if let Some(angle) = update.snap_reached {
                    events.push(XrEvent::SnapAngleReached { entity, angle });
                }
            }
            GripTick::Dropped { distance } => {
                let angle = dial.on_grip_release();
                events.push(XrEvent::GripForceDropped { entity, distance });
                events.push(XrEvent::GripReleased { entity, angle });
                commands.entity(entity).remove::<ActiveGrip>();
            }
            GripTick::Ignored => {
                debug!("[dial] entity {} has a grip marker but is not gripped", entity.index());
                commands.entity(entity).remove::<ActiveGrip>();
            }
        }
    }
}

pub fn sys_update_stereo_widgets(
    mut q: Query<(Entity, &mut StereoWidget)>,
    frame: Res<FrameContext>,
    mut events: ResMut<EventBus>,
) {
    for (entity, mut widget) in &mut q {
        let sync = widget.tick(frame.stereo_active, frame.tracking_origin);
        match sync.action {
            LayerAction::Created(layer) => events.push(XrEvent::LayerCreated { entity, layer }),
            LayerAction::Destroyed(layer) => events.push(XrEvent::LayerDestroyed { entity, layer }),
            LayerAction::Inactive | LayerAction::Unchanged | LayerAction::Updated(_) | LayerAction::Hidden => {}
        }
    }
}
