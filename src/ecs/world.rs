use super::*;
use crate::config::{DialConfig, StereoWidgetConfig};
use crate::dial::{DialComponent, InteractorSample};
use crate::events::{EventBus, XrEvent};
use crate::stereo::{CompositorCapability, FrameMeshCollector, LayerId, StereoWidget};
use crate::transform::Transform3D;
use anyhow::{anyhow, bail, Result};
use bevy_ecs::prelude::{Entity, Mut, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use log::debug;

// ---------- World container ----------
pub struct XrWorld {
    pub world: World,
    schedule: Schedule,
}

impl Default for XrWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl XrWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(EventBus::default());
        world.insert_resource(FrameContext::default());

        let mut schedule = Schedule::default();
        schedule.add_systems((sys_tick_dials, sys_update_stereo_widgets).chain());

        Self { world, schedule }
    }

    pub fn update(&mut self) {
        self.schedule.run(&mut self.world);
    }

    pub fn frame_context(&self) -> FrameContext {
        *self.world.resource::<FrameContext>()
    }

    pub fn set_frame_context(&mut self, frame: FrameContext) {
        *self.world.resource_mut::<FrameContext>() = frame;
    }

    pub fn drain_events(&mut self) -> Vec<XrEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn spawn_dial(&mut self, config: &DialConfig, relative: Transform3D) -> Entity {
        let dial = DialComponent::new(config).with_relative_transform(relative);
        self.world.spawn(dial).id()
    }

    pub fn dial(&self, entity: Entity) -> Option<&DialComponent> {
        self.world.get::<DialComponent>(entity)
    }

    pub fn set_dial_parent_transform(&mut self, entity: Entity, parent: Transform3D) -> Result<()> {
        let mut dial = self
            .world
            .get_mut::<DialComponent>(entity)
            .ok_or_else(|| anyhow!("Entity {} is not a dial", entity.index()))?;
        dial.set_parent_transform(parent);
        Ok(())
    }

    pub fn grip_dial(
        &mut self,
        entity: Entity,
        controller: Entity,
        sample: InteractorSample,
        authority: bool,
    ) -> Result<()> {
        if self.world.get::<ActiveGrip>(entity).is_some() {
            bail!("Dial {} is already held", entity.index());
        }
        let mut dial = self
            .world
            .get_mut::<DialComponent>(entity)
            .ok_or_else(|| anyhow!("Entity {} is not a dial", entity.index()))?;
        dial.on_grip(controller, &sample);
        self.world.entity_mut(entity).insert(ActiveGrip::new(controller, sample, authority));
        self.world.resource_mut::<EventBus>().push(XrEvent::GripStarted { entity });
        Ok(())
    }

    /// Feeds the controller pose used by the next `update`.
    pub fn set_grip_sample(&mut self, entity: Entity, sample: InteractorSample) -> Result<()> {
        let mut grip = self
            .world
            .get_mut::<ActiveGrip>(entity)
            .ok_or_else(|| anyhow!("Dial {} is not held", entity.index()))?;
        grip.sample = sample;
        Ok(())
    }

    pub fn is_dial_held(&self, entity: Entity) -> bool {
        self.world.get::<ActiveGrip>(entity).is_some()
    }

    /// Releases a held dial and returns its settled angle.
    pub fn release_dial(&mut self, entity: Entity) -> Result<f32> {
        if self.world.get::<ActiveGrip>(entity).is_none() {
            bail!("Dial {} is not held", entity.index());
        }
        let mut dial = self
            .world
            .get_mut::<DialComponent>(entity)
            .ok_or_else(|| anyhow!("Entity {} is not a dial", entity.index()))?;
        let angle = dial.on_grip_release();
        self.world.entity_mut(entity).remove::<ActiveGrip>();
        self.world.resource_mut::<EventBus>().push(XrEvent::GripReleased { entity, angle });
        Ok(angle)
    }

    pub fn spawn_widget(
        &mut self,
        config: &StereoWidgetConfig,
        compositor: CompositorCapability,
        transform: Transform3D,
    ) -> Entity {
        let mut widget = StereoWidget::new(config, compositor);
        widget.set_world_transform(transform);
        self.world.spawn(widget).id()
    }

    pub fn widget(&self, entity: Entity) -> Option<&StereoWidget> {
        self.world.get::<StereoWidget>(entity)
    }

    pub fn widget_mut(&mut self, entity: Entity) -> Option<Mut<'_, StereoWidget>> {
        self.world.get_mut::<StereoWidget>(entity)
    }

    /// Removes a widget, destroying its compositor layer first.
    pub fn despawn_widget(&mut self, entity: Entity) -> Result<Option<LayerId>> {
        let mut widget = self
            .world
            .get_mut::<StereoWidget>(entity)
            .ok_or_else(|| anyhow!("Entity {} is not a stereo widget", entity.index()))?;
        let layer = widget.teardown();
        if let Some(layer) = layer {
            self.world.resource_mut::<EventBus>().push(XrEvent::LayerDestroyed { entity, layer });
        }
        self.world.despawn(entity);
        debug!("[stereo] despawned widget {}", entity.index());
        Ok(layer)
    }

    /// Builds the fallback meshes of every widget that cannot use an overlay layer this frame.
    pub fn collect_surface_meshes(&mut self) -> FrameMeshCollector {
        let frame = self.frame_context();
        let mut collector = FrameMeshCollector::new();
        let mut q = self.world.query::<&mut StereoWidget>();
        for mut widget in q.iter_mut(&mut self.world) {
            if !widget.is_visible() {
                continue;
            }
            if let Some(proxy) = widget.create_render_proxy(frame.stereo_active) {
                proxy.get_dynamic_mesh_elements(frame.view_count, frame.visibility_map, &mut collector);
            }
        }
        collector
    }
}
