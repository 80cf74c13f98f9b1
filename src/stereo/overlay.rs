use super::layers::{
    CompositorCapability, LayerDesc, LayerFlags, LayerId, LayerPositionType, LayerShape, StereoLayers, UvRect,
};
use super::projector::GeometryMode;
use super::RenderTarget;
use crate::config::{StereoWidgetConfig, MAX_CYLINDER_ARC_DEGREES, MIN_CYLINDER_ARC_DEGREES};
use crate::transform::Transform3D;
use glam::{UVec2, Vec2};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reference frame an overlay layer is positioned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// Not honoured by current compositors; such widgets are placed tracker-locked.
    WorldLocked,
    #[default]
    TrackerLocked,
}

/// Per-frame inputs of the overlay sync.
#[derive(Debug, Clone, Copy)]
pub struct OverlayFrame<'a> {
    pub stereo_active: bool,
    pub component_transform: Transform3D,
    /// Pose of the local player's tracking origin, when one is spawned.
    pub tracking_origin: Option<Transform3D>,
    pub visible: bool,
    pub render_target: Option<&'a RenderTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerAction {
    /// Preconditions failed; the widget renders through its mesh this frame.
    Inactive,
    Unchanged,
    Created(LayerId),
    Updated(LayerId),
    Destroyed(LayerId),
    /// Dirty while hidden with no layer to remove.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlaySync {
    pub action: LayerAction,
    pub texture_refreshed: bool,
}

impl OverlaySync {
    const INACTIVE: OverlaySync = OverlaySync { action: LayerAction::Inactive, texture_refreshed: false };
}

#[derive(Debug, Clone)]
pub struct StereoLayerState {
    layer_id: Option<LayerId>,
    is_dirty: bool,
    texture_needs_update: bool,
    last_transform: Transform3D,
    last_visible: bool,
    draw_size: UVec2,
    quad_size: Vec2,
    uv_rect: UvRect,
    priority: i32,
    geometry_mode: GeometryMode,
    cylinder_arc_angle: f32,
    flags: LayerFlags,
    lock_mode: LockMode,
}

impl StereoLayerState {
    pub fn from_config(config: &StereoWidgetConfig) -> Self {
        let mut flags = LayerFlags::empty();
        flags.set(LayerFlags::TEX_CONTINUOUS_UPDATE, config.continuous_update);
        flags.set(LayerFlags::TEX_NO_ALPHA_CHANNEL, config.no_alpha_channel);
        flags.set(LayerFlags::QUAD_PRESERVE_TEX_RATIO, config.quad_preserve_texture_ratio);
        flags.set(LayerFlags::SUPPORT_DEPTH, config.supports_depth);
        Self {
            layer_id: None,
            is_dirty: true,
            texture_needs_update: false,
            last_transform: Transform3D::IDENTITY,
            last_visible: false,
            draw_size: config.draw_size(),
            quad_size: config.quad_size(),
            uv_rect: config.uv_rect(),
            priority: config.priority,
            geometry_mode: config.geometry_mode,
            cylinder_arc_angle: config.cylinder_arc_angle.clamp(MIN_CYLINDER_ARC_DEGREES, MAX_CYLINDER_ARC_DEGREES),
            flags,
            lock_mode: config.lock_mode,
        }
    }

    pub fn layer_id(&self) -> Option<LayerId> {
        self.layer_id
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn texture_needs_update(&self) -> bool {
        self.texture_needs_update
    }

    pub fn last_transform(&self) -> Transform3D {
        self.last_transform
    }

    pub fn last_visible(&self) -> bool {
        self.last_visible
    }

    /// Widget draw size in pixels; sizes the cylinder layer.
    pub fn draw_size(&self) -> UVec2 {
        self.draw_size
    }

    pub fn quad_size(&self) -> Vec2 {
        self.quad_size
    }

    pub fn uv_rect(&self) -> UvRect {
        self.uv_rect
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn geometry_mode(&self) -> GeometryMode {
        self.geometry_mode
    }

    /// Degrees.
    pub fn cylinder_arc_angle(&self) -> f32 {
        self.cylinder_arc_angle
    }

    pub fn flags(&self) -> LayerFlags {
        self.flags
    }

    pub fn lock_mode(&self) -> LockMode {
        self.lock_mode
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn set_draw_size(&mut self, draw_size: UVec2) {
        if self.draw_size != draw_size {
            self.draw_size = draw_size;
            self.is_dirty = true;
        }
    }

    pub fn set_quad_size(&mut self, quad_size: Vec2) {
        if self.quad_size != quad_size {
            self.quad_size = quad_size;
            self.is_dirty = true;
        }
    }

    pub fn set_priority(&mut self, priority: i32) {
        if self.priority != priority {
            self.priority = priority;
            self.is_dirty = true;
        }
    }

    pub fn set_uv_rect(&mut self, uv_rect: UvRect) {
        if self.uv_rect != uv_rect {
            self.uv_rect = uv_rect;
            self.is_dirty = true;
        }
    }

    pub fn set_geometry_mode(&mut self, mode: GeometryMode) {
        if self.geometry_mode != mode {
            self.geometry_mode = mode;
            self.is_dirty = true;
        }
    }

    pub fn set_cylinder_arc_angle(&mut self, degrees: f32) {
        let degrees = if degrees.is_finite() {
            degrees.clamp(MIN_CYLINDER_ARC_DEGREES, MAX_CYLINDER_ARC_DEGREES)
        } else {
            MIN_CYLINDER_ARC_DEGREES
        };
        if self.cylinder_arc_angle != degrees {
            self.cylinder_arc_angle = degrees;
            self.is_dirty = true;
        }
    }

    pub fn set_flags(&mut self, flags: LayerFlags) {
        if self.flags != flags {
            self.flags = flags;
            self.is_dirty = true;
        }
    }

    pub fn mark_texture_for_update(&mut self) {
        self.texture_needs_update = true;
    }

    /// Descriptor for the current settings. Cylinder radius and height come from the draw size.
    pub fn layer_desc(&self, transform: Transform3D, render_target: &RenderTarget) -> LayerDesc {
        let draw_size = self.draw_size.as_vec2();
        let shape = match self.geometry_mode {
            GeometryMode::Plane => LayerShape::Quad,
            GeometryMode::Cylinder => {
                let arc_radians = self.cylinder_arc_angle.to_radians();
                LayerShape::Cylinder {
                    radius: draw_size.x / arc_radians,
                    overlay_arc: self.cylinder_arc_angle,
                    height: draw_size.y,
                }
            }
        };
        LayerDesc {
            priority: self.priority,
            quad_size: self.quad_size,
            uv_rect: self.uv_rect,
            transform,
            texture: Some(render_target.texture),
            shape,
            flags: self.flags,
            position_type: LayerPositionType::TrackerLocked,
        }
    }
}

/// Keeps one native overlay layer in step with a widget.
pub struct OverlayLayerManager {
    state: StereoLayerState,
    layers: Option<Arc<dyn StereoLayers>>,
    warned_world_locked: bool,
}

impl OverlayLayerManager {
    pub fn new(state: StereoLayerState, compositor: &CompositorCapability) -> Self {
        Self { state, layers: compositor.stereo_layers().cloned(), warned_world_locked: false }
    }

    pub fn state(&self) -> &StereoLayerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StereoLayerState {
        &mut self.state
    }

    pub fn has_stereo_layers(&self) -> bool {
        self.layers.is_some()
    }

    /// Whether the overlay path can be used this frame.
    pub fn overlay_available(&self, stereo_active: bool) -> bool {
        stereo_active && self.layers.is_some()
    }

    fn layer_transform(&mut self, frame: &OverlayFrame<'_>) -> Transform3D {
        if self.state.lock_mode == LockMode::WorldLocked && !self.warned_world_locked {
            warn!("[stereo] world-locked overlay layers are unsupported, placing the layer tracker-locked");
            self.warned_world_locked = true;
        }
        match frame.tracking_origin {
            Some(origin) => {
                // The widget redraws continuously, so the compositor has to re-sample each frame.
                self.state.texture_needs_update = true;
                frame.component_transform.relative_to(&origin)
            }
            None => Transform3D::IDENTITY,
        }
    }

    pub fn update(&mut self, frame: &OverlayFrame<'_>) -> OverlaySync {
        if !frame.stereo_active {
            return OverlaySync::INACTIVE;
        }
        let Some(layers) = self.layers.clone() else {
            return OverlaySync::INACTIVE;
        };
        let Some(render_target) = frame.render_target else {
            return OverlaySync::INACTIVE;
        };

        let transform = self.layer_transform(frame);
        let visible = frame.visible && render_target.ready;

        if !self.state.is_dirty && (self.state.last_visible != visible || self.state.last_transform != transform) {
            self.state.is_dirty = true;
        }

        let mut action = LayerAction::Unchanged;
        if self.state.is_dirty {
            action = if visible {
                let desc = self.state.layer_desc(transform, render_target);
                match self.state.layer_id {
                    Some(id) if layers.layer_exists(id) => {
                        layers.set_layer_desc(id, &desc);
                        LayerAction::Updated(id)
                    }
                    _ => {
                        let id = layers.create_layer(&desc);
                        debug!("[stereo] created overlay layer {}", id.0);
                        self.state.layer_id = Some(id);
                        LayerAction::Created(id)
                    }
                }
            } else {
                match self.state.layer_id.take() {
                    Some(id) => {
                        layers.destroy_layer(id);
                        debug!("[stereo] destroyed overlay layer {}", id.0);
                        LayerAction::Destroyed(id)
                    }
                    None => LayerAction::Hidden,
                }
            };
            self.state.last_transform = transform;
            self.state.last_visible = visible;
            self.state.is_dirty = false;
        }

        let mut texture_refreshed = false;
        if self.state.texture_needs_update {
            if let Some(id) = self.state.layer_id {
                layers.mark_texture_for_update(id);
                self.state.texture_needs_update = false;
                texture_refreshed = true;
            }
        }

        OverlaySync { action, texture_refreshed }
    }

    /// Destroys the compositor layer, if any. Safe to call more than once.
    pub fn release(&mut self) -> Option<LayerId> {
        let id = self.state.layer_id.take()?;
        if let Some(layers) = &self.layers {
            layers.destroy_layer(id);
            debug!("[stereo] released overlay layer {}", id.0);
        }
        self.state.is_dirty = true;
        Some(id)
    }
}

impl Drop for OverlayLayerManager {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stereo::layers::{HeadlessStereoLayers, LayerCall, TextureId};
    use glam::Vec3;

    fn manager(config: &StereoWidgetConfig) -> (OverlayLayerManager, Arc<HeadlessStereoLayers>) {
        let layers = Arc::new(HeadlessStereoLayers::new());
        let capability = CompositorCapability::new(layers.clone());
        (OverlayLayerManager::new(StereoLayerState::from_config(config), &capability), layers)
    }

    fn target() -> RenderTarget {
        RenderTarget::new(TextureId(9), UVec2::new(400, 300))
    }

    fn frame(target: &RenderTarget, visible: bool) -> OverlayFrame<'_> {
        OverlayFrame {
            stereo_active: true,
            component_transform: Transform3D::from_translation(Vec3::new(0.0, 1.0, -2.0)),
            tracking_origin: None,
            visible,
            render_target: Some(target),
        }
    }

    #[test]
    fn inactive_without_stereo_or_target() {
        let (mut overlay, layers) = manager(&StereoWidgetConfig::default());
        let rt = target();
        let mut f = frame(&rt, true);
        f.stereo_active = false;
        assert_eq!(overlay.update(&f).action, LayerAction::Inactive);
        f.stereo_active = true;
        f.render_target = None;
        assert_eq!(overlay.update(&f).action, LayerAction::Inactive);
        assert!(layers.calls().is_empty());
    }

    #[test]
    fn creates_once_then_stays_quiet() {
        let (mut overlay, layers) = manager(&StereoWidgetConfig::default());
        let rt = target();
        let first = overlay.update(&frame(&rt, true));
        assert_eq!(first.action, LayerAction::Created(LayerId(1)));
        assert_eq!(overlay.update(&frame(&rt, true)).action, LayerAction::Unchanged);
        assert_eq!(layers.calls(), vec![LayerCall::Create(LayerId(1))]);
    }

    #[test]
    fn cylinder_desc_derives_radius_from_draw_width() {
        let config = StereoWidgetConfig {
            geometry_mode: GeometryMode::Cylinder,
            cylinder_arc_angle: 90.0,
            draw_size: [400, 300],
            no_alpha_channel: true,
            ..Default::default()
        };
        let (mut overlay, layers) = manager(&config);
        let rt = target();
        overlay.update(&frame(&rt, true));
        let desc = layers.layer_desc(LayerId(1)).expect("layer exists");
        match desc.shape {
            LayerShape::Cylinder { radius, overlay_arc, height } => {
                assert!((radius - 400.0 / std::f32::consts::FRAC_PI_2).abs() < 1e-3);
                assert_eq!(overlay_arc, 90.0);
                assert_eq!(height, 300.0);
            }
            LayerShape::Quad => panic!("expected a cylinder layer"),
        }
        assert!(desc.flags.contains(LayerFlags::TEX_CONTINUOUS_UPDATE | LayerFlags::TEX_NO_ALPHA_CHANNEL));
        assert!(!desc.flags.contains(LayerFlags::SUPPORT_DEPTH));
        assert_eq!(desc.position_type, LayerPositionType::TrackerLocked);
        assert_eq!(desc.texture, Some(TextureId(9)));
    }

    #[test]
    fn texture_refresh_is_independent_of_dirty_state() {
        let (mut overlay, layers) = manager(&StereoWidgetConfig::default());
        let rt = target();
        overlay.update(&frame(&rt, true));
        layers.clear_calls();
        overlay.state_mut().mark_texture_for_update();
        let sync = overlay.update(&frame(&rt, true));
        assert_eq!(sync.action, LayerAction::Unchanged);
        assert!(sync.texture_refreshed);
        assert_eq!(layers.calls(), vec![LayerCall::MarkTexture(LayerId(1))]);
        assert!(!overlay.update(&frame(&rt, true)).texture_refreshed);
    }

    #[test]
    fn setters_dirty_only_on_change() {
        let (mut overlay, layers) = manager(&StereoWidgetConfig::default());
        let rt = target();
        overlay.update(&frame(&rt, true));
        overlay.state_mut().set_priority(0);
        overlay.state_mut().set_quad_size(Vec2::splat(500.0));
        assert!(!overlay.state().is_dirty());
        overlay.state_mut().set_priority(3);
        assert!(overlay.state().is_dirty());
        assert_eq!(overlay.update(&frame(&rt, true)).action, LayerAction::Updated(LayerId(1)));
        assert_eq!(layers.layer_desc(LayerId(1)).map(|d| d.priority), Some(3));
    }

    #[test]
    fn drop_destroys_layer() {
        let (mut overlay, layers) = manager(&StereoWidgetConfig::default());
        let rt = target();
        overlay.update(&frame(&rt, true));
        assert_eq!(layers.layer_count(), 1);
        drop(overlay);
        assert_eq!(layers.layer_count(), 0);
        assert_eq!(layers.calls().last(), Some(&LayerCall::Destroy(LayerId(1))));
    }
}
