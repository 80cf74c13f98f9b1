pub mod layers;
pub mod overlay;
pub mod projector;

pub use layers::{
    CompositorCapability, HeadlessStereoLayers, LayerCall, LayerDesc, LayerFlags, LayerId, LayerPositionType,
    LayerShape, StereoLayers, TextureId, UvRect,
};
pub use overlay::{LayerAction, LockMode, OverlayFrame, OverlayLayerManager, OverlaySync, StereoLayerState};
pub use projector::{
    project_surface, FrameMeshCollector, GeometryMode, MeshElementCollector, ProjectedSurface,
    ProjectedSurfaceDescriptor, SurfaceParams, SurfaceProxy,
};

use crate::config::StereoWidgetConfig;
use crate::transform::Transform3D;
use bevy_ecs::prelude::Component;
use glam::{UVec2, Vec2};
use log::debug;

/// Texture a widget draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub texture: TextureId,
    pub size: UVec2,
    /// False until the first frame has been drawn into the texture.
    pub ready: bool,
}

impl RenderTarget {
    pub fn new(texture: TextureId, size: UVec2) -> Self {
        Self { texture, size, ready: true }
    }

    pub fn pending(texture: TextureId, size: UVec2) -> Self {
        Self { texture, size, ready: false }
    }
}

/// UI surface shown to a headset either through a compositor overlay layer or, when that is not
/// possible, through a projected plane/cylinder mesh.
#[derive(Component)]
pub struct StereoWidget {
    overlay: OverlayLayerManager,
    pivot: Vec2,
    world_transform: Transform3D,
    visible: bool,
    render_target: Option<RenderTarget>,
    should_create_proxy: bool,
}

impl StereoWidget {
    pub fn new(config: &StereoWidgetConfig, compositor: CompositorCapability) -> Self {
        let overlay = OverlayLayerManager::new(StereoLayerState::from_config(config), &compositor);
        Self {
            overlay,
            pivot: config.pivot(),
            world_transform: Transform3D::IDENTITY,
            visible: true,
            render_target: None,
            should_create_proxy: false,
        }
    }

    pub fn layer_state(&self) -> &StereoLayerState {
        self.overlay.state()
    }

    pub fn layer_id(&self) -> Option<LayerId> {
        self.overlay.state().layer_id()
    }

    pub fn draw_size(&self) -> UVec2 {
        self.overlay.state().draw_size()
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    pub fn world_transform(&self) -> Transform3D {
        self.world_transform
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn render_target(&self) -> Option<&RenderTarget> {
        self.render_target.as_ref()
    }

    /// Set by the last `create_render_proxy`: whether the mesh path is in use.
    pub fn should_create_proxy(&self) -> bool {
        self.should_create_proxy
    }

    pub fn set_render_target(&mut self, target: Option<RenderTarget>) {
        if self.render_target != target {
            self.render_target = target;
            self.overlay.state_mut().mark_dirty();
        }
    }

    pub fn set_world_transform(&mut self, transform: Transform3D) {
        self.world_transform = transform;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn set_draw_size(&mut self, draw_size: UVec2) {
        self.overlay.state_mut().set_draw_size(draw_size);
    }

    pub fn set_quad_size(&mut self, quad_size: Vec2) {
        self.overlay.state_mut().set_quad_size(quad_size);
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.overlay.state_mut().set_priority(priority);
    }

    pub fn set_uv_rect(&mut self, uv_rect: UvRect) {
        self.overlay.state_mut().set_uv_rect(uv_rect);
    }

    pub fn set_geometry_mode(&mut self, mode: GeometryMode) {
        self.overlay.state_mut().set_geometry_mode(mode);
    }

    pub fn set_cylinder_arc_angle(&mut self, degrees: f32) {
        self.overlay.state_mut().set_cylinder_arc_angle(degrees);
    }

    pub fn set_layer_flags(&mut self, flags: LayerFlags) {
        self.overlay.state_mut().set_flags(flags);
    }

    pub fn mark_texture_for_update(&mut self) {
        self.overlay.state_mut().mark_texture_for_update();
    }

    pub fn overlay_available(&self, stereo_active: bool) -> bool {
        self.overlay.overlay_available(stereo_active)
    }

    /// Per-frame overlay sync.
    pub fn tick(&mut self, stereo_active: bool, tracking_origin: Option<Transform3D>) -> OverlaySync {
        let frame = OverlayFrame {
            stereo_active,
            component_transform: self.world_transform,
            tracking_origin,
            visible: self.visible,
            render_target: self.render_target.as_ref(),
        };
        self.overlay.update(&frame)
    }

    /// Mesh inputs for the current render target, or `None` until one is bound and drawn into.
    pub fn surface_params(&self) -> Option<SurfaceParams> {
        let target = self.render_target.as_ref().filter(|target| target.ready)?;
        let state = self.overlay.state();
        Some(SurfaceParams {
            size: target.size.as_vec2(),
            pivot: self.pivot,
            geometry_mode: state.geometry_mode(),
            arc_angle_radians: state.cylinder_arc_angle().to_radians(),
        })
    }

    /// Chooses the rendering path. Returns a mesh proxy only when no overlay layer can be used.
    pub fn create_render_proxy(&mut self, stereo_active: bool) -> Option<SurfaceProxy> {
        self.should_create_proxy = !self.overlay.overlay_available(stereo_active);
        if !self.should_create_proxy {
            return None;
        }
        debug!("[stereo] overlay unavailable, drawing widget through a projected mesh");
        Some(SurfaceProxy::new(self.surface_params(), self.world_transform.to_mat4()))
    }

    /// Destroys the overlay layer, if one exists.
    pub fn teardown(&mut self) -> Option<LayerId> {
        self.overlay.release()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn proxy_only_without_overlay() {
        let config = StereoWidgetConfig::default();
        let mut with_layers =
            StereoWidget::new(&config, CompositorCapability::new(Arc::new(HeadlessStereoLayers::new())));
        assert!(with_layers.create_render_proxy(true).is_none());
        assert!(!with_layers.should_create_proxy());
        assert!(with_layers.create_render_proxy(false).is_some());
        assert!(with_layers.should_create_proxy());

        let mut without = StereoWidget::new(&config, CompositorCapability::unavailable());
        without.set_render_target(Some(RenderTarget::new(TextureId(1), UVec2::new(200, 100))));
        let proxy = without.create_render_proxy(true).expect("mesh path");
        let params = proxy.params().expect("render target bound");
        assert_eq!(params.size, Vec2::new(200.0, 100.0));
        assert_eq!(params.geometry_mode, GeometryMode::Plane);
    }

    #[test]
    fn pending_target_keeps_layer_hidden() {
        let layers = Arc::new(HeadlessStereoLayers::new());
        let mut widget = StereoWidget::new(&StereoWidgetConfig::default(), CompositorCapability::new(layers.clone()));
        widget.set_render_target(Some(RenderTarget::pending(TextureId(3), UVec2::new(64, 64))));
        assert_eq!(widget.tick(true, None).action, LayerAction::Hidden);
        assert_eq!(layers.layer_count(), 0);

        widget.set_render_target(Some(RenderTarget::new(TextureId(3), UVec2::new(64, 64))));
        assert_eq!(widget.tick(true, None).action, LayerAction::Created(LayerId(1)));
        assert_eq!(widget.teardown(), Some(LayerId(1)));
        assert_eq!(widget.teardown(), None);
        assert_eq!(layers.layer_count(), 0);
    }
}
