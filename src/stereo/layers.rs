use crate::transform::Transform3D;
use bitflags::bitflags;
use glam::Vec2;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Compositor-side layer handle. Compositors never hand out 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

/// Opaque handle of the GPU texture backing a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for UvRect {
    fn default() -> Self {
        Self { min: Vec2::ZERO, max: Vec2::ONE }
    }
}

impl UvRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPositionType {
    WorldLocked,
    TrackerLocked,
    FaceLocked,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayerShape {
    Quad,
    Cylinder { radius: f32, overlay_arc: f32, height: f32 },
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerFlags: u32 {
        /// Re-sample the texture every frame.
        const TEX_CONTINUOUS_UPDATE = 1 << 0;
        /// Ignore the texture's alpha channel.
        const TEX_NO_ALPHA_CHANNEL = 1 << 1;
        /// Keep the texture aspect ratio inside the quad.
        const QUAD_PRESERVE_TEX_RATIO = 1 << 2;
        /// Depth-test the layer against the scene.
        const SUPPORT_DEPTH = 1 << 3;
    }
}

/// Everything the compositor needs to place one overlay layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDesc {
    pub priority: i32,
    pub quad_size: Vec2,
    pub uv_rect: UvRect,
    pub transform: Transform3D,
    pub texture: Option<TextureId>,
    pub shape: LayerShape,
    pub flags: LayerFlags,
    pub position_type: LayerPositionType,
}

/// Native overlay layer API of a head-mounted display. Calls may come from the game thread; the
/// host serializes them against its render thread.
pub trait StereoLayers: Send + Sync {
    fn create_layer(&self, desc: &LayerDesc) -> LayerId;
    fn set_layer_desc(&self, layer: LayerId, desc: &LayerDesc);
    fn destroy_layer(&self, layer: LayerId);
    fn mark_texture_for_update(&self, layer: LayerId);
    fn layer_exists(&self, layer: LayerId) -> bool;
}

/// Overlay support resolved once when a widget is built. Without stereo layers every widget
/// renders through the projected mesh.
#[derive(Clone, Default)]
pub struct CompositorCapability {
    layers: Option<Arc<dyn StereoLayers>>,
}

impl CompositorCapability {
    pub fn new(layers: Arc<dyn StereoLayers>) -> Self {
        Self { layers: Some(layers) }
    }

    pub fn unavailable() -> Self {
        Self { layers: None }
    }

    pub fn is_available(&self) -> bool {
        self.layers.is_some()
    }

    pub fn stereo_layers(&self) -> Option<&Arc<dyn StereoLayers>> {
        self.layers.as_ref()
    }
}

impl fmt::Debug for CompositorCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositorCapability").field("available", &self.is_available()).finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayerCall {
    Create(LayerId),
    Update(LayerId),
    Destroy(LayerId),
    MarkTexture(LayerId),
}

/// In-process compositor that keeps layer descriptors in memory. Used by headless hosts and tests.
#[derive(Default)]
pub struct HeadlessStereoLayers {
    next_id: AtomicU32,
    layers: Mutex<BTreeMap<LayerId, LayerDesc>>,
    calls: Mutex<Vec<LayerCall>>,
}

impl HeadlessStereoLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer_count(&self) -> usize {
        lock(&self.layers).len()
    }

    pub fn layer_desc(&self, layer: LayerId) -> Option<LayerDesc> {
        lock(&self.layers).get(&layer).cloned()
    }

    pub fn calls(&self) -> Vec<LayerCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    fn record(&self, call: LayerCall) {
        lock(&self.calls).push(call);
    }
}

impl StereoLayers for HeadlessStereoLayers {
    fn create_layer(&self, desc: &LayerDesc) -> LayerId {
        let id = LayerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        lock(&self.layers).insert(id, desc.clone());
        self.record(LayerCall::Create(id));
        id
    }

    fn set_layer_desc(&self, layer: LayerId, desc: &LayerDesc) {
        if let Some(existing) = lock(&self.layers).get_mut(&layer) {
            *existing = desc.clone();
        }
        self.record(LayerCall::Update(layer));
    }

    fn destroy_layer(&self, layer: LayerId) {
        lock(&self.layers).remove(&layer);
        self.record(LayerCall::Destroy(layer));
    }

    fn mark_texture_for_update(&self, layer: LayerId) {
        self.record(LayerCall::MarkTexture(layer));
    }

    fn layer_exists(&self, layer: LayerId) -> bool {
        lock(&self.layers).contains_key(&layer)
    }
}

// A panic while holding one of these locks leaves plain data behind, so keep going.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> LayerDesc {
        LayerDesc {
            priority: 0,
            quad_size: Vec2::splat(100.0),
            uv_rect: UvRect::default(),
            transform: Transform3D::IDENTITY,
            texture: None,
            shape: LayerShape::Quad,
            flags: LayerFlags::TEX_CONTINUOUS_UPDATE,
            position_type: LayerPositionType::TrackerLocked,
        }
    }

    #[test]
    fn headless_layers_start_at_one() {
        let layers = HeadlessStereoLayers::new();
        let first = layers.create_layer(&desc());
        let second = layers.create_layer(&desc());
        assert_eq!(first, LayerId(1));
        assert_eq!(second, LayerId(2));
        assert_eq!(layers.layer_count(), 2);
        layers.destroy_layer(first);
        assert!(!layers.layer_exists(first));
        assert!(layers.layer_exists(second));
    }

    #[test]
    fn capability_reports_availability() {
        assert!(!CompositorCapability::unavailable().is_available());
        let cap = CompositorCapability::new(Arc::new(HeadlessStereoLayers::new()));
        assert!(cap.is_available());
        assert!(format!("{cap:?}").contains("available: true"));
    }
}
