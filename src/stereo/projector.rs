use crate::mesh::{MeshBounds, SurfaceVertex, TangentFrame};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::f32::consts::PI;

pub const MIN_CYLINDER_SEGMENTS: u32 = 4;
pub const MAX_CYLINDER_SEGMENTS: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GeometryMode {
    #[default]
    Plane,
    Cylinder,
}

/// Inputs of the fallback surface mesh. `size` is the render target in pixels, `pivot` the
/// normalized point of the surface that lands on the local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    pub size: Vec2,
    pub pivot: Vec2,
    pub geometry_mode: GeometryMode,
    pub arc_angle_radians: f32,
}

/// Triangle list for one surface. Local space: X runs along the width, Y up, and the textured side
/// faces +Z.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectedSurface {
    pub vertices: Vec<SurfaceVertex>,
    pub indices: Vec<u32>,
}

impl ProjectedSurface {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> MeshBounds {
        MeshBounds::from_vertices(&self.vertices)
    }

    fn push_quad(&mut self, corners: [(Vec3, Vec2, &TangentFrame); 4]) {
        let base = self.vertices.len() as u32;
        for (position, uv, frame) in corners {
            self.vertices.push(SurfaceVertex::with_frame(position, uv, frame));
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Number of quads used for an arc: 4 for a flat strip up to 32 for a half cylinder.
pub fn cylinder_segment_count(arc_angle_radians: f32) -> u32 {
    let alpha = arc_angle_radians / PI;
    let lerped = MIN_CYLINDER_SEGMENTS as f32 + (MAX_CYLINDER_SEGMENTS - MIN_CYLINDER_SEGMENTS) as f32 * alpha;
    if !lerped.is_finite() {
        return MIN_CYLINDER_SEGMENTS;
    }
    (lerped.round() as u32).clamp(MIN_CYLINDER_SEGMENTS, MAX_CYLINDER_SEGMENTS)
}

pub fn project_surface(params: &SurfaceParams) -> ProjectedSurface {
    match params.geometry_mode {
        GeometryMode::Plane => project_plane(params.size, params.pivot),
        GeometryMode::Cylinder => project_cylinder(params.size, params.pivot, params.arc_angle_radians),
    }
}

pub fn project_plane(size: Vec2, pivot: Vec2) -> ProjectedSurface {
    let left = -size.x * pivot.x;
    let right = size.x * (1.0 - pivot.x);
    let top = size.y * pivot.y;
    let bottom = -size.y * (1.0 - pivot.y);

    let frame = TangentFrame::from_edges(Vec3::X, Vec3::NEG_Y);
    let mut surface = ProjectedSurface { vertices: Vec::with_capacity(4), indices: Vec::with_capacity(6) };
    surface.push_quad([
        (Vec3::new(left, top, 0.0), Vec2::new(0.0, 0.0), &frame),
        (Vec3::new(left, bottom, 0.0), Vec2::new(0.0, 1.0), &frame),
        (Vec3::new(right, bottom, 0.0), Vec2::new(1.0, 1.0), &frame),
        (Vec3::new(right, top, 0.0), Vec2::new(1.0, 0.0), &frame),
    ]);
    surface
}

/// Curved strip whose chord spans the surface. A zero or non-finite arc yields an empty mesh.
pub fn project_cylinder(size: Vec2, pivot: Vec2, arc_angle_radians: f32) -> ProjectedSurface {
    if !arc_angle_radians.is_finite() || arc_angle_radians <= f32::EPSILON {
        return ProjectedSurface::default();
    }
    let arc = arc_angle_radians;
    let segments = cylinder_segment_count(arc);

    let radius = size.x / arc;
    let apothem = radius * (0.5 * arc).cos();
    let chord = 2.0 * radius * (0.5 * arc).sin();
    let pivot_offset = chord * (0.5 - pivot.x);
    let top = size.y * pivot.y;
    let bottom = -size.y * (1.0 - pivot.y);
    let step = arc / segments as f32;

    let mut surface = ProjectedSurface {
        vertices: Vec::with_capacity(segments as usize * 4),
        indices: Vec::with_capacity(segments as usize * 6),
    };
    let mut last_frame: Option<TangentFrame> = None;
    for segment in 0..segments {
        let angle = -0.5 * arc + segment as f32 * step;
        let next_angle = angle + step;

        let x0 = pivot_offset + radius * angle.sin();
        let z0 = apothem - radius * angle.cos();
        let x1 = pivot_offset + radius * next_angle.sin();
        let z1 = apothem - radius * next_angle.cos();

        let u0 = segment as f32 / segments as f32;
        let u1 = (segment + 1) as f32 / segments as f32;

        let p0 = Vec3::new(x0, top, z0);
        let p1 = Vec3::new(x0, bottom, z0);
        let p2 = Vec3::new(x1, bottom, z1);
        let p3 = Vec3::new(x1, top, z1);

        let frame = TangentFrame::from_edges(p3 - p0, p1 - p0);
        // The shared edge keeps the previous segment's frame; the surface is unlit.
        let edge_frame = last_frame.unwrap_or(frame);

        surface.push_quad([
            (p0, Vec2::new(u0, 0.0), &edge_frame),
            (p1, Vec2::new(u0, 1.0), &edge_frame),
            (p2, Vec2::new(u1, 1.0), &frame),
            (p3, Vec2::new(u1, 0.0), &frame),
        ]);
        last_frame = Some(frame);
    }
    surface
}

/// Mesh emitted for a single view of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedSurfaceDescriptor {
    pub view_index: usize,
    pub local_to_world: Mat4,
    pub surface: ProjectedSurface,
}

/// Receives the per-view meshes of a frame.
pub trait MeshElementCollector {
    fn add_mesh(&mut self, mesh: ProjectedSurfaceDescriptor);
}

/// Collector for the common stereo case of two views.
#[derive(Debug, Default)]
pub struct FrameMeshCollector {
    pub meshes: SmallVec<[ProjectedSurfaceDescriptor; 2]>,
}

impl FrameMeshCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_view(&self, view_index: usize) -> impl Iterator<Item = &ProjectedSurfaceDescriptor> {
        self.meshes.iter().filter(move |mesh| mesh.view_index == view_index)
    }
}

impl MeshElementCollector for FrameMeshCollector {
    fn add_mesh(&mut self, mesh: ProjectedSurfaceDescriptor) {
        self.meshes.push(mesh);
    }
}

/// Render-side snapshot of a widget drawn without an overlay layer. Holds no mutable state, so
/// views may be generated from several threads.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceProxy {
    params: Option<SurfaceParams>,
    local_to_world: Mat4,
}

impl SurfaceProxy {
    /// `params` is `None` while the render target has no texture yet.
    pub fn new(params: Option<SurfaceParams>, local_to_world: Mat4) -> Self {
        Self { params, local_to_world }
    }

    pub fn params(&self) -> Option<&SurfaceParams> {
        self.params.as_ref()
    }

    pub fn set_local_to_world(&mut self, local_to_world: Mat4) {
        self.local_to_world = local_to_world;
    }

    /// Emits one mesh per view whose bit is set in `visibility_map`.
    pub fn get_dynamic_mesh_elements(
        &self,
        view_count: usize,
        visibility_map: u32,
        collector: &mut dyn MeshElementCollector,
    ) {
        let Some(params) = self.params else {
            return;
        };
        for view_index in 0..view_count.min(u32::BITS as usize) {
            if visibility_map & (1 << view_index) == 0 {
                continue;
            }
            let surface = project_surface(&params);
            if surface.is_empty() {
                continue;
            }
            collector.add_mesh(ProjectedSurfaceDescriptor {
                view_index,
                local_to_world: self.local_to_world,
                surface,
            });
        }
    }
}
