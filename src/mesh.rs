use glam::{Vec2, Vec3, Vec4};
use serde::Serialize;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize)]
pub struct SurfaceVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub uv: [f32; 2],
}

impl SurfaceVertex {
    pub fn new(position: Vec3, normal: Vec3, tangent: Vec4, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), tangent: tangent.to_array(), uv: uv.to_array() }
    }

    /// Builds a vertex from an explicit tangent frame. The bitangent is folded into the tangent's
    /// `w` sign the same way imported meshes carry it.
    pub fn with_frame(position: Vec3, uv: Vec2, frame: &TangentFrame) -> Self {
        Self::new(position, frame.normal, frame.packed_tangent(), uv)
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SurfaceVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute { offset: 0, shader_location: 0, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 12, shader_location: 1, format: wgpu::VertexFormat::Float32x3 },
                wgpu::VertexAttribute { offset: 24, shader_location: 2, format: wgpu::VertexFormat::Float32x4 },
                wgpu::VertexAttribute { offset: 40, shader_location: 3, format: wgpu::VertexFormat::Float32x2 },
            ],
        }
    }
}

/// Orthonormal basis of a surface patch: tangent follows +U, bitangent follows +V.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TangentFrame {
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub normal: Vec3,
}

impl TangentFrame {
    /// Frame of the quad spanned by `along_u` and `along_v`; the normal faces the side the
    /// texture reads correctly from.
    pub fn from_edges(along_u: Vec3, along_v: Vec3) -> Self {
        let tangent = along_u.normalize_or_zero();
        let bitangent = along_v.normalize_or_zero();
        let normal = bitangent.cross(tangent).normalize_or_zero();
        Self { tangent, bitangent, normal }
    }

    pub fn packed_tangent(&self) -> Vec4 {
        let w = if self.normal.cross(self.tangent).dot(self.bitangent) < 0.0 { -1.0 } else { 1.0 };
        self.tangent.extend(w)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

impl MeshBounds {
    pub fn from_vertices(vertices: &[SurfaceVertex]) -> Self {
        if vertices.is_empty() {
            return MeshBounds { min: Vec3::ZERO, max: Vec3::ZERO, center: Vec3::ZERO, radius: 0.0 };
        }
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for vertex in vertices {
            let pos = vertex.position();
            min = min.min(pos);
            max = max.max(pos);
        }
        let center = (min + max) * 0.5;
        let mut radius: f32 = 0.0;
        for vertex in vertices {
            radius = radius.max((vertex.position() - center).length());
        }
        MeshBounds { min, max, center, radius }
    }
}
