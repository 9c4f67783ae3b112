//! GPU Meshes
//!
//! Interleaved vertex buffers (position, normal, uv; 32-byte stride)
//! shared by the shadow and color passes, plus generators for the
//! built-in test geometry.

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use wgpu::{
    Buffer, BufferUsages, Device, VertexAttribute, VertexBufferLayout, VertexFormat,
    VertexStepMode,
};

/// Vertex stride in bytes (3 position + 3 normal + 2 uv floats)
pub const VERTEX_STRIDE: u64 = 32;

const VERTEX_ATTRIBUTES: [VertexAttribute; 3] = [
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0, // position
    },
    VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 12,
        shader_location: 1, // normal
    },
    VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        shader_location: 2, // uv
    },
];

/// Vertex buffer layout shared by all pipelines
pub fn vertex_layout() -> VertexBufferLayout<'static> {
    VertexBufferLayout {
        array_stride: VERTEX_STRIDE,
        step_mode: VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRIBUTES,
    }
}

/// Uploaded mesh buffers
pub struct GpuMesh {
    pub vertex_buffer: Buffer,
    pub index_buffer: Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Upload interleaved vertices and indices
    pub fn new(device: &Device, vertices: &[[f32; 8]], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(vertices),
            usage: BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(indices),
            usage: BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// One drawable object: a mesh reference plus its transform and tint
#[derive(Clone, Copy, Debug)]
pub struct MeshInstance {
    /// Index into the caller's mesh list
    pub mesh: usize,

    /// Model matrix (column-major)
    pub model: [[f32; 4]; 4],

    /// Base color (linear RGBA)
    pub color: [f32; 4],
}

impl MeshInstance {
    /// Create an instance at a world position
    pub fn new(mesh: usize, position: Vec3) -> Self {
        Self {
            mesh,
            model: Mat4::from_translation(position).to_cols_array_2d(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }

    /// Set the full transform
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.model = transform.to_cols_array_2d();
        self
    }

    /// Set the base color
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }
}

/// Generate a cube with per-face normals
pub fn generate_cube(size: f32) -> (Vec<[f32; 8]>, Vec<u32>) {
    let h = size * 0.5;

    // Each face has its own vertices for proper normals
    let vertices = vec![
        // Front face
        [-h, -h, h, 0.0, 0.0, 1.0, 0.0, 1.0],
        [h, -h, h, 0.0, 0.0, 1.0, 1.0, 1.0],
        [h, h, h, 0.0, 0.0, 1.0, 1.0, 0.0],
        [-h, h, h, 0.0, 0.0, 1.0, 0.0, 0.0],
        // Back face
        [h, -h, -h, 0.0, 0.0, -1.0, 0.0, 1.0],
        [-h, -h, -h, 0.0, 0.0, -1.0, 1.0, 1.0],
        [-h, h, -h, 0.0, 0.0, -1.0, 1.0, 0.0],
        [h, h, -h, 0.0, 0.0, -1.0, 0.0, 0.0],
        // Top face
        [-h, h, h, 0.0, 1.0, 0.0, 0.0, 1.0],
        [h, h, h, 0.0, 1.0, 0.0, 1.0, 1.0],
        [h, h, -h, 0.0, 1.0, 0.0, 1.0, 0.0],
        [-h, h, -h, 0.0, 1.0, 0.0, 0.0, 0.0],
        // Bottom face
        [-h, -h, -h, 0.0, -1.0, 0.0, 0.0, 1.0],
        [h, -h, -h, 0.0, -1.0, 0.0, 1.0, 1.0],
        [h, -h, h, 0.0, -1.0, 0.0, 1.0, 0.0],
        [-h, -h, h, 0.0, -1.0, 0.0, 0.0, 0.0],
        // Right face
        [h, -h, h, 1.0, 0.0, 0.0, 0.0, 1.0],
        [h, -h, -h, 1.0, 0.0, 0.0, 1.0, 1.0],
        [h, h, -h, 1.0, 0.0, 0.0, 1.0, 0.0],
        [h, h, h, 1.0, 0.0, 0.0, 0.0, 0.0],
        // Left face
        [-h, -h, -h, -1.0, 0.0, 0.0, 0.0, 1.0],
        [-h, -h, h, -1.0, 0.0, 0.0, 1.0, 1.0],
        [-h, h, h, -1.0, 0.0, 0.0, 1.0, 0.0],
        [-h, h, -h, -1.0, 0.0, 0.0, 0.0, 0.0],
    ];

    let indices = vec![
        0, 1, 2, 0, 2, 3, // Front
        4, 5, 6, 4, 6, 7, // Back
        8, 9, 10, 8, 10, 11, // Top
        12, 13, 14, 12, 14, 15, // Bottom
        16, 17, 18, 16, 18, 19, // Right
        20, 21, 22, 20, 22, 23, // Left
    ];

    (vertices, indices)
}

/// Generate a flat ground plane facing +Y
pub fn generate_plane(size: f32) -> (Vec<[f32; 8]>, Vec<u32>) {
    let h = size * 0.5;

    let vertices = vec![
        [-h, 0.0, -h, 0.0, 1.0, 0.0, 0.0, 0.0],
        [h, 0.0, -h, 0.0, 1.0, 0.0, 1.0, 0.0],
        [h, 0.0, h, 0.0, 1.0, 0.0, 1.0, 1.0],
        [-h, 0.0, h, 0.0, 1.0, 0.0, 0.0, 1.0],
    ];

    let indices = vec![0, 2, 1, 0, 3, 2];

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_stride() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 32);
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 24);
    }

    #[test]
    fn test_cube_geometry() {
        let (vertices, indices) = generate_cube(2.0);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);

        // Positions lie on the half-size boundary, normals are unit axes.
        for v in &vertices {
            assert!(v[0].abs() == 1.0 && v[1].abs() == 1.0 && v[2].abs() == 1.0);
            let n = v[3] * v[3] + v[4] * v[4] + v[5] * v[5];
            assert!((n - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_plane_geometry() {
        let (vertices, indices) = generate_plane(10.0);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6);

        // Flat on Y with an up-facing normal.
        for v in &vertices {
            assert_eq!(v[1], 0.0);
            assert_eq!([v[3], v[4], v[5]], [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn test_instance_builders() {
        let inst = MeshInstance::new(2, Vec3::new(1.0, 2.0, 3.0)).with_color([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(inst.mesh, 2);
        assert_eq!(inst.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(inst.color[0], 1.0);
    }
}
