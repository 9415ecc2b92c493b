//! Interleaved vertex format.

use bytemuck::{Pod, Zeroable};
use kiln_core::MeshData;

/// Vertex layout shared by the standard and depth-only programs (56 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x2,
        3 => Float32x3,
        4 => Float32x3
    ];
    const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    /// Full vertex layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Same stride, position attribute only.
    pub fn position_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::POSITION_ATTRIBUTES,
        }
    }

    /// Interleaves the attribute arrays of a mesh.
    pub fn interleave(mesh: &MeshData) -> Vec<Self> {
        (0..mesh.vertex_count())
            .map(|i| Self {
                position: mesh.positions()[i].to_array(),
                normal: mesh.normals()[i].to_array(),
                uv: mesh.uvs()[i].to_array(),
                tangent: mesh.tangents()[i].to_array(),
                bitangent: mesh.bitangents()[i].to_array(),
            })
            .collect()
    }
}
