//! GPU backend abstraction.
//!
//! Every GPU call the renderer makes goes through [`GpuBackend`]. Resources
//! are referred to by opaque `u64` handles; the zero value means "unset" and
//! destroying it is always a no-op, so cleanup can run against a partially
//! (or never) initialized renderer.
//!
//! Draw state is recorded between [`GpuBackend::begin_pass`] and
//! [`GpuBackend::end_pass`]; a backend must finish submitting a pass before
//! `end_pass` returns so passes execute in the order they were issued.

pub mod wgpu_backend;

use crate::error::RenderResult;
use crate::resources::{FrameBuffer, MeshVertex};

macro_rules! gpu_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(u64);

        impl $name {
            /// The unset handle.
            pub const NULL: Self = Self(0);

            /// Returns the raw handle value.
            pub fn raw(&self) -> u64 {
                self.0
            }

            /// Creates a handle from a raw value.
            pub fn from_raw(value: u64) -> Self {
                Self(value)
            }

            /// Returns true if this handle was never assigned.
            pub fn is_null(&self) -> bool {
                self.0 == 0
            }
        }
    };
}

gpu_handle!(
    /// Handle to a linked shading program (pipeline set).
    ProgramHandle
);
gpu_handle!(
    /// Handle to a uniform buffer.
    BufferHandle
);
gpu_handle!(
    /// Handle to a sampled texture or render attachment.
    TextureHandle
);
gpu_handle!(
    /// Handle to an uploaded vertex/index buffer pair.
    MeshBufferHandle
);
gpu_handle!(
    /// Handle to a framebuffer.
    FrameBufferHandle
);

/// Which fixed binding layout a program follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Lit forward shading: lights, shadow map, material textures.
    Standard,
    /// Position-only depth rendering for the shadow map.
    DepthOnly,
}

/// Program creation parameters.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub kind: ProgramKind,
    /// WGSL source with `vs_main` (and `fs_main` for standard programs)
    pub source: &'a str,
    /// Size in bytes of the per-draw uniform block
    pub draw_uniform_size: u64,
}

/// RGBA8 texture creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
}

/// Interleaved mesh data ready for upload.
#[derive(Debug, Clone, Copy)]
pub struct MeshUpload<'a> {
    pub label: &'a str,
    pub vertices: &'a [MeshVertex],
    pub indices: &'a [u32],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameBufferKind {
    /// Color attachment plus depth/stencil.
    Color,
    /// Depth texture only, sampled later as a shadow map.
    DepthOnly,
}

/// Attachment clears applied when a pass begins. `None` keeps the contents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearOps {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
}

impl ClearOps {
    pub fn color_and_depth(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
        }
    }

    pub fn depth() -> Self {
        Self {
            color: None,
            depth: Some(1.0),
        }
    }
}

/// Global rasterization fill mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    #[default]
    Fill,
    Line,
}

/// GPU operations used by the renderer.
pub trait GpuBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle>;
    fn destroy_program(&mut self, program: ProgramHandle);

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> RenderResult<BufferHandle>;
    fn write_uniform_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]);
    fn destroy_uniform_buffer(&mut self, buffer: BufferHandle);

    /// Creates an RGBA8 texture from one tightly packed buffer per mip level.
    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
        levels: &[Vec<u8>],
    ) -> RenderResult<TextureHandle>;
    fn destroy_texture(&mut self, texture: TextureHandle);

    fn create_mesh_buffer(&mut self, upload: &MeshUpload<'_>) -> RenderResult<MeshBufferHandle>;
    fn destroy_mesh_buffer(&mut self, mesh: MeshBufferHandle);

    fn create_framebuffer(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        kind: FrameBufferKind,
    ) -> RenderResult<FrameBuffer>;
    /// Destroys a framebuffer with its attachments and resets it to unset.
    fn destroy_framebuffer(&mut self, framebuffer: &mut FrameBuffer);

    fn begin_pass(&mut self, target: &FrameBuffer, clear: ClearOps);
    fn set_program(&mut self, program: ProgramHandle);
    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferHandle);
    fn bind_texture(&mut self, slot: u32, texture: TextureHandle);
    fn bind_shadow_map(&mut self, texture: TextureHandle);
    fn bind_mesh(&mut self, mesh: MeshBufferHandle);
    /// Sets the per-draw uniform block used by following draws.
    fn set_draw_uniforms(&mut self, bytes: &[u8]);
    fn draw_indexed(&mut self, index_count: u32);
    fn end_pass(&mut self) -> RenderResult<()>;

    fn set_polygon_mode(&mut self, mode: PolygonMode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_handles_are_null() {
        assert!(TextureHandle::default().is_null());
        assert!(ProgramHandle::NULL.is_null());
        assert!(!MeshBufferHandle::from_raw(3).is_null());
        assert_eq!(BufferHandle::from_raw(9).raw(), 9);
    }

    #[test]
    fn test_clear_ops() {
        assert_eq!(ClearOps::depth().color, None);
        assert_eq!(ClearOps::color_and_depth([0.0; 4]).depth, Some(1.0));
    }
}
