//! Thin value types wrapping backend handles.

use crate::backend::{
    FrameBufferHandle, FrameBufferKind, GpuBackend, MeshBufferHandle, ProgramHandle,
    ProgramKind, TextureHandle,
};

/// Uploaded texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Texture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
    /// Number of mip levels
    pub levels: u32,
}

impl Texture {
    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        backend.destroy_texture(self.handle);
        *self = Self::default();
    }
}

/// Uploaded vertex and index buffers of one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshBuffer {
    pub handle: MeshBufferHandle,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Render target with optional color and depth attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBuffer {
    pub handle: FrameBufferHandle,
    pub kind: FrameBufferKind,
    /// Null for depth-only framebuffers
    pub color_texture: TextureHandle,
    pub depth_texture: TextureHandle,
    pub width: u32,
    pub height: u32,
}

impl FrameBuffer {
    /// An unset framebuffer of the given kind.
    pub fn unset(kind: FrameBufferKind) -> Self {
        Self {
            handle: FrameBufferHandle::NULL,
            kind,
            color_texture: TextureHandle::NULL,
            depth_texture: TextureHandle::NULL,
            width: 0,
            height: 0,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.handle.is_null()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProgram {
    pub handle: ProgramHandle,
    pub kind: ProgramKind,
}

impl ShaderProgram {
    pub fn unset(kind: ProgramKind) -> Self {
        Self {
            handle: ProgramHandle::NULL,
            kind,
        }
    }

    pub fn destroy<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        backend.destroy_program(self.handle);
        self.handle = ProgramHandle::NULL;
    }
}
