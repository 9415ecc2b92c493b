//! Recording GPU backend for tests.

use std::collections::{HashMap, HashSet};

use crate::backend::{
    BufferHandle, ClearOps, FrameBufferHandle, FrameBufferKind, GpuBackend, MeshBufferHandle,
    MeshUpload, PolygonMode, ProgramDesc, ProgramHandle, ProgramKind, TextureDesc, TextureHandle,
};
use crate::error::{RenderError, RenderResult};
use crate::resources::FrameBuffer;

/// One call made through [`GpuBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateProgram(ProgramKind),
    DestroyProgram(ProgramHandle),
    CreateUniformBuffer { handle: BufferHandle, size: u64 },
    WriteUniformBuffer { handle: BufferHandle, len: usize },
    DestroyUniformBuffer(BufferHandle),
    CreateTexture { handle: TextureHandle, width: u32, height: u32, levels: u32 },
    DestroyTexture(TextureHandle),
    CreateMeshBuffer { handle: MeshBufferHandle, index_count: u32 },
    DestroyMeshBuffer(MeshBufferHandle),
    CreateFrameBuffer { handle: FrameBufferHandle, kind: FrameBufferKind, width: u32, height: u32 },
    DestroyFrameBuffer(FrameBufferHandle),
    BeginPass { target: FrameBufferHandle, clear: ClearOps },
    SetProgram(ProgramHandle),
    BindUniformBuffer { binding: u32, buffer: BufferHandle },
    BindTexture { slot: u32, texture: TextureHandle },
    BindShadowMap(TextureHandle),
    BindMesh(MeshBufferHandle),
    SetDrawUniforms(Vec<u8>),
    DrawIndexed(u32),
    EndPass,
    SetPolygonMode(PolygonMode),
}

/// Backend that hands out sequential handles and records every call.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<GpuCall>,
    pub mesh_uploads: usize,
    pub texture_uploads: usize,
    /// Fail program creation for this kind
    pub fail_program: Option<ProgramKind>,
    /// Fail framebuffer creation for this kind
    pub fail_framebuffer: Option<FrameBufferKind>,
    next_handle: u64,
    live: HashSet<u64>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    attachments: HashMap<FrameBufferHandle, Vec<u64>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.live.insert(self.next_handle);
        self.next_handle
    }

    fn release(&mut self, raw: u64) -> bool {
        raw != 0 && self.live.remove(&raw)
    }

    /// Number of created but not yet destroyed objects.
    pub fn live_resources(&self) -> usize {
        self.live.len()
    }

    pub fn count(&self, predicate: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }

    /// Calls recorded inside passes targeting `target`, without the
    /// begin/end markers.
    pub fn pass_calls(&self, target: FrameBufferHandle) -> Vec<GpuCall> {
        let mut inside = false;
        let mut out = Vec::new();
        for call in &self.calls {
            match call {
                GpuCall::BeginPass { target: t, .. } => inside = *t == target,
                GpuCall::EndPass => inside = false,
                other if inside => out.push(other.clone()),
                _ => {}
            }
        }
        out
    }

    /// Last bytes written to a uniform buffer, decoded as `T`.
    pub fn buffer_contents<T: bytemuck::AnyBitPattern>(&self, buffer: BufferHandle) -> T {
        let bytes = self
            .buffers
            .get(&buffer)
            .expect("uniform buffer was never written");
        bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<T>()])
    }

    pub fn last_draw_uniforms(&self) -> Option<Vec<u8>> {
        self.calls.iter().rev().find_map(|c| match c {
            GpuCall::SetDrawUniforms(bytes) => Some(bytes.clone()),
            _ => None,
        })
    }
}

impl GpuBackend for RecordingBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle> {
        self.calls.push(GpuCall::CreateProgram(desc.kind));
        if self.fail_program == Some(desc.kind) {
            return Err(RenderError::ProgramCreation(format!("{}: injected failure", desc.label)));
        }
        Ok(ProgramHandle::from_raw(self.allocate()))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        if self.release(program.raw()) {
            self.calls.push(GpuCall::DestroyProgram(program));
        }
    }

    fn create_uniform_buffer(&mut self, _label: &str, size: u64) -> RenderResult<BufferHandle> {
        let handle = BufferHandle::from_raw(self.allocate());
        self.calls.push(GpuCall::CreateUniformBuffer { handle, size });
        Ok(handle)
    }

    fn write_uniform_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]) {
        self.calls.push(GpuCall::WriteUniformBuffer {
            handle: buffer,
            len: bytes.len(),
        });
        self.buffers.insert(buffer, bytes.to_vec());
    }

    fn destroy_uniform_buffer(&mut self, buffer: BufferHandle) {
        if self.release(buffer.raw()) {
            self.buffers.remove(&buffer);
            self.calls.push(GpuCall::DestroyUniformBuffer(buffer));
        }
    }

    fn create_texture(
        &mut self,
        desc: &TextureDesc<'_>,
        levels: &[Vec<u8>],
    ) -> RenderResult<TextureHandle> {
        assert_eq!(levels.len() as u32, desc.mip_levels);
        assert_eq!(levels[0].len(), (desc.width * desc.height * 4) as usize);

        let handle = TextureHandle::from_raw(self.allocate());
        self.texture_uploads += 1;
        self.calls.push(GpuCall::CreateTexture {
            handle,
            width: desc.width,
            height: desc.height,
            levels: desc.mip_levels,
        });
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        if self.release(texture.raw()) {
            self.calls.push(GpuCall::DestroyTexture(texture));
        }
    }

    fn create_mesh_buffer(&mut self, upload: &MeshUpload<'_>) -> RenderResult<MeshBufferHandle> {
        let handle = MeshBufferHandle::from_raw(self.allocate());
        self.mesh_uploads += 1;
        self.calls.push(GpuCall::CreateMeshBuffer {
            handle,
            index_count: upload.indices.len() as u32,
        });
        Ok(handle)
    }

    fn destroy_mesh_buffer(&mut self, mesh: MeshBufferHandle) {
        if self.release(mesh.raw()) {
            self.calls.push(GpuCall::DestroyMeshBuffer(mesh));
        }
    }

    fn create_framebuffer(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        kind: FrameBufferKind,
    ) -> RenderResult<FrameBuffer> {
        if self.fail_framebuffer == Some(kind) {
            self.calls.push(GpuCall::CreateFrameBuffer {
                handle: FrameBufferHandle::NULL,
                kind,
                width,
                height,
            });
            return Err(RenderError::FrameBufferIncomplete(format!("{label}: injected failure")));
        }

        let handle = FrameBufferHandle::from_raw(self.allocate());
        let depth_texture = TextureHandle::from_raw(self.allocate());
        let color_texture = match kind {
            FrameBufferKind::Color => TextureHandle::from_raw(self.allocate()),
            FrameBufferKind::DepthOnly => TextureHandle::NULL,
        };
        self.attachments
            .insert(handle, vec![depth_texture.raw(), color_texture.raw()]);
        self.calls.push(GpuCall::CreateFrameBuffer {
            handle,
            kind,
            width,
            height,
        });

        Ok(FrameBuffer {
            handle,
            kind,
            color_texture,
            depth_texture,
            width,
            height,
        })
    }

    fn destroy_framebuffer(&mut self, framebuffer: &mut FrameBuffer) {
        let handle = framebuffer.handle;
        if self.release(handle.raw()) {
            for raw in self.attachments.remove(&handle).unwrap_or_default() {
                self.release(raw);
            }
            self.calls.push(GpuCall::DestroyFrameBuffer(handle));
        }
        *framebuffer = FrameBuffer::unset(framebuffer.kind);
    }

    fn begin_pass(&mut self, target: &FrameBuffer, clear: ClearOps) {
        self.calls.push(GpuCall::BeginPass {
            target: target.handle,
            clear,
        });
    }

    fn set_program(&mut self, program: ProgramHandle) {
        self.calls.push(GpuCall::SetProgram(program));
    }

    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferHandle) {
        self.calls.push(GpuCall::BindUniformBuffer { binding, buffer });
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.calls.push(GpuCall::BindTexture { slot, texture });
    }

    fn bind_shadow_map(&mut self, texture: TextureHandle) {
        self.calls.push(GpuCall::BindShadowMap(texture));
    }

    fn bind_mesh(&mut self, mesh: MeshBufferHandle) {
        self.calls.push(GpuCall::BindMesh(mesh));
    }

    fn set_draw_uniforms(&mut self, bytes: &[u8]) {
        self.calls.push(GpuCall::SetDrawUniforms(bytes.to_vec()));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(GpuCall::DrawIndexed(index_count));
    }

    fn end_pass(&mut self) -> RenderResult<()> {
        self.calls.push(GpuCall::EndPass);
        Ok(())
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.calls.push(GpuCall::SetPolygonMode(mode));
    }
}
