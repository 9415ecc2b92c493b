//! [`GpuBackend`] on top of wgpu.
//!
//! Pass commands are recorded between `begin_pass` and `end_pass` and
//! replayed into a single `wgpu::RenderPass`, which is submitted before
//! `end_pass` returns. Bind groups are built lazily from the bound handles
//! and cached until one of their resources is destroyed.

mod draw_ring;
mod pipelines;

use std::collections::HashMap;
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::backend::{
    BufferHandle, ClearOps, FrameBufferHandle, FrameBufferKind, GpuBackend, MeshBufferHandle,
    MeshUpload, PolygonMode, ProgramDesc, ProgramHandle, ProgramKind, TextureDesc, TextureHandle,
};
use crate::constants::{bindings, output, shadow, textures};
use crate::error::{RenderError, RenderResult};
use crate::resources::FrameBuffer;

use draw_ring::DrawRing;
use pipelines::{Layouts, Program};

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
}

/// Attachment textures of a framebuffer, registered in the texture map.
#[derive(Clone, Copy)]
struct GpuFrameBuffer {
    color: TextureHandle,
    depth: TextureHandle,
    depth_format: wgpu::TextureFormat,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    SetProgram(ProgramHandle),
    BindUniform { binding: u32, buffer: BufferHandle },
    BindTexture { slot: u32, texture: TextureHandle },
    BindShadowMap(TextureHandle),
    BindMesh(MeshBufferHandle),
    Draw { index_count: u32, uniform_offset: u32 },
}

struct PendingPass {
    target: FrameBufferHandle,
    clear: ClearOps,
    mode: PolygonMode,
    uniform_offset: Option<u32>,
    commands: Vec<Command>,
}

/// Bindings in effect at a point of the recorded command stream.
#[derive(Default)]
struct BindState {
    program: ProgramHandle,
    lights: BufferHandle,
    shadow_map: TextureHandle,
    textures: [TextureHandle; bindings::MATERIAL_SLOTS],
}

impl BindState {
    fn apply(&mut self, command: &Command) {
        match *command {
            Command::SetProgram(program) => self.program = program,
            Command::BindUniform { binding, buffer } if binding == bindings::LIGHTS => {
                self.lights = buffer;
            }
            Command::BindTexture { slot, texture } => {
                if let Some(bound) = self.textures.get_mut(slot as usize) {
                    *bound = texture;
                }
            }
            Command::BindShadowMap(texture) => self.shadow_map = texture,
            _ => {}
        }
    }
}

pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layouts: Layouts,
    material_sampler: wgpu::Sampler,
    shadow_sampler: wgpu::Sampler,
    draw_ring: DrawRing,
    line_supported: bool,
    line_warned: bool,
    polygon_mode: PolygonMode,
    next_handle: u64,
    programs: HashMap<ProgramHandle, Program>,
    buffers: HashMap<BufferHandle, wgpu::Buffer>,
    textures: HashMap<TextureHandle, GpuTexture>,
    meshes: HashMap<MeshBufferHandle, GpuMesh>,
    framebuffers: HashMap<FrameBufferHandle, GpuFrameBuffer>,
    frame_groups: HashMap<(BufferHandle, TextureHandle), wgpu::BindGroup>,
    material_groups: HashMap<[TextureHandle; bindings::MATERIAL_SLOTS], wgpu::BindGroup>,
    pass: Option<PendingPass>,
}

impl WgpuBackend {
    /// Device features used when the adapter offers them.
    pub fn optional_features() -> wgpu::Features {
        wgpu::Features::POLYGON_MODE_LINE
    }

    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let layouts = Layouts::new(&device);
        let draw_ring = DrawRing::new(&device, &layouts.draw);

        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let line_supported = device.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        tracing::info!("wgpu backend ready (line mode: {})", line_supported);

        Self {
            device,
            queue,
            layouts,
            material_sampler,
            shadow_sampler,
            draw_ring,
            line_supported,
            line_warned: false,
            polygon_mode: PolygonMode::Fill,
            next_handle: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            framebuffers: HashMap::new(),
            frame_groups: HashMap::new(),
            material_groups: HashMap::new(),
            pass: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// View of a live texture, e.g. the output color attachment for display.
    pub fn texture_view(&self, texture: TextureHandle) -> Option<&wgpu::TextureView> {
        self.textures.get(&texture).map(|t| &t.view)
    }

    pub fn texture(&self, texture: TextureHandle) -> Option<&wgpu::Texture> {
        self.textures.get(&texture).map(|t| &t.texture)
    }

    fn allocate(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Runs `build` inside a validation error scope.
    fn scoped<T>(&self, build: impl FnOnce(&wgpu::Device) -> T) -> Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = build(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    fn check_dimensions(&self, width: u32, height: u32) -> Result<(), String> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(format!("{}x{} is outside 1..={}", width, height, max));
        }
        Ok(())
    }

    fn register_attachment(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> RenderResult<TextureHandle> {
        let texture = self
            .scoped(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
            })
            .map_err(|e| RenderError::FrameBufferIncomplete(format!("{label}: {e}")))?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let handle = TextureHandle::from_raw(self.allocate());
        self.textures.insert(handle, GpuTexture { texture, view });
        Ok(handle)
    }

    fn evict_texture_groups(&mut self, texture: TextureHandle) {
        self.frame_groups.retain(|(_, shadow_map), _| *shadow_map != texture);
        self.material_groups.retain(|slots, _| !slots.contains(&texture));
    }

    fn remove_texture(&mut self, texture: TextureHandle) {
        if self.textures.remove(&texture).is_some() {
            self.evict_texture_groups(texture);
        }
    }

    fn record(&mut self, command: Command) {
        match self.pass.as_mut() {
            Some(pass) => pass.commands.push(command),
            None => tracing::warn!("{:?} recorded outside of a pass, ignored", command),
        }
    }

    fn ensure_frame_group(&mut self, lights: BufferHandle, shadow_map: TextureHandle) -> RenderResult<()> {
        if self.frame_groups.contains_key(&(lights, shadow_map)) {
            return Ok(());
        }
        let buffer = self
            .buffers
            .get(&lights)
            .ok_or_else(|| RenderError::Device(format!("lights buffer {} is not live", lights.raw())))?;
        let depth = self
            .textures
            .get(&shadow_map)
            .ok_or_else(|| RenderError::Device(format!("shadow map {} is not live", shadow_map.raw())))?;

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &self.layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
                },
            ],
        });
        self.frame_groups.insert((lights, shadow_map), group);
        Ok(())
    }

    fn ensure_material_group(&mut self, slots: [TextureHandle; bindings::MATERIAL_SLOTS]) -> RenderResult<()> {
        if self.material_groups.contains_key(&slots) {
            return Ok(());
        }
        let view = |handle: TextureHandle| {
            self.textures
                .get(&handle)
                .map(|t| &t.view)
                .ok_or_else(|| RenderError::Device(format!("material texture {} is not live", handle.raw())))
        };
        let (albedo, normal, specular) = (view(slots[0])?, view(slots[1])?, view(slots[2])?);

        let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.layouts.material,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(albedo),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(normal),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(specular),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.material_sampler),
                },
            ],
        });
        self.material_groups.insert(slots, group);
        Ok(())
    }

    /// Builds every bind group the recorded draws will need.
    fn prepare_bind_groups(&mut self, commands: &[Command]) -> RenderResult<()> {
        let mut state = BindState::default();
        for command in commands {
            state.apply(command);
            if !matches!(command, Command::Draw { .. }) {
                continue;
            }
            let standard = self
                .programs
                .get(&state.program)
                .is_some_and(|p| p.kind == ProgramKind::Standard);
            if standard {
                self.ensure_frame_group(state.lights, state.shadow_map)?;
                self.ensure_material_group(state.textures)?;
            }
        }
        Ok(())
    }

    fn encode(&self, pass: &mut wgpu::RenderPass<'_>, recorded: &PendingPass) -> RenderResult<()> {
        let mut state = BindState::default();
        for command in &recorded.commands {
            state.apply(command);
            match *command {
                Command::SetProgram(handle) => {
                    let program = self.program(handle)?;
                    pass.set_pipeline(program.pipeline(recorded.mode));
                }
                Command::BindMesh(handle) => {
                    let mesh = self
                        .meshes
                        .get(&handle)
                        .ok_or_else(|| RenderError::Device(format!("mesh buffer {} is not live", handle.raw())))?;
                    pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                    pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                }
                Command::Draw {
                    index_count,
                    uniform_offset,
                } => {
                    match self.program(state.program)?.kind {
                        ProgramKind::Standard => {
                            let frame = self.frame_groups.get(&(state.lights, state.shadow_map));
                            let material = self.material_groups.get(&state.textures);
                            let (Some(frame), Some(material)) = (frame, material) else {
                                return Err(RenderError::Device("draw without prepared bind groups".into()));
                            };
                            pass.set_bind_group(0, frame, &[]);
                            pass.set_bind_group(1, self.draw_ring.bind_group(), &[uniform_offset]);
                            pass.set_bind_group(2, material, &[]);
                        }
                        ProgramKind::DepthOnly => {
                            pass.set_bind_group(0, self.draw_ring.bind_group(), &[uniform_offset]);
                        }
                    }
                    pass.draw_indexed(0..index_count, 0, 0..1);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn program(&self, handle: ProgramHandle) -> RenderResult<&Program> {
        self.programs
            .get(&handle)
            .ok_or_else(|| RenderError::Device(format!("program {} is not live", handle.raw())))
    }
}

fn clear_color([r, g, b, a]: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

fn load_op<T, V>(clear: Option<V>, convert: impl FnOnce(V) -> T) -> wgpu::LoadOp<T> {
    match clear {
        Some(value) => wgpu::LoadOp::Clear(convert(value)),
        None => wgpu::LoadOp::Load,
    }
}

/// Size of mip `level` of a `width` x `height` texture.
fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

impl GpuBackend for WgpuBackend {
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> RenderResult<ProgramHandle> {
        if desc.draw_uniform_size > bindings::DRAW_UNIFORM_SLOT {
            return Err(RenderError::ProgramCreation(format!(
                "{}: draw uniforms of {} bytes exceed the {} byte slot",
                desc.label,
                desc.draw_uniform_size,
                bindings::DRAW_UNIFORM_SLOT
            )));
        }

        let program = self
            .scoped(|device| pipelines::create_program(device, &self.layouts, desc, self.line_supported))
            .map_err(|e| RenderError::ProgramCreation(format!("{}: {}", desc.label, e)))?;

        let handle = ProgramHandle::from_raw(self.allocate());
        self.programs.insert(handle, program);
        tracing::debug!("Created {:?} program '{}'", desc.kind, desc.label);
        Ok(handle)
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
    }

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> RenderResult<BufferHandle> {
        let buffer = self
            .scoped(|device| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .map_err(|e| RenderError::BufferCreation(format!("{label}: {e}")))?;

        let handle = BufferHandle::from_raw(self.allocate());
        self.buffers.insert(handle, buffer);
        Ok(handle)
    }

    fn write_uniform_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]) {
        match self.buffers.get(&buffer) {
            Some(target) => self.queue.write_buffer(target, 0, bytes),
            None => tracing::warn!("Write to unknown uniform buffer {}", buffer.raw()),
        }
    }

    fn destroy_uniform_buffer(&mut self, buffer: BufferHandle) {
        if self.buffers.remove(&buffer).is_some() {
            self.frame_groups.retain(|(lights, _), _| *lights != buffer);
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>, levels: &[Vec<u8>]) -> RenderResult<TextureHandle> {
        self.check_dimensions(desc.width, desc.height)
            .map_err(|e| RenderError::TextureCreation(format!("{}: {}", desc.label, e)))?;
        if levels.len() as u32 != desc.mip_levels {
            return Err(RenderError::TextureCreation(format!(
                "{}: {} mip levels given, {} declared",
                desc.label,
                levels.len(),
                desc.mip_levels
            )));
        }
        for (level, data) in levels.iter().enumerate() {
            let (w, h) = mip_extent(desc.width, desc.height, level as u32);
            if data.len() != (w * h * 4) as usize {
                return Err(RenderError::TextureCreation(format!(
                    "{}: level {} holds {} bytes, expected {}",
                    desc.label,
                    level,
                    data.len(),
                    w * h * 4
                )));
            }
        }

        let texture = self
            .scoped(|device| {
                device.create_texture(&wgpu::TextureDescriptor {
                    label: Some(desc.label),
                    size: wgpu::Extent3d {
                        width: desc.width,
                        height: desc.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: desc.mip_levels,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: textures::FORMAT,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                })
            })
            .map_err(|e| RenderError::TextureCreation(format!("{}: {}", desc.label, e)))?;

        for (level, data) in levels.iter().enumerate() {
            let (w, h) = mip_extent(desc.width, desc.height, level as u32);
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let handle = TextureHandle::from_raw(self.allocate());
        self.textures.insert(handle, GpuTexture { texture, view });
        Ok(handle)
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.remove_texture(texture);
    }

    fn create_mesh_buffer(&mut self, upload: &MeshUpload<'_>) -> RenderResult<MeshBufferHandle> {
        if upload.vertices.is_empty() || upload.indices.is_empty() {
            return Err(RenderError::MeshUpload(format!("{}: mesh is empty", upload.label)));
        }

        let mesh = self
            .scoped(|device| GpuMesh {
                vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(upload.label),
                    contents: bytemuck::cast_slice(upload.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                }),
                indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(upload.label),
                    contents: bytemuck::cast_slice(upload.indices),
                    usage: wgpu::BufferUsages::INDEX,
                }),
            })
            .map_err(|e| RenderError::MeshUpload(format!("{}: {}", upload.label, e)))?;

        let handle = MeshBufferHandle::from_raw(self.allocate());
        self.meshes.insert(handle, mesh);
        Ok(handle)
    }

    fn destroy_mesh_buffer(&mut self, mesh: MeshBufferHandle) {
        self.meshes.remove(&mesh);
    }

    fn create_framebuffer(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        kind: FrameBufferKind,
    ) -> RenderResult<FrameBuffer> {
        self.check_dimensions(width, height)
            .map_err(|e| RenderError::FrameBufferIncomplete(format!("{label}: {e}")))?;

        let (depth_format, depth_usage) = match kind {
            FrameBufferKind::Color => (output::DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT),
            FrameBufferKind::DepthOnly => (
                shadow::FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            ),
        };
        let depth = self.register_attachment(label, width, height, depth_format, depth_usage)?;

        let color = match kind {
            FrameBufferKind::Color => {
                let usage = wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC;
                match self.register_attachment(label, width, height, output::COLOR_FORMAT, usage) {
                    Ok(color) => color,
                    Err(e) => {
                        self.remove_texture(depth);
                        return Err(e);
                    }
                }
            }
            FrameBufferKind::DepthOnly => TextureHandle::NULL,
        };

        let handle = FrameBufferHandle::from_raw(self.allocate());
        self.framebuffers.insert(
            handle,
            GpuFrameBuffer {
                color,
                depth,
                depth_format,
            },
        );
        tracing::debug!("Created {:?} framebuffer '{}' {}x{}", kind, label, width, height);

        Ok(FrameBuffer {
            handle,
            kind,
            color_texture: color,
            depth_texture: depth,
            width,
            height,
        })
    }

    fn destroy_framebuffer(&mut self, framebuffer: &mut FrameBuffer) {
        if let Some(attachments) = self.framebuffers.remove(&framebuffer.handle) {
            self.remove_texture(attachments.color);
            self.remove_texture(attachments.depth);
        }
        *framebuffer = FrameBuffer::unset(framebuffer.kind);
    }

    fn begin_pass(&mut self, target: &FrameBuffer, clear: ClearOps) {
        if self.pass.is_some() {
            tracing::warn!("begin_pass while a pass is open, dropping the open pass");
            self.draw_ring.reset();
        }
        self.pass = Some(PendingPass {
            target: target.handle,
            clear,
            mode: self.polygon_mode,
            uniform_offset: None,
            commands: Vec::new(),
        });
    }

    fn set_program(&mut self, program: ProgramHandle) {
        self.record(Command::SetProgram(program));
    }

    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferHandle) {
        self.record(Command::BindUniform { binding, buffer });
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.record(Command::BindTexture { slot, texture });
    }

    fn bind_shadow_map(&mut self, texture: TextureHandle) {
        self.record(Command::BindShadowMap(texture));
    }

    fn bind_mesh(&mut self, mesh: MeshBufferHandle) {
        self.record(Command::BindMesh(mesh));
    }

    fn set_draw_uniforms(&mut self, bytes: &[u8]) {
        let Some(pass) = self.pass.as_mut() else {
            tracing::warn!("Draw uniforms set outside of a pass, ignored");
            return;
        };
        pass.uniform_offset = Some(self.draw_ring.push(bytes));
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let Some(pass) = self.pass.as_mut() else {
            tracing::warn!("Draw outside of a pass, ignored");
            return;
        };
        let uniform_offset = match pass.uniform_offset {
            Some(offset) => offset,
            None => {
                let offset = self.draw_ring.push(&[]);
                pass.uniform_offset = Some(offset);
                offset
            }
        };
        pass.commands.push(Command::Draw {
            index_count,
            uniform_offset,
        });
    }

    fn end_pass(&mut self) -> RenderResult<()> {
        let recorded = self
            .pass
            .take()
            .ok_or_else(|| RenderError::Device("end_pass without begin_pass".into()))?;
        let result = self.submit(&recorded);
        self.draw_ring.reset();
        result
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if mode == PolygonMode::Line && !self.line_supported && !self.line_warned {
            tracing::warn!("Device lacks POLYGON_MODE_LINE, wireframe draws filled");
            self.line_warned = true;
        }
        self.polygon_mode = mode;
    }
}

impl WgpuBackend {
    fn submit(&mut self, recorded: &PendingPass) -> RenderResult<()> {
        let target = *self.framebuffers.get(&recorded.target).ok_or_else(|| {
            RenderError::Device(format!("framebuffer {} is not live", recorded.target.raw()))
        })?;

        self.prepare_bind_groups(&recorded.commands)?;
        self.draw_ring
            .flush(&self.device, &self.queue, &self.layouts.draw);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Kiln Pass Encoder"),
            });

        {
            // Depth-only targets declare no color slots at all.
            let color_attachments: Vec<_> = self
                .textures
                .get(&target.color)
                .map(|color| wgpu::RenderPassColorAttachment {
                    view: &color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: load_op(recorded.clear.color, clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })
                .into_iter()
                .map(Some)
                .collect();
            let depth = self.textures.get(&target.depth).ok_or_else(|| {
                RenderError::Device(format!("depth attachment {} is not live", target.depth.raw()))
            })?;
            let stencil_ops = target.depth_format.has_stencil_aspect().then(|| wgpu::Operations {
                load: load_op(recorded.clear.depth.map(|_| 0), |s| s),
                store: wgpu::StoreOp::Store,
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Kiln Render Pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: load_op(recorded.clear.depth, |d| d),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.encode(&mut pass, recorded)?;
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_extent_clamps_to_one() {
        assert_eq!(mip_extent(8, 2, 0), (8, 2));
        assert_eq!(mip_extent(8, 2, 2), (2, 1));
        assert_eq!(mip_extent(8, 2, 5), (1, 1));
    }

    #[test]
    fn test_load_op() {
        assert_eq!(load_op(None::<f32>, |d| d), wgpu::LoadOp::Load);
        assert_eq!(load_op(Some(1.0f32), |d| d), wgpu::LoadOp::Clear(1.0));
        assert_eq!(
            load_op(Some([0.5, 0.0, 0.0, 1.0]), clear_color),
            wgpu::LoadOp::Clear(wgpu::Color {
                r: 0.5,
                g: 0.0,
                b: 0.0,
                a: 1.0
            })
        );
    }

    #[test]
    fn test_bind_state_tracks_material_slots() {
        let mut state = BindState::default();
        state.apply(&Command::BindTexture {
            slot: 1,
            texture: TextureHandle::from_raw(7),
        });
        state.apply(&Command::BindTexture {
            slot: 9,
            texture: TextureHandle::from_raw(8),
        });
        state.apply(&Command::BindUniform {
            binding: bindings::LIGHTS,
            buffer: BufferHandle::from_raw(2),
        });
        assert_eq!(state.textures[1], TextureHandle::from_raw(7));
        assert_eq!(state.textures[0], TextureHandle::NULL);
        assert_eq!(state.lights, BufferHandle::from_raw(2));
    }
}
