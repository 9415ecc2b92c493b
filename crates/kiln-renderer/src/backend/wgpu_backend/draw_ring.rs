//! Growable dynamic-offset uniform buffer for per-draw data.

use crate::constants::bindings::DRAW_UNIFORM_SLOT;

/// Slots a fresh ring can hold before it grows.
const INITIAL_SLOTS: u64 = 256;

/// Per-draw uniforms of one pass, staged on the CPU and written in one go
/// before the pass is encoded. Each draw gets a `stride`-aligned slot.
pub(super) struct DrawRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u64,
    stride: u64,
    staging: Vec<u8>,
}

impl DrawRing {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let stride = DRAW_UNIFORM_SLOT.div_ceil(alignment) * alignment;
        let capacity = stride * INITIAL_SLOTS;
        let (buffer, bind_group) = Self::allocate(device, layout, capacity);

        Self {
            buffer,
            bind_group,
            capacity,
            stride,
            staging: Vec::new(),
        }
    }

    fn allocate(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Ring"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Draw Uniform Ring Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DRAW_UNIFORM_SLOT),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Stages one draw's uniforms and returns its dynamic offset.
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.staging.len();
        let len = bytes.len().min(DRAW_UNIFORM_SLOT as usize);
        self.staging.extend_from_slice(&bytes[..len]);
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    /// Uploads the staged slots, growing the buffer if they do not fit.
    pub fn flush(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) {
        if self.staging.is_empty() {
            return;
        }

        let needed = self.staging.len() as u64;
        if needed > self.capacity {
            let mut capacity = self.capacity * 2;
            while capacity < needed {
                capacity *= 2;
            }
            tracing::debug!("Growing draw uniform ring {} -> {} bytes", self.capacity, capacity);
            let (buffer, bind_group) = Self::allocate(device, layout, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }

        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    /// Drops the staged slots of the finished pass.
    pub fn reset(&mut self) {
        self.staging.clear();
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
