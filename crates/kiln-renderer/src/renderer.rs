//! Frame orchestration.

use glam::Mat4;
use kiln_core::Scene;

use crate::backend::{FrameBufferKind, GpuBackend, PolygonMode, TextureHandle};
use crate::config::RendererConfig;
use crate::error::{RenderError, RenderResult};
use crate::lighting::LightingAggregator;
use crate::passes::{ForwardFrame, ForwardPass, ShadowPass, ShadowState};
use crate::resources::{DefaultTextures, FrameBuffer, ResourceCache};

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// What a call to [`Renderer::render`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Forward pass draw calls
    pub draw_calls: u32,
    pub shadow_draw_calls: u32,
    pub active_lights: u32,
    /// New cache uploads this frame
    pub uploads: u64,
    pub shadow_rendered: bool,
    /// The frame was skipped because the viewport was empty
    pub skipped: bool,
}

/// Owns the resource cache, both passes, the default textures and the
/// output framebuffer, and runs them in a fixed order each frame.
pub struct Renderer<B: GpuBackend> {
    backend: B,
    config: RendererConfig,
    cache: ResourceCache,
    lighting: LightingAggregator,
    shadow: ShadowPass,
    forward: ForwardPass,
    defaults: DefaultTextures,
    output: FrameBuffer,
    wireframe: bool,
    initialized: bool,
    frame_index: u64,
}

impl<B: GpuBackend> Renderer<B> {
    /// Creates an uninitialized renderer. Call [`Renderer::initialize`]
    /// before rendering.
    pub fn new(backend: B, config: RendererConfig) -> Self {
        let wireframe = config.wireframe;
        Self {
            backend,
            config,
            cache: ResourceCache::new(),
            lighting: LightingAggregator::new(),
            shadow: ShadowPass::new(),
            forward: ForwardPass::new(),
            defaults: DefaultTextures::default(),
            output: FrameBuffer::unset(FrameBufferKind::Color),
            wireframe,
            initialized: false,
            frame_index: 0,
        }
    }

    /// Creates programs, the lighting buffer, default textures and both
    /// framebuffers. On failure everything created so far is released.
    pub fn initialize(&mut self) -> RenderResult<()> {
        if self.initialized {
            return Ok(());
        }

        if let Err(err) = self.create_resources() {
            tracing::error!("Renderer initialization failed: {}", err);
            self.release();
            return Err(err);
        }

        self.backend.set_polygon_mode(self.polygon_mode());
        self.initialized = true;
        tracing::info!(
            "Renderer initialized (output {}x{}, shadow map {}x{})",
            self.output.width,
            self.output.height,
            self.shadow.framebuffer().width,
            self.shadow.framebuffer().height
        );
        Ok(())
    }

    fn create_resources(&mut self) -> RenderResult<()> {
        self.forward.create_program(&mut self.backend)?;
        self.shadow.create_program(&mut self.backend)?;
        self.lighting.create(&mut self.backend)?;
        self.defaults.create(&mut self.backend)?;
        self.shadow.create_target(&mut self.backend)?;

        let (width, height) = (self.config.output_width, self.config.output_height);
        let (width, height) = self.config.output_size_for(width, height);
        self.output =
            self.backend
                .create_framebuffer("Output", width, height, FrameBufferKind::Color)?;
        Ok(())
    }

    /// Renders one frame: resource upload, lighting, shadow pass, forward pass.
    ///
    /// An empty viewport skips the frame without touching the GPU.
    pub fn render(&mut self, viewport: ViewportSize, scene: &Scene) -> RenderResult<FrameStats> {
        if viewport.is_empty() {
            return Ok(FrameStats {
                skipped: true,
                ..Default::default()
            });
        }
        if !self.initialized {
            return Err(RenderError::NotInitialized);
        }

        self.resize_output(viewport)?;

        let uploads = self.cache.allocate_scene(&mut self.backend, scene)?;
        let lighting = self.lighting.update(&mut self.backend, scene.lights());

        let shadow_draw_calls = match lighting.shadow_direction {
            Some(direction) => {
                self.shadow
                    .render(&mut self.backend, scene, &self.cache, direction)?
            }
            None => {
                self.shadow.skip();
                0
            }
        };

        let frame = ForwardFrame {
            target: &self.output,
            aspect: viewport.aspect(),
            clear_color: self.config.clear_color,
            lights: self.lighting.buffer(),
            active_lights: lighting.active_lights,
            shadow_light: lighting.shadow_light_slot(),
            shadow_map: self.shadow.framebuffer().depth_texture,
            light_space: self.shadow.light_space(),
            defaults: &self.defaults,
        };
        let draw_calls = self
            .forward
            .render(&mut self.backend, scene, &self.cache, &frame)?;

        self.frame_index += 1;
        if uploads > 0 {
            tracing::debug!("Frame {}: uploaded {} resources", self.frame_index, uploads);
        }

        Ok(FrameStats {
            draw_calls,
            shadow_draw_calls,
            active_lights: lighting.active_lights,
            uploads,
            shadow_rendered: self.shadow.state() == ShadowState::Rendering,
            skipped: false,
        })
    }

    fn resize_output(&mut self, viewport: ViewportSize) -> RenderResult<()> {
        if !self.config.follow_viewport {
            return Ok(());
        }
        let size = self.config.output_size_for(viewport.width, viewport.height);
        if size == self.output.size() {
            return Ok(());
        }

        tracing::debug!(
            "Resizing output {}x{} -> {}x{}",
            self.output.width,
            self.output.height,
            size.0,
            size.1
        );
        self.backend.destroy_framebuffer(&mut self.output);
        self.output = self
            .backend
            .create_framebuffer("Output", size.0, size.1, FrameBufferKind::Color)?;
        Ok(())
    }

    /// Releases every GPU object. Safe to call repeatedly and on a renderer
    /// that was never initialized.
    pub fn cleanup(&mut self) {
        if self.initialized {
            tracing::info!(
                "Renderer cleanup ({} meshes, {} textures cached)",
                self.cache.mesh_count(),
                self.cache.texture_count()
            );
        }
        self.release();
        self.initialized = false;
    }

    fn release(&mut self) {
        self.forward.destroy(&mut self.backend);
        self.lighting.destroy(&mut self.backend);
        self.defaults.destroy(&mut self.backend);
        self.cache.clear(&mut self.backend);
        self.backend.destroy_framebuffer(&mut self.output);
        self.shadow.destroy(&mut self.backend);
    }

    /// Flips global polygon mode between fill and line. Returns true if
    /// wireframe is now on.
    pub fn toggle_wireframe(&mut self) -> bool {
        self.wireframe = !self.wireframe;
        self.backend.set_polygon_mode(self.polygon_mode());
        tracing::debug!("Wireframe {}", if self.wireframe { "on" } else { "off" });
        self.wireframe
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    fn polygon_mode(&self) -> PolygonMode {
        if self.wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        }
    }

    /// Color attachment of the output framebuffer, for display by a UI layer.
    pub fn output_texture(&self) -> TextureHandle {
        self.output.color_texture
    }

    pub fn output(&self) -> &FrameBuffer {
        &self.output
    }

    /// Shadow transform of the last frame that had a directional light.
    pub fn light_space_matrix(&self) -> Mat4 {
        self.shadow.light_space()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: GpuBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        self.cleanup();
    }
}
