//! Kiln Renderer
//!
//! Shadow-mapped forward renderer for [`kiln_core::Scene`] content.
//!
//! # Architecture
//!
//! - [`backend::GpuBackend`] - Seam through which every GPU call is issued
//! - [`backend::wgpu_backend::WgpuBackend`] - Production backend on wgpu
//! - [`resources::ResourceCache`] - Content-keyed mesh/texture uploads
//! - [`lighting::LightingAggregator`] - Packs scene lights into a uniform buffer
//! - [`passes::ShadowPass`] / [`passes::ForwardPass`] - The two per-frame passes
//! - [`renderer::Renderer`] - Orchestrates a frame
//!
//! # Example
//!
//! ```ignore
//! use kiln_renderer::{Renderer, RendererConfig, ViewportSize, WgpuBackend};
//!
//! let backend = WgpuBackend::new(device, queue);
//! let mut renderer = Renderer::new(backend, RendererConfig::default());
//! renderer.initialize()?;
//!
//! let stats = renderer.render(ViewportSize::new(1920, 1080), &scene)?;
//! renderer.cleanup();
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod lighting;
pub mod passes;
pub mod renderer;
pub mod resources;

#[cfg(test)]
mod testing;

pub use backend::wgpu_backend::WgpuBackend;
pub use backend::{
    BufferHandle, ClearOps, FrameBufferHandle, FrameBufferKind, GpuBackend, MeshBufferHandle,
    PolygonMode, ProgramHandle, ProgramKind, TextureHandle,
};
pub use config::RendererConfig;
pub use error::{RenderError, RenderResult};
pub use lighting::{GpuLight, LightingAggregator, LightsUniform};
pub use renderer::{FrameStats, Renderer, ViewportSize};
pub use resources::{FrameBuffer, MeshBuffer, ResourceCache, ShaderProgram, Texture};
