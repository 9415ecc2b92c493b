//! Kiln headless viewer
//!
//! Renders the built-in demo scene offscreen for a configured number of
//! frames and logs per-frame statistics.
//!
//! Usage: `kiln-viewer [config.ron]`

mod config;
mod demo;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use kiln_renderer::{RenderError, Renderer, ViewportSize, WgpuBackend};

use crate::config::{ConfigManager, ViewerConfig};

#[derive(Debug, thiserror::Error)]
enum ViewerError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kiln_renderer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Kiln viewer");

    let manager = ConfigManager::new(std::env::args_os().nth(1).map(PathBuf::from));
    // Leave a template behind for a config path that does not exist yet
    if let Some(path) = manager.config_path().filter(|p| !p.exists()) {
        if let Err(e) = manager.save_to(path) {
            tracing::warn!("Failed to write default config: {}", e);
        }
    }

    match run(manager.config()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn create_device(config: &ViewerConfig) -> Result<(Arc<wgpu::Device>, Arc<wgpu::Queue>), ViewerError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: config.backend.backends(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        force_fallback_adapter: false,
        compatible_surface: None,
    }))
    .ok_or(ViewerError::NoAdapter)?;

    let info = adapter.get_info();
    tracing::info!("Using adapter {} ({:?})", info.name, info.backend);

    let (device, queue) = pollster::block_on(adapter.request_device(
        &wgpu::DeviceDescriptor {
            label: Some("kiln-viewer device"),
            required_features: adapter.features() & WgpuBackend::optional_features(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::default(),
        },
        None,
    ))?;

    Ok((Arc::new(device), Arc::new(queue)))
}

fn run(config: &ViewerConfig) -> Result<(), ViewerError> {
    let (device, queue) = create_device(config)?;
    let backend = WgpuBackend::new(device.clone(), queue);

    let mut renderer = Renderer::new(backend, config.renderer.clone());
    renderer.initialize()?;

    let scene = demo::build_scene();
    let viewport = ViewportSize::new(config.viewport_width, config.viewport_height);
    let half = config.frames / 2;

    for frame in 0..config.frames {
        if config.toggle_wireframe && frame == half {
            let wireframe = renderer.toggle_wireframe();
            tracing::info!("Wireframe {}", if wireframe { "on" } else { "off" });
        }

        let stats = renderer.render(viewport, &scene)?;
        tracing::debug!("Frame {}: {:?}", frame, stats);
        if frame + 1 == config.frames {
            tracing::info!(
                "Last frame: {} draws, {} shadow draws, {} lights, {} uploads",
                stats.draw_calls,
                stats.shadow_draw_calls,
                stats.active_lights,
                stats.uploads
            );
        }
    }

    let cache = renderer.cache();
    tracing::info!(
        "Rendered {} frames ({} meshes, {} textures cached)",
        config.frames,
        cache.mesh_count(),
        cache.texture_count()
    );

    let _ = device.poll(wgpu::Maintain::Wait);
    renderer.cleanup();
    Ok(())
}
