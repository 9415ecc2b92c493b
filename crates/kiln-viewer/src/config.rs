//! Viewer configuration loaded from a RON file

use std::path::{Path, PathBuf};

use kiln_renderer::RendererConfig;
use serde::{Deserialize, Serialize};

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] ron::error::SpannedError),
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}

/// Which wgpu backends the adapter may come from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BackendPreference {
    #[default]
    Auto,
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl BackendPreference {
    pub fn backends(self) -> wgpu::Backends {
        match self {
            BackendPreference::Auto => wgpu::Backends::all(),
            BackendPreference::Vulkan => wgpu::Backends::VULKAN,
            BackendPreference::Metal => wgpu::Backends::METAL,
            BackendPreference::Dx12 => wgpu::Backends::DX12,
            BackendPreference::Gl => wgpu::Backends::GL,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub renderer: RendererConfig,
    /// Number of frames to render before exiting
    pub frames: u32,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub backend: BackendPreference,
    /// Flip wireframe mode after half of the frames
    pub toggle_wireframe: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            frames: 60,
            viewport_width: 1280,
            viewport_height: 720,
            backend: BackendPreference::Auto,
            toggle_wireframe: false,
        }
    }
}

/// Loads and saves the viewer configuration
pub struct ConfigManager {
    config: ViewerConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load from `path` when given, falling back to defaults
    pub fn new(path: Option<PathBuf>) -> Self {
        let config = path
            .as_deref()
            .and_then(Self::load_from_path)
            .unwrap_or_else(|| {
                tracing::info!("No usable config file, using defaults");
                ViewerConfig::default()
            });

        Self {
            config,
            config_path: path,
        }
    }

    fn load_from_path(path: &Path) -> Option<ViewerConfig> {
        match Self::read(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    fn read(path: &Path) -> Result<ViewerConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(ron::from_str(&content)?)
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Write the configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = ron::ser::to_string_pretty(&self.config, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, content)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
