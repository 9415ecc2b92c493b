//! Runtime renderer settings.

use serde::{Deserialize, Serialize};

use crate::constants::output;

/// Tunable renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Output framebuffer width when not following the viewport
    pub output_width: u32,
    /// Output framebuffer height when not following the viewport
    pub output_height: u32,
    /// Resize the output framebuffer to the viewport each frame
    pub follow_viewport: bool,
    pub clear_color: [f32; 4],
    /// Start with line polygon mode
    pub wireframe: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            output_width: output::DEFAULT_WIDTH,
            output_height: output::DEFAULT_HEIGHT,
            follow_viewport: true,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            wireframe: false,
        }
    }
}

impl RendererConfig {
    /// Output size for a viewport, clamped to the supported range.
    pub fn output_size_for(&self, viewport_width: u32, viewport_height: u32) -> (u32, u32) {
        let (w, h) = if self.follow_viewport {
            (viewport_width, viewport_height)
        } else {
            (self.output_width, self.output_height)
        };
        (
            w.clamp(1, output::MAX_DIMENSION),
            h.clamp(1, output::MAX_DIMENSION),
        )
    }
}
