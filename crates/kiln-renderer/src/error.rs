//! Renderer error types.

use thiserror::Error;

/// Errors raised by the renderer and its GPU backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Shader program creation failed: {0}")]
    ProgramCreation(String),

    #[error("Framebuffer incomplete: {0}")]
    FrameBufferIncomplete(String),

    #[error("Buffer creation failed: {0}")]
    BufferCreation(String),

    #[error("Texture creation failed: {0}")]
    TextureCreation(String),

    #[error("Mesh upload failed: {0}")]
    MeshUpload(String),

    #[error("Renderer used before initialize()")]
    NotInitialized,

    #[error("GPU device error: {0}")]
    Device(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
