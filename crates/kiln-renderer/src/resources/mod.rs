//! GPU resource objects and the content-keyed resource cache.

mod cache;
mod gpu;
mod texture;
mod vertex;

pub use cache::{CacheStats, ResourceCache};
pub use gpu::{FrameBuffer, MeshBuffer, ShaderProgram, Texture};
pub use texture::{DefaultTextures, expand_to_rgba, mip_chain, mip_level_count, upload_image};
pub use vertex::MeshVertex;
