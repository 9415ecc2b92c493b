//! Kiln Core Data Structures
//!
//! This crate contains the scene data consumed by the renderer:
//! - AssetId: stable content identity attached to decoded assets
//! - MeshData / Image / Material: decoded, immutable asset data
//! - Components: transform, mesh renderer, camera, light
//! - Scene: slot-based entity store with component queries

pub mod asset;
pub mod components;
pub mod image;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod scene;

pub use asset::*;
pub use components::*;
pub use image::*;
pub use material::*;
pub use mesh::*;
pub use scene::*;
