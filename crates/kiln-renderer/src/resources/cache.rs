//! Content-keyed GPU resource cache.
//!
//! Meshes and images are uploaded at most once per [`AssetId`] for the life
//! of the cache. Nothing is evicted until [`ResourceCache::clear`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use kiln_core::{AssetId, Image, MeshData, Scene};

use crate::backend::{GpuBackend, MeshBufferHandle, MeshUpload};
use crate::error::RenderResult;
use crate::resources::{MeshBuffer, MeshVertex, Texture, upload_image};

/// Upload counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub mesh_uploads: u64,
    pub texture_uploads: u64,
}

impl CacheStats {
    pub fn total(&self) -> u64 {
        self.mesh_uploads + self.texture_uploads
    }
}

/// Maps content identity to uploaded GPU objects.
#[derive(Debug, Default)]
pub struct ResourceCache {
    meshes: HashMap<AssetId, MeshBuffer>,
    textures: HashMap<AssetId, Texture>,
    stats: CacheStats,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the buffer for `mesh`, uploading it on first use.
    ///
    /// A mesh without indices is cached with a null handle and a zero
    /// index count; no GPU buffer is created for it.
    pub fn ensure_mesh<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        mesh: &MeshData,
    ) -> RenderResult<&MeshBuffer> {
        match self.meshes.entry(mesh.id()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                // Nothing to upload; cached so passes can skip it.
                if mesh.indices().is_empty() {
                    tracing::debug!("Mesh {} has no triangles, not uploaded", mesh.id());
                    return Ok(entry.insert(MeshBuffer {
                        handle: MeshBufferHandle::NULL,
                        vertex_count: mesh.vertex_count() as u32,
                        index_count: 0,
                    }));
                }
                let vertices = MeshVertex::interleave(mesh);
                let label = format!("Mesh {}", mesh.id());
                let handle = backend.create_mesh_buffer(&MeshUpload {
                    label: &label,
                    vertices: &vertices,
                    indices: mesh.indices(),
                })?;

                self.stats.mesh_uploads += 1;
                tracing::debug!(
                    "Uploaded mesh {} ({} vertices, {} indices)",
                    mesh.id(),
                    vertices.len(),
                    mesh.indices().len()
                );

                Ok(entry.insert(MeshBuffer {
                    handle,
                    vertex_count: vertices.len() as u32,
                    index_count: mesh.indices().len() as u32,
                }))
            }
        }
    }

    /// Returns the texture for `image`, uploading it on first use.
    pub fn ensure_texture<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        image: &Image,
    ) -> RenderResult<&Texture> {
        match self.textures.entry(image.id()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let label = format!("Texture {}", image.id());
                let texture = upload_image(backend, &label, image)?;

                self.stats.texture_uploads += 1;
                tracing::debug!(
                    "Uploaded texture {} ({}x{}, {} levels)",
                    image.id(),
                    texture.width,
                    texture.height,
                    texture.levels
                );

                Ok(entry.insert(texture))
            }
        }
    }

    /// Uploads everything the scene's mesh renderers reference.
    ///
    /// Every mesh is uploaded (shadow casters need it even without a
    /// material); textures only for entities that have a material. Returns
    /// the number of new uploads.
    pub fn allocate_scene<B: GpuBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        scene: &Scene,
    ) -> RenderResult<u64> {
        let before = self.stats.total();

        for (_, mesh_renderer) in scene.mesh_renderers() {
            self.ensure_mesh(backend, &mesh_renderer.mesh)?;

            if let Some(material) = &mesh_renderer.material {
                for image in material.textures().into_iter().flatten() {
                    self.ensure_texture(backend, image)?;
                }
            }
        }

        Ok(self.stats.total() - before)
    }

    pub fn mesh(&self, id: AssetId) -> Option<&MeshBuffer> {
        self.meshes.get(&id)
    }

    pub fn texture(&self, id: AssetId) -> Option<&Texture> {
        self.textures.get(&id)
    }

    pub fn contains_mesh(&self, id: AssetId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn contains_texture(&self, id: AssetId) -> bool {
        self.textures.contains_key(&id)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty() && self.textures.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Destroys every cached mesh, then every cached texture.
    pub fn clear<B: GpuBackend + ?Sized>(&mut self, backend: &mut B) {
        if self.is_empty() {
            return;
        }
        tracing::debug!(
            "Releasing {} meshes and {} textures",
            self.meshes.len(),
            self.textures.len()
        );
        for (_, mesh) in self.meshes.drain() {
            backend.destroy_mesh_buffer(mesh.handle);
        }
        for (_, mut texture) in self.textures.drain() {
            texture.destroy(backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use kiln_core::{Material, MeshRendererComponent, TransformComponent, primitives};

    use super::*;
    use crate::testing::{GpuCall, RecordingBackend};

    #[test]
    fn test_ensure_mesh_uploads_once() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new();
        let mesh = primitives::cube(1.0);

        let first = *cache.ensure_mesh(&mut backend, &mesh).unwrap();
        let second = *cache.ensure_mesh(&mut backend, &mesh).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.mesh_uploads, 1);
        assert_eq!(cache.stats().mesh_uploads, 1);
        assert_eq!(first.index_count, 36);
    }

    #[test]
    fn test_identical_content_different_ids_do_not_collide() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new();
        let a = Image::new(vec![1, 2, 3], 1, 1, 3).unwrap();
        let b = Image::new(vec![1, 2, 3], 1, 1, 3).unwrap();

        let ta = *cache.ensure_texture(&mut backend, &a).unwrap();
        let tb = *cache.ensure_texture(&mut backend, &b).unwrap();

        assert_ne!(ta.handle, tb.handle);
        assert_eq!(cache.texture_count(), 2);
        assert_eq!(backend.texture_uploads, 2);
    }

    #[test]
    fn test_texture_carries_mip_levels() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new();
        let image = Image::new(vec![0; 8 * 4 * 4], 8, 4, 4).unwrap();

        let texture = *cache.ensure_texture(&mut backend, &image).unwrap();
        assert_eq!(texture.levels, 4);
        assert_eq!((texture.width, texture.height), (8, 4));
    }

    #[test]
    fn test_allocate_scene_shares_content() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new();
        let mut scene = Scene::new();

        let mesh = Arc::new(primitives::cube(1.0));
        let albedo = Arc::new(Image::solid_rgb([200, 10, 10]));
        let material = Arc::new(Material::new().with_albedo(albedo.clone()));
        for i in 0..3 {
            scene
                .spawn_named(format!("cube {i}"))
                .with(TransformComponent::default())
                .with(MeshRendererComponent::new(mesh.clone()).with_material(material.clone()));
        }
        let caster = Arc::new(primitives::plane(4.0));
        scene
            .spawn_named("bare caster")
            .with(MeshRendererComponent::new(caster.clone()));

        assert_eq!(cache.allocate_scene(&mut backend, &scene).unwrap(), 3);
        assert_eq!(cache.allocate_scene(&mut backend, &scene).unwrap(), 0);
        assert!(cache.contains_mesh(mesh.id()));
        assert!(cache.contains_mesh(caster.id()));
        assert!(cache.contains_texture(albedo.id()));
        assert_eq!((cache.mesh_count(), cache.texture_count()), (2, 1));
    }

    #[test]
    fn test_clear_destroys_everything() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new();
        let mesh = cache
            .ensure_mesh(&mut backend, &primitives::plane(1.0))
            .unwrap()
            .handle;
        let texture = cache
            .ensure_texture(&mut backend, &Image::solid_rgb([0, 0, 0]))
            .unwrap()
            .handle;

        cache.clear(&mut backend);
        cache.clear(&mut backend);

        assert!(cache.is_empty());
        assert_eq!(backend.count(|c| matches!(c, GpuCall::DestroyMeshBuffer(h) if *h == mesh)), 1);
        assert_eq!(backend.count(|c| matches!(c, GpuCall::DestroyTexture(h) if *h == texture)), 1);
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn test_empty_mesh_cached_without_upload() {
        let mut backend = RecordingBackend::new();
        let mut cache = ResourceCache::new();
        let mesh = MeshData::new(vec![], vec![], vec![], vec![]).unwrap();

        let buffer = *cache.ensure_mesh(&mut backend, &mesh).unwrap();
        assert!(buffer.handle.is_null());
        assert_eq!(buffer.index_count, 0);
        assert!(cache.contains_mesh(mesh.id()));
        assert_eq!(backend.mesh_uploads, 0);
        assert_eq!(cache.stats().mesh_uploads, 0);

        cache.clear(&mut backend);
        assert_eq!(backend.count(|c| matches!(c, GpuCall::DestroyMeshBuffer(_))), 0);
    }
}
