//! Surface material description.

use std::sync::Arc;

use glam::Vec3;

use crate::image::Image;

/// Surface shading parameters plus optional texture references.
///
/// Any texture slot may be empty; the renderer substitutes its built-in
/// default for that slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub albedo: Option<Arc<Image>>,
    pub normal: Option<Arc<Image>>,
    pub specular: Option<Arc<Image>>,
    /// Ambient tint
    pub ambient: Vec3,
    pub specular_strength: Vec3,
    pub shininess: f32,
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: None,
            normal: None,
            specular: None,
            ambient: Vec3::splat(0.1),
            specular_strength: Vec3::splat(0.3),
            shininess: 32.0,
            opacity: 1.0,
        }
    }
}

impl Material {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_albedo(mut self, image: Arc<Image>) -> Self {
        self.albedo = Some(image);
        self
    }

    pub fn with_normal(mut self, image: Arc<Image>) -> Self {
        self.normal = Some(image);
        self
    }

    pub fn with_specular(mut self, image: Arc<Image>) -> Self {
        self.specular = Some(image);
        self
    }

    pub fn with_ambient(mut self, ambient: Vec3) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_specular_strength(mut self, strength: Vec3) -> Self {
        self.specular_strength = strength;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Texture slots in binding order: albedo, normal, specular.
    pub fn textures(&self) -> [Option<&Arc<Image>>; 3] {
        [
            self.albedo.as_ref(),
            self.normal.as_ref(),
            self.specular.as_ref(),
        ]
    }
}
