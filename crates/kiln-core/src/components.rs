//! Entity components consumed by the renderer.

use std::sync::Arc;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::mesh::MeshData;

/// Human-readable entity name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NameComponent(pub String);

impl NameComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// World placement of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformComponent {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl TransformComponent {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Model matrix: translation, then rotation, then scale (T * R * S).
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale)
    }

    /// Local -Z rotated into world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    /// Sets rotation from pitch (X), yaw (Y) and roll (Z) in degrees.
    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.rotation = Quat::from_euler(
            EulerRot::YXZ,
            degrees.y.to_radians(),
            degrees.x.to_radians(),
            degrees.z.to_radians(),
        );
    }

    pub fn scale_uniform(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// View matrix for an entity used as a camera.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward(), self.up())
    }
}

/// Draws a mesh with an optional material.
#[derive(Debug, Clone)]
pub struct MeshRendererComponent {
    pub mesh: Arc<MeshData>,
    pub material: Option<Arc<Material>>,
    pub cast_shadows: bool,
}

impl MeshRendererComponent {
    pub fn new(mesh: Arc<MeshData>) -> Self {
        Self {
            mesh,
            material: None,
            cast_shadows: true,
        }
    }

    pub fn with_material(mut self, material: Arc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }
}

/// Perspective camera. `fov` is the vertical field of view in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraComponent {
    pub fov: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    pub active: bool,
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near_clip: 0.1,
            far_clip: 1000.0,
            active: false,
        }
    }
}

impl CameraComponent {
    pub fn active() -> Self {
        Self {
            active: true,
            ..Default::default()
        }
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, self.near_clip, self.far_clip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LightType {
    #[default]
    Point,
    Directional,
}

impl LightType {
    /// Tag written into the lighting buffer.
    pub fn tag(self) -> u32 {
        match self {
            LightType::Point => 0,
            LightType::Directional => 1,
        }
    }
}

/// A light source. `position` is ignored for directional lights and
/// `direction` is ignored for point lights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightComponent {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub power: f32,
    pub kind: LightType,
}

impl Default for LightComponent {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            power: 1.0,
            kind: LightType::Point,
        }
    }
}

impl LightComponent {
    pub fn point(position: Vec3, color: Vec3, power: f32) -> Self {
        Self {
            position,
            color,
            power,
            kind: LightType::Point,
            ..Default::default()
        }
    }

    pub fn directional(direction: Vec3, color: Vec3, power: f32) -> Self {
        Self {
            direction,
            color,
            power,
            kind: LightType::Directional,
            ..Default::default()
        }
    }

    pub fn is_directional(&self) -> bool {
        self.kind == LightType::Directional
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_model_matrix_composition_order() {
        let mut transform = TransformComponent::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        transform.scale = Vec3::splat(2.0);

        // Scale first, then rotate, then translate.
        let p = transform.model_matrix().transform_point3(Vec3::X);
        assert_abs_diff_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_basis_vectors() {
        let transform = TransformComponent::default();
        assert_eq!(transform.forward(), Vec3::NEG_Z);
        assert_eq!(transform.right(), Vec3::X);
        assert_eq!(transform.up(), Vec3::Y);
    }

    #[test]
    fn test_euler_yaw_turns_forward() {
        let mut transform = TransformComponent::default();
        transform.set_euler_degrees(Vec3::new(0.0, 90.0, 0.0));
        let forward = transform.forward();
        assert_abs_diff_eq!(forward.x, -1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(forward.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_translate_and_scale() {
        let mut transform = TransformComponent::default();
        transform.translate(Vec3::Y);
        transform.scale_uniform(3.0);
        assert_eq!(transform.position, Vec3::Y);
        assert_eq!(transform.scale, Vec3::splat(3.0));
    }

    #[test]
    fn test_camera_defaults() {
        let camera = CameraComponent::default();
        assert_eq!(camera.fov, 45.0);
        assert_eq!(camera.near_clip, 0.1);
        assert_eq!(camera.far_clip, 1000.0);
        assert!(!camera.active);
    }

    #[test]
    fn test_light_type_tags() {
        assert_eq!(LightType::Point.tag(), 0);
        assert_eq!(LightType::Directional.tag(), 1);
        assert!(LightComponent::directional(Vec3::NEG_Y, Vec3::ONE, 1.0).is_directional());
    }
}
