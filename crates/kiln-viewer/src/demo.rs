//! Built-in demo scene.

use std::sync::Arc;

use glam::Vec3;
use kiln_core::{
    CameraComponent, Image, LightComponent, Material, MeshRendererComponent, Scene,
    TransformComponent, primitives,
};

/// Ground plane, two cubes sharing one mesh and material, a sun, a point
/// light and a camera looking at the origin.
pub fn build_scene() -> Scene {
    let mut scene = Scene::new();

    let ground = Arc::new(primitives::plane(20.0));
    let ground_material = Arc::new(Material::new().with_albedo(Arc::new(Image::solid_rgb([90, 110, 90]))));
    scene
        .spawn_named("ground")
        .with(TransformComponent::default())
        .with(MeshRendererComponent::new(ground).with_material(ground_material))
        .build();

    let cube = Arc::new(primitives::cube(1.0));
    let cube_material = Arc::new(
        Material::new()
            .with_albedo(Arc::new(Image::solid_rgb([200, 90, 40])))
            .with_shininess(64.0),
    );
    for (name, position) in [("cube.left", Vec3::new(-1.5, 0.5, 0.0)), ("cube.right", Vec3::new(1.5, 0.5, 0.0))] {
        let mut transform = TransformComponent::from_position(position);
        transform.set_euler_degrees(Vec3::new(0.0, 30.0, 0.0));
        scene
            .spawn_named(name)
            .with(transform)
            .with(MeshRendererComponent::new(cube.clone()).with_material(cube_material.clone()))
            .build();
    }

    scene
        .spawn_named("sun")
        .with(LightComponent::directional(Vec3::new(-0.4, -1.0, -0.3), Vec3::ONE, 1.0))
        .build();
    scene
        .spawn_named("lamp")
        .with(LightComponent::point(Vec3::new(0.0, 2.5, 2.0), Vec3::new(1.0, 0.85, 0.6), 4.0))
        .build();

    let mut camera = TransformComponent::from_position(Vec3::new(0.0, 4.0, 8.0));
    camera.set_euler_degrees(Vec3::new(-25.0, 0.0, 0.0));
    scene
        .spawn_named("camera")
        .with(camera)
        .with(CameraComponent::active())
        .build();

    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_contents() {
        let scene = build_scene();
        assert!(scene.active_camera().is_some());
        assert_eq!(scene.lights().count(), 2);
        assert_eq!(scene.lights().filter(|l| l.is_directional()).count(), 1);

        let renderables: Vec<_> = scene.renderables().collect();
        assert_eq!(renderables.len(), 3);
        assert_eq!(
            renderables[1].mesh_renderer.mesh.id(),
            renderables[2].mesh_renderer.mesh.id()
        );
    }
}
