//! Columnar entity store.
//!
//! Entities are keys of a [`SlotMap`]; each component kind lives in its own
//! [`SecondaryMap`] column keyed by them. Keys carry a version, so handles to
//! despawned entities stop resolving once their slot is reused. Queries
//! visit entities in slot order.

use slotmap::{SecondaryMap, SlotMap, new_key_type};

use crate::components::{
    CameraComponent, LightComponent, MeshRendererComponent, NameComponent, TransformComponent,
};

new_key_type! {
    /// Handle to an entity in a [`Scene`].
    pub struct Entity;
}

/// Components that can be stored in a [`Scene`].
pub trait Component: Sized + 'static {
    fn column(scene: &Scene) -> &SecondaryMap<Entity, Self>;
    fn column_mut(scene: &mut Scene) -> &mut SecondaryMap<Entity, Self>;
}

macro_rules! impl_component {
    ($ty:ty, $field:ident) => {
        impl Component for $ty {
            fn column(scene: &Scene) -> &SecondaryMap<Entity, Self> {
                &scene.$field
            }

            fn column_mut(scene: &mut Scene) -> &mut SecondaryMap<Entity, Self> {
                &mut scene.$field
            }
        }
    };
}

impl_component!(NameComponent, names);
impl_component!(TransformComponent, transforms);
impl_component!(MeshRendererComponent, mesh_renderers);
impl_component!(CameraComponent, cameras);
impl_component!(LightComponent, lights);

/// An entity with both a mesh renderer and a transform.
#[derive(Debug, Clone, Copy)]
pub struct Renderable<'a> {
    pub entity: Entity,
    pub transform: &'a TransformComponent,
    pub mesh_renderer: &'a MeshRendererComponent,
}

/// The active camera and its placement.
#[derive(Debug, Clone, Copy)]
pub struct ActiveCamera<'a> {
    pub entity: Entity,
    pub camera: &'a CameraComponent,
    pub transform: &'a TransformComponent,
}

#[derive(Debug, Default)]
pub struct Scene {
    entities: SlotMap<Entity, ()>,
    names: SecondaryMap<Entity, NameComponent>,
    transforms: SecondaryMap<Entity, TransformComponent>,
    mesh_renderers: SecondaryMap<Entity, MeshRendererComponent>,
    cameras: SecondaryMap<Entity, CameraComponent>,
    lights: SecondaryMap<Entity, LightComponent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty entity, reusing a freed slot if any.
    pub fn spawn(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Spawns an entity with a name, returning a builder for its components.
    pub fn spawn_named(&mut self, name: impl Into<String>) -> EntityBuilder<'_> {
        let entity = self.spawn();
        self.insert(entity, NameComponent::new(name));
        EntityBuilder {
            scene: self,
            entity,
        }
    }

    /// Removes an entity and all its components. Returns false if the
    /// handle was already stale.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }
        self.names.remove(entity);
        self.transforms.remove(entity);
        self.mesh_renderers.remove(entity);
        self.cameras.remove(entity);
        self.lights.remove(entity);
        true
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Attaches (or replaces) a component. Ignored for stale handles.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) {
        if self.contains(entity) {
            C::column_mut(self).insert(entity, component);
        }
    }

    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        C::column_mut(self).remove(entity)
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        C::column(self).get(entity)
    }

    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        C::column_mut(self).get_mut(entity)
    }

    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.get::<C>(entity).is_some()
    }

    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.get::<NameComponent>(entity).map(NameComponent::as_str)
    }

    /// Live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys()
    }

    /// Every entity carrying component `C`, in slot order.
    pub fn query<C: Component>(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        C::column(self).iter()
    }

    /// First entity whose camera is flagged active and which has a transform.
    pub fn active_camera(&self) -> Option<ActiveCamera<'_>> {
        self.query::<CameraComponent>()
            .filter(|(_, camera)| camera.active)
            .find_map(|(entity, camera)| {
                self.get::<TransformComponent>(entity)
                    .map(|transform| ActiveCamera {
                        entity,
                        camera,
                        transform,
                    })
            })
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightComponent> + '_ {
        self.query::<LightComponent>().map(|(_, light)| light)
    }

    pub fn mesh_renderers(&self) -> impl Iterator<Item = (Entity, &MeshRendererComponent)> + '_ {
        self.query::<MeshRendererComponent>()
    }

    /// Entities with both a mesh renderer and a transform.
    pub fn renderables(&self) -> impl Iterator<Item = Renderable<'_>> + '_ {
        self.mesh_renderers().filter_map(|(entity, mesh_renderer)| {
            self.get::<TransformComponent>(entity)
                .map(|transform| Renderable {
                    entity,
                    transform,
                    mesh_renderer,
                })
        })
    }
}

/// Chained component insertion for a freshly spawned entity.
pub struct EntityBuilder<'a> {
    scene: &'a mut Scene,
    entity: Entity,
}

impl EntityBuilder<'_> {
    pub fn with<C: Component>(self, component: C) -> Self {
        self.scene.insert(self.entity, component);
        self
    }

    pub fn id(&self) -> Entity {
        self.entity
    }

    pub fn build(self) -> Entity {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::primitives;

    #[test]
    fn test_spawn_and_get() {
        let mut scene = Scene::new();
        let e = scene
            .spawn_named("box")
            .with(TransformComponent::from_position(Vec3::X))
            .build();

        assert_eq!(scene.name(e), Some("box"));
        assert_eq!(
            scene.get::<TransformComponent>(e).map(|t| t.position),
            Some(Vec3::X)
        );
        assert!(!scene.has::<CameraComponent>(e));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_despawn_invalidates_handle_and_reuses_slot() {
        let mut scene = Scene::new();
        let a = scene.spawn();
        scene.insert(a, LightComponent::default());
        assert!(scene.despawn(a));
        assert!(!scene.despawn(a));

        let b = scene.spawn();
        assert_ne!(a, b);
        assert!(!scene.contains(a));
        assert!(scene.contains(b));
        assert!(scene.get::<LightComponent>(b).is_none());

        scene.insert(a, LightComponent::default());
        assert_eq!(scene.lights().count(), 0);
        assert!(scene.remove::<LightComponent>(a).is_none());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_reused_slot_keeps_iteration_position() {
        let mut scene = Scene::new();
        let first = scene.spawn();
        let second = scene.spawn();
        scene.insert(second, LightComponent::point(Vec3::ZERO, Vec3::ONE, 2.0));
        scene.despawn(first);

        let reused = scene.spawn();
        scene.insert(reused, LightComponent::point(Vec3::ZERO, Vec3::ONE, 1.0));

        let order: Vec<Entity> = scene.entities().collect();
        assert_eq!(order, vec![reused, second]);
        let powers: Vec<f32> = scene.lights().map(|l| l.power).collect();
        assert_eq!(powers, vec![1.0, 2.0]);
    }

    #[test]
    fn test_active_camera_is_first_active_with_transform() {
        let mut scene = Scene::new();
        scene.spawn_named("inactive").with(CameraComponent::default()).with(TransformComponent::default());
        scene.spawn_named("no transform").with(CameraComponent::active());
        let expected = scene
            .spawn_named("main")
            .with(CameraComponent::active())
            .with(TransformComponent::default())
            .build();
        scene.spawn_named("second").with(CameraComponent::active()).with(TransformComponent::default());

        let active = scene.active_camera().map(|c| c.entity);
        assert_eq!(active, Some(expected));
    }

    #[test]
    fn test_renderables_require_transform() {
        let mut scene = Scene::new();
        let mesh = Arc::new(primitives::cube(1.0));
        scene
            .spawn_named("a")
            .with(MeshRendererComponent::new(mesh.clone()))
            .with(TransformComponent::default());
        scene
            .spawn_named("b")
            .with(MeshRendererComponent::new(mesh));

        assert_eq!(scene.mesh_renderers().count(), 2);
        assert_eq!(scene.renderables().count(), 1);
    }

    #[test]
    fn test_queries_follow_slot_order() {
        let mut scene = Scene::new();
        let first = scene.spawn();
        let second = scene.spawn();
        scene.insert(second, LightComponent::point(Vec3::ZERO, Vec3::ONE, 2.0));
        scene.insert(first, LightComponent::point(Vec3::ZERO, Vec3::ONE, 1.0));

        let powers: Vec<f32> = scene.lights().map(|l| l.power).collect();
        assert_eq!(powers, vec![1.0, 2.0]);
    }
}
