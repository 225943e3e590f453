//! World - central ECS container

use std::any::TypeId;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::time::Duration;

use super::component::{Bundle, Component, ComponentTable, Table};
use super::entity::EntityRegistry;
use super::error::{EcsError, Result};
use super::query::{Query, QuerySpec};
use super::registry::{TypeKey, TypeRegistry};
use super::resource::{Resource, Resources};
use super::storage::StorageKind;
use super::system::System;
use super::Entity;
use crate::config::WorldConfig;
use crate::scheduler::{RunReport, Scheduler};

/// World holds all entities, components, resources and systems
pub struct World {
    entities: EntityRegistry,
    tables: HashMap<TypeId, RefCell<Box<dyn ComponentTable>>>,
    resources: Resources,
    registry: TypeRegistry,
    scheduler: Scheduler,
    config: WorldConfig,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityRegistry::new(),
            tables: HashMap::new(),
            resources: Resources::new(),
            registry: TypeRegistry::new(),
            scheduler: Scheduler::new(config.stats_history),
            config,
        }
    }

    /// Register systems, in the order they should run.
    pub fn with_systems<I>(mut self, systems: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn System>>,
    {
        for system in systems {
            self.scheduler.add_system(system);
        }
        self
    }

    pub fn add_system(&mut self, system: impl System + 'static) {
        self.scheduler.add_system(Box::new(system));
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.scheduler.system_names()
    }

    /// Run every system once, in registration order.
    pub fn run(&mut self) -> Result<RunReport> {
        let mut scheduler = std::mem::take(&mut self.scheduler);
        let result = scheduler.run(self);
        self.scheduler = scheduler;
        result
    }

    /// Number of completed runs
    pub fn tick(&self) -> u64 {
        self.scheduler.tick_count()
    }

    pub fn recent_stats(&self) -> impl Iterator<Item = &RunReport> {
        self.scheduler.recent_stats()
    }

    pub fn average_run_time(&self) -> Option<Duration> {
        self.scheduler.average_run_time()
    }

    /// Make `T` resolvable by its short name and pin its storage backend.
    /// Must happen before the first `T` is stored to affect the backend.
    pub fn register_component<T: Component>(&mut self, kind: StorageKind) {
        let key = TypeKey::of::<T>();
        self.register_component_as::<T>(key.name(), kind);
    }

    pub fn register_component_as<T: Component>(&mut self, name: &str, kind: StorageKind) {
        let key = TypeKey::of::<T>();
        self.registry.add_component(name, key);
        self.registry.set_storage(key, kind);
        if let Some(table) = self.tables.get(&key.id()) {
            let current = table.borrow().kind();
            if current != kind {
                log::warn!("{name} already stored as {current:?}; keeping it");
            }
        }
    }

    pub fn register_resource<R: Resource>(&mut self) {
        let key = TypeKey::of::<R>();
        self.registry.add_resource(key.name(), key);
    }

    /// Create a new entity carrying `bundle`
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> Result<Entity> {
        let entity = self.entities.create()?;
        bundle.insert_into(self, entity)?;
        Ok(entity)
    }

    pub(crate) fn activate_entity(&mut self, entity: Entity) {
        if !self.entities.activate(entity) {
            log::warn!("entity {entity} was not reserved or is already live");
        }
    }

    /// Destroy an entity and remove all its components. Unknown entities are
    /// ignored.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.destroy(entity) {
            return false;
        }
        for table in self.tables.values_mut() {
            table.get_mut().remove_entity(entity);
        }
        true
    }

    /// Check if entity is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Get number of alive entities
    pub fn entity_count(&self) -> usize {
        self.entities.count()
    }

    /// Add a component to an entity, replacing any previous value of the
    /// same type
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::NoSuchEntity(entity));
        }

        let key = TypeKey::of::<T>();
        if !self.tables.contains_key(&key.id()) {
            let kind = self.storage_kind_for(key);
            if self.registry.component(key.name()).is_none() {
                self.registry.add_component(key.name(), key);
            }
            log::debug!("creating {kind:?} table for {key}");
            let table: Box<dyn ComponentTable> = Box::new(Table::<T>::new(kind));
            self.tables.insert(key.id(), RefCell::new(table));
        }

        if let Some(table) = self.table_mut::<T>() {
            table.insert(entity, component)?;
        }
        Ok(())
    }

    /// Remove a component, returning it. Missing components are ignored.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        match self.table_mut::<T>()?.remove(entity) {
            Ok(removed) => removed,
            Err(err) => {
                log::warn!("failed to remove component from {entity}: {err}");
                None
            }
        }
    }

    /// Get a component from an entity
    pub fn component<T: Component>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        let cell = self.tables.get(&TypeId::of::<T>())?;
        Ref::filter_map(cell.borrow(), |table| {
            table.as_any().downcast_ref::<Table<T>>()?.get(entity)
        })
        .ok()
    }

    /// Get a mutable component from an entity
    pub fn component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.table_mut::<T>()?.get_mut(entity)
    }

    pub(crate) fn borrow_component_mut<T: Component>(
        &self,
        entity: Entity,
    ) -> Option<RefMut<'_, T>> {
        let cell = self.tables.get(&TypeId::of::<T>())?;
        RefMut::filter_map(cell.borrow_mut(), |table| {
            table.as_any_mut().downcast_mut::<Table<T>>()?.get_mut(entity)
        })
        .ok()
    }

    /// Check if entity has a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.contains_component(TypeId::of::<T>(), entity)
    }

    pub(crate) fn contains_component(&self, type_id: TypeId, entity: Entity) -> bool {
        self.tables
            .get(&type_id)
            .map_or(false, |table| table.borrow().contains(entity))
    }

    /// Number of entities carrying `T`
    pub fn component_count<T: Component>(&self) -> usize {
        self.tables
            .get(&TypeId::of::<T>())
            .map_or(0, |table| table.borrow().len())
    }

    /// Backend chosen for `T`, once a `T` has been stored
    pub fn storage_kind<T: Component>(&self) -> Option<StorageKind> {
        self.tables
            .get(&TypeId::of::<T>())
            .map(|table| table.borrow().kind())
    }

    /// Store a resource, replacing and returning any previous value of the
    /// same type
    pub fn add_resource<R: Resource>(&mut self, resource: R) -> Option<R> {
        let key = TypeKey::of::<R>();
        if self.registry.resource(key.name()).is_none() {
            self.registry.add_resource(key.name(), key);
        }
        self.resources.insert(resource)
    }

    pub fn get_resource<R: Resource>(&self) -> Option<Ref<'_, R>> {
        self.resources.get::<R>()
    }

    /// The stored resource, or `default` when none is registered
    pub fn get_resource_or<R: Resource + Clone>(&self, default: R) -> R {
        self.resources.get_or(default)
    }

    pub fn resource_mut<R: Resource>(&mut self) -> Option<RefMut<'_, R>> {
        self.resources.get_mut::<R>()
    }

    pub fn has_resource<R: Resource>(&self) -> bool {
        self.resources.contains::<R>()
    }

    pub fn remove_resource<R: Resource>(&mut self) -> Option<R> {
        self.resources.remove::<R>()
    }

    /// Fresh query over the current state of the world
    pub fn query(&self, spec: QuerySpec) -> Query<'_> {
        Query::new(self, spec)
    }

    fn table_mut<T: Component>(&mut self) -> Option<&mut Table<T>> {
        self.tables
            .get_mut(&TypeId::of::<T>())?
            .get_mut()
            .as_any_mut()
            .downcast_mut::<Table<T>>()
    }

    fn storage_kind_for(&self, key: TypeKey) -> StorageKind {
        self.registry
            .storage(key)
            .unwrap_or_else(|| self.config.storage_for(key.name()))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::system::SystemBuilder;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }
    impl Component for Velocity {}

    #[derive(Debug, Clone, PartialEq)]
    struct Level(u32);
    impl Resource for Level {}
    impl Component for Level {}

    #[test]
    fn test_world_entity_lifecycle() {
        let mut world = World::new();

        let e1 = world.create_entity(()).unwrap();
        let e2 = world.create_entity(()).unwrap();

        assert!(world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert_eq!(world.entity_count(), 2);

        assert!(world.destroy_entity(e1));
        assert!(!world.destroy_entity(e1));
        assert!(!world.is_alive(e1));
        assert!(world.is_alive(e2));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_world_components() {
        let mut world = World::new();

        let entity = world.create_entity(()).unwrap();
        world.add_component(entity, Position { x: 1.0, y: 2.0 }).unwrap();
        world.add_component(entity, Velocity { dx: 0.5, dy: 0.5 }).unwrap();

        assert!(world.has_component::<Position>(entity));
        assert!(world.has_component::<Velocity>(entity));

        let pos = world.component::<Position>(entity).unwrap();
        assert_eq!(pos.x, 1.0);
        drop(pos);

        if let Some(vel) = world.component_mut::<Velocity>(entity) {
            vel.dx = 1.0;
        }

        let vel = world.component::<Velocity>(entity).unwrap();
        assert_eq!(vel.dx, 1.0);
    }

    #[test]
    fn test_destroy_strips_components() {
        let mut world = World::new();
        let entity = world
            .create_entity((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 1.0 }))
            .unwrap();

        world.destroy_entity(entity);
        assert!(!world.has_component::<Position>(entity));
        assert_eq!(world.component_count::<Velocity>(), 0);
        assert!(matches!(
            world.add_component(entity, Position { x: 1.0, y: 1.0 }),
            Err(EcsError::NoSuchEntity(e)) if e == entity
        ));
    }

    #[test]
    fn test_remove_component_is_lenient() {
        let mut world = World::new();
        let entity = world.create_entity((Position { x: 3.0, y: 4.0 },)).unwrap();

        assert_eq!(
            world.remove_component::<Position>(entity),
            Some(Position { x: 3.0, y: 4.0 })
        );
        assert_eq!(world.remove_component::<Position>(entity), None);
        assert_eq!(world.remove_component::<Velocity>(entity), None);
        assert!(world.is_alive(entity));
    }

    #[test]
    fn test_storage_kind_selection() {
        let mut config = WorldConfig::default();
        config.storage.insert("Velocity".into(), StorageKind::Sparse);
        let mut world = World::with_config(config);
        world.register_component::<Level>(StorageKind::Sparse);

        let entity = world
            .create_entity((Position { x: 0.0, y: 0.0 }, Velocity { dx: 0.0, dy: 0.0 }, Level(1)))
            .unwrap();
        assert!(world.is_alive(entity));
        assert_eq!(world.storage_kind::<Position>(), Some(StorageKind::Dense));
        assert_eq!(world.storage_kind::<Velocity>(), Some(StorageKind::Sparse));
        assert_eq!(world.storage_kind::<Level>(), Some(StorageKind::Sparse));
        assert!(world.registry().component("Position").is_some());
    }

    #[test]
    fn test_resources_override() {
        let mut world = World::new();
        assert_eq!(world.add_resource(Level(1)), None);
        assert_eq!(world.add_resource(Level(2)), Some(Level(1)));
        assert_eq!(*world.get_resource::<Level>().unwrap(), Level(2));
        assert_eq!(world.resources().len(), 1);

        if let Some(mut level) = world.resource_mut::<Level>() {
            level.0 = 7;
        }
        assert_eq!(world.get_resource_or(Level(0)), Level(7));
        assert_eq!(world.remove_resource::<Level>(), Some(Level(7)));
        assert_eq!(world.get_resource_or(Level(0)), Level(0));
        assert!(!world.has_resource::<Level>());
    }

    #[test]
    fn test_run_restores_systems() {
        let mut world = World::new();
        world.add_system(SystemBuilder::new("noop").build(|_| Ok(())));
        world.add_system(SystemBuilder::new("also_noop").build(|_| Ok(())));

        world.run().unwrap();
        world.run().unwrap();
        assert_eq!(world.tick(), 2);
        assert_eq!(world.system_names(), vec!["noop", "also_noop"]);
        assert_eq!(world.recent_stats().count(), 2);
    }
}
