//! Component tables
//!
//! A `Table<T>` owns one boxed storage backend; the world keeps tables behind
//! the type-erased `ComponentTable` trait and downcasts at the boundary.

use std::any::Any;

use super::error::Result;
use super::storage::{Storage, StorageKind};
use super::world::World;
use super::Entity;

/// Trait for components
pub trait Component: 'static {}

/// Type-erased view of a component table.
pub trait ComponentTable: Any {
    fn contains(&self, entity: Entity) -> bool;
    /// Drop the entity's value, if any.
    fn remove_entity(&mut self, entity: Entity);
    fn len(&self) -> usize;
    fn kind(&self) -> StorageKind;
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Concrete table for a specific component type
pub struct Table<T: Component> {
    storage: Box<dyn Storage<T>>,
}

impl<T: Component> Table<T> {
    pub fn new(kind: StorageKind) -> Self {
        Self {
            storage: kind.build(),
        }
    }

    pub fn insert(&mut self, entity: Entity, component: T) -> Result<()> {
        self.storage.set(entity.index(), component)?;
        Ok(())
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.storage.get(entity.index())
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.storage.get_mut(entity.index())
    }

    pub fn remove(&mut self, entity: Entity) -> Result<Option<T>> {
        Ok(self.storage.delete(entity.index())?)
    }
}

impl<T: Component> ComponentTable for Table<T> {
    fn contains(&self, entity: Entity) -> bool {
        self.storage.contains(entity.index())
    }

    fn remove_entity(&mut self, entity: Entity) {
        if let Err(err) = self.storage.delete(entity.index()) {
            log::warn!("failed to clear {} for {entity}: {err}", self.component_name());
        }
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn kind(&self) -> StorageKind {
        self.storage.kind()
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A set of components attached to one entity in a single call.
pub trait Bundle: 'static {
    fn insert_into(self, world: &mut World, entity: Entity) -> Result<()>;
}

impl Bundle for () {
    fn insert_into(self, _world: &mut World, _entity: Entity) -> Result<()> {
        Ok(())
    }
}

macro_rules! impl_bundle {
    ($($name:ident),+) => {
        impl<$($name: Component),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn insert_into(self, world: &mut World, entity: Entity) -> Result<()> {
                let ($($name,)+) = self;
                $(world.add_component(entity, $name)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    impl Component for Position {}

    #[test]
    fn test_table_round_trip() {
        for kind in [StorageKind::Dense, StorageKind::Sparse] {
            let mut world = World::new();
            let e1 = world.create_entity(()).unwrap();
            let e2 = world.create_entity(()).unwrap();

            let mut table = Table::<Position>::new(kind);
            table.insert(e1, Position { x: 1.0, y: 2.0 }).unwrap();
            table.insert(e2, Position { x: 3.0, y: 4.0 }).unwrap();

            assert_eq!(table.len(), 2);
            assert_eq!(table.kind(), kind);
            assert!(table.contains(e1));

            if let Some(pos) = table.get_mut(e1) {
                pos.x += 1.0;
            }
            assert_eq!(table.get(e1), Some(&Position { x: 2.0, y: 2.0 }));

            table.remove_entity(e1);
            assert!(!table.contains(e1));
            assert_eq!(table.remove(e2).unwrap(), Some(Position { x: 3.0, y: 4.0 }));
            assert!(table.is_empty());
        }
    }

    #[test]
    fn test_erased_downcast() {
        let table: Box<dyn ComponentTable> = Box::new(Table::<Position>::new(StorageKind::Sparse));
        assert!(table.as_any().downcast_ref::<Table<Position>>().is_some());
        assert!(table.component_name().ends_with("Position"));
    }
}
