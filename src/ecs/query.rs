//! Query engine
//!
//! A query joins component tables over the live entity set. Iteration walks
//! live entities in creation order and probes each requested table; an entity
//! missing a required component is skipped without probing the rest. Nothing
//! is cached, so every `iter()` sees the world as it is at that moment.

use std::any::TypeId;
use std::cell::{Ref, RefMut};

use super::component::Component;
use super::error::{EcsError, Result};
use super::registry::TypeKey;
use super::world::World;
use super::Entity;

/// One requested component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryField {
    pub key: TypeKey,
    pub optional: bool,
}

/// Ordered list of requested component types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    fields: Vec<QueryField>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `T`.
    pub fn with<T: Component>(self) -> Self {
        self.field(TypeKey::of::<T>(), false)
    }

    /// Include `T` when present.
    pub fn maybe<T: Component>(self) -> Self {
        self.field(TypeKey::of::<T>(), true)
    }

    pub fn field(mut self, key: TypeKey, optional: bool) -> Self {
        self.fields.push(QueryField { key, optional });
        self
    }

    pub fn fields(&self) -> &[QueryField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn position(&self, type_id: TypeId) -> Option<usize> {
        self.fields.iter().position(|field| field.key.id() == type_id)
    }
}

/// A query bound to a world.
pub struct Query<'w> {
    world: &'w World,
    spec: QuerySpec,
}

impl<'w> Query<'w> {
    pub fn new(world: &'w World, spec: QuerySpec) -> Self {
        Self { world, spec }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Fresh pass over the world, starting from the oldest live entity.
    pub fn iter(&self) -> QueryIter<'w, '_> {
        QueryIter {
            world: self.world,
            spec: &self.spec,
            cursor: None,
            done: false,
        }
    }

    /// Matching entities in creation order.
    pub fn entities(&self) -> Vec<Entity> {
        self.iter().map(|row| row.entity()).collect()
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

impl<'q, 'w> IntoIterator for &'q Query<'w> {
    type Item = Row<'w, 'q>;
    type IntoIter = QueryIter<'w, 'q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct QueryIter<'w, 'q> {
    world: &'w World,
    spec: &'q QuerySpec,
    cursor: Option<Entity>,
    done: bool,
}

impl<'w, 'q> QueryIter<'w, 'q> {
    /// Presence of each field for `entity`, or `None` when a required field
    /// is missing.
    fn probe(&self, entity: Entity) -> Option<Vec<bool>> {
        let mut present = Vec::with_capacity(self.spec.len());
        for field in self.spec.fields() {
            let has = self.world.contains_component(field.key.id(), entity);
            if !has && !field.optional {
                return None;
            }
            present.push(has);
        }
        Some(present)
    }
}

impl<'w, 'q> Iterator for QueryIter<'w, 'q> {
    type Item = Row<'w, 'q>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let Some(entity) = self.world.entities().next_after(self.cursor) else {
                self.done = true;
                return None;
            };
            self.cursor = Some(entity);
            if let Some(present) = self.probe(entity) {
                return Some(Row {
                    world: self.world,
                    spec: self.spec,
                    entity,
                    present,
                });
            }
        }
    }
}

/// One matching entity. Accessors borrow the underlying table for as long as
/// the returned guard lives, so drop guards before advancing the iterator.
pub struct Row<'w, 'q> {
    world: &'w World,
    spec: &'q QuerySpec,
    entity: Entity,
    present: Vec<bool>,
}

impl<'w, 'q> Row<'w, 'q> {
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Whether field `index` was present when the row was produced.
    pub fn is_present(&self, index: usize) -> bool {
        self.present.get(index).copied().unwrap_or(false)
    }

    /// Value of a declared field, `None` when absent or undeclared.
    pub fn get<T: Component>(&self) -> Option<Ref<'w, T>> {
        self.spec.position(TypeId::of::<T>())?;
        self.world.component::<T>(self.entity)
    }

    pub fn get_mut<T: Component>(&self) -> Option<RefMut<'w, T>> {
        self.spec.position(TypeId::of::<T>())?;
        self.world.borrow_component_mut::<T>(self.entity)
    }

    /// Value of a required field.
    pub fn fetch<T: Component>(&self) -> Result<Ref<'w, T>> {
        self.declared::<T>()?;
        self.world
            .component::<T>(self.entity)
            .ok_or_else(|| self.missing::<T>())
    }

    pub fn fetch_mut<T: Component>(&self) -> Result<RefMut<'w, T>> {
        self.declared::<T>()?;
        self.world
            .borrow_component_mut::<T>(self.entity)
            .ok_or_else(|| self.missing::<T>())
    }

    fn declared<T: Component>(&self) -> Result<usize> {
        self.spec
            .position(TypeId::of::<T>())
            .ok_or(EcsError::UndeclaredField {
                component: std::any::type_name::<T>(),
            })
    }

    fn missing<T: Component>(&self) -> EcsError {
        EcsError::MissingComponent {
            entity: self.entity,
            component: std::any::type_name::<T>(),
        }
    }
}
