//! Entity management

use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Bound;

use serde::Serialize;

use super::error::{EcsError, Result};

/// Entity ID type - simple numeric ID
pub type EntityId = u32;

/// Opaque entity handle. Identifiers are handed out in increasing order and
/// never recycled, so ordering by id is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Entity(EntityId);

impl Entity {
    pub fn id(self) -> EntityId {
        self.0
    }

    /// Storage slot index for this entity.
    pub fn index(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Entity allocator
///
/// The id counter is a `Cell` so that identifiers can be reserved through a
/// shared borrow while systems are running.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    next_id: Cell<EntityId>,
    alive: BTreeSet<Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next identifier and mark it live.
    pub fn create(&mut self) -> Result<Entity> {
        let entity = self.reserve()?;
        self.alive.insert(entity);
        Ok(entity)
    }

    /// Allocate the next identifier without marking it live.
    pub fn reserve(&self) -> Result<Entity> {
        let id = self.next_id.get();
        let next = id.checked_add(1).ok_or(EcsError::EntityIdsExhausted)?;
        self.next_id.set(next);
        Ok(Entity(id))
    }

    /// Mark a previously reserved identifier live. Returns false for ids that
    /// were never handed out or are already live.
    pub fn activate(&mut self, entity: Entity) -> bool {
        if entity.0 >= self.next_id.get() {
            return false;
        }
        self.alive.insert(entity)
    }

    /// Remove an entity from the live set. Unknown entities are ignored.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.alive.remove(&entity)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    pub fn count(&self) -> usize {
        self.alive.len()
    }

    /// Live entities in creation order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }

    /// First live entity created after `after`, or the first live entity
    /// overall when `after` is `None`.
    pub fn next_after(&self, after: Option<Entity>) -> Option<Entity> {
        let lower = match after {
            Some(entity) => Bound::Excluded(entity),
            None => Bound::Unbounded,
        };
        self.alive.range((lower, Bound::Unbounded)).next().copied()
    }
}
