//! Per-component value storage
//!
//! Two interchangeable backends: `DenseStorage` keeps a vector of slots indexed
//! by entity, `SparseStorage` keeps a hash map. Both report absence as `None`
//! and never hold an empty slot as a value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Which backend a component table uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Dense,
    Sparse,
}

impl StorageKind {
    pub fn build<T: 'static>(self) -> Box<dyn Storage<T>> {
        match self {
            StorageKind::Dense => Box::new(DenseStorage::new()),
            StorageKind::Sparse => Box::new(SparseStorage::new()),
        }
    }
}

/// Slot storage contract shared by both backends.
pub trait Storage<T> {
    /// Value at `index`, or `None` for negative, out-of-range or empty slots.
    fn get(&self, index: i64) -> Option<&T>;

    fn get_mut(&mut self, index: i64) -> Option<&mut T>;

    /// Slot-level write. An empty slot is refused with `NullValue`; removal
    /// goes through `delete`.
    fn put(&mut self, index: i64, slot: Option<T>) -> Result<(), StorageError>;

    /// Clear the slot at `index` and hand back what it held.
    fn delete(&mut self, index: i64) -> Result<Option<T>, StorageError>;

    /// Number of occupied slots.
    fn len(&self) -> usize;

    /// Occupied indices in ascending order.
    fn indices(&self) -> Vec<i64>;

    fn kind(&self) -> StorageKind;

    /// Insert or overwrite the value at `index`.
    fn set(&mut self, index: i64, value: T) -> Result<(), StorageError> {
        self.put(index, Some(value))
    }

    fn contains(&self, index: i64) -> bool {
        self.get(index).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_index(index: i64) -> Result<usize, StorageError> {
    usize::try_from(index).map_err(|_| StorageError::InvalidIndex(index))
}

/// Vector-backed storage, suited to components most entities carry.
#[derive(Debug)]
pub struct DenseStorage<T> {
    slots: Vec<Option<T>>,
    occupied: usize,
}

impl<T> DenseStorage<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
        }
    }

    /// Length of the backing vector, empty slots included.
    pub fn capacity_slots(&self) -> usize {
        self.slots.len()
    }
}

impl<T> Default for DenseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> for DenseStorage<T> {
    fn get(&self, index: i64) -> Option<&T> {
        let index = usize::try_from(index).ok()?;
        self.slots.get(index)?.as_ref()
    }

    fn get_mut(&mut self, index: i64) -> Option<&mut T> {
        let index = usize::try_from(index).ok()?;
        self.slots.get_mut(index)?.as_mut()
    }

    fn put(&mut self, index: i64, slot: Option<T>) -> Result<(), StorageError> {
        let index = check_index(index)?;
        let value = slot.ok_or(StorageError::NullValue)?;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        if self.slots[index].replace(value).is_none() {
            self.occupied += 1;
        }
        Ok(())
    }

    fn delete(&mut self, index: i64) -> Result<Option<T>, StorageError> {
        let index = check_index(index)?;
        let removed = self.slots.get_mut(index).and_then(Option::take);
        if removed.is_some() {
            self.occupied -= 1;
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.occupied
    }

    fn indices(&self) -> Vec<i64> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .filter_map(|(index, _)| i64::try_from(index).ok())
            .collect()
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Dense
    }
}

/// Map-backed storage, suited to rare components.
#[derive(Debug)]
pub struct SparseStorage<T> {
    items: HashMap<i64, T>,
}

impl<T> SparseStorage<T> {
    pub fn new() -> Self {
        Self {
            items: HashMap::new(),
        }
    }
}

impl<T> Default for SparseStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Storage<T> for SparseStorage<T> {
    fn get(&self, index: i64) -> Option<&T> {
        self.items.get(&index)
    }

    fn get_mut(&mut self, index: i64) -> Option<&mut T> {
        self.items.get_mut(&index)
    }

    fn put(&mut self, index: i64, slot: Option<T>) -> Result<(), StorageError> {
        check_index(index)?;
        let value = slot.ok_or(StorageError::NullValue)?;
        self.items.insert(index, value);
        Ok(())
    }

    fn delete(&mut self, index: i64) -> Result<Option<T>, StorageError> {
        check_index(index)?;
        Ok(self.items.remove(&index))
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn indices(&self) -> Vec<i64> {
        let mut indices: Vec<i64> = self.items.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Sparse
    }
}
