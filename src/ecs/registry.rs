//! Name → type lookup for components and resources
//!
//! Textual system declarations name types by their short Rust name
//! (`Position`, not `my_game::components::Position`). Every component and
//! resource that passes through the world is recorded here.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use super::storage::StorageKind;

/// Stable identifier of a component or resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name::<T>(),
        }
    }

    /// Key for a component name nothing has been stored under yet. No table
    /// ever holds it, so a required field on it matches no entity and an
    /// optional one is always absent.
    pub fn unregistered() -> Self {
        Self::of::<Unregistered>()
    }

    pub fn is_unregistered(&self) -> bool {
        self.id == TypeId::of::<Unregistered>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

struct Unregistered;

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// `a::b::Foo<c::Bar>` → `Foo`
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    components: HashMap<String, TypeKey>,
    resources: HashMap<String, TypeKey>,
    storage: HashMap<TypeId, StorageKind>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a component type under `name`. Re-registering a name for a
    /// different type replaces the old mapping.
    pub fn add_component(&mut self, name: &str, key: TypeKey) {
        if let Some(previous) = self.components.insert(name.to_string(), key) {
            if previous.id != key.id {
                log::warn!("component name '{name}' now refers to a different type");
            }
        }
    }

    pub fn add_resource(&mut self, name: &str, key: TypeKey) {
        if let Some(previous) = self.resources.insert(name.to_string(), key) {
            if previous.id != key.id {
                log::warn!("resource name '{name}' now refers to a different type");
            }
        }
    }

    /// Pin the storage backend for a component type.
    pub fn set_storage(&mut self, key: TypeKey, kind: StorageKind) {
        self.storage.insert(key.id, kind);
    }

    pub fn storage(&self, key: TypeKey) -> Option<StorageKind> {
        self.storage.get(&key.id).copied()
    }

    pub fn component(&self, name: &str) -> Option<TypeKey> {
        self.components.get(name).copied()
    }

    pub fn resource(&self, name: &str) -> Option<TypeKey> {
        self.resources.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        pub struct Marker;
        pub struct Wrapper<T>(pub T);
    }

    #[test]
    fn test_short_names() {
        assert_eq!(short_type_name::<nested::Marker>(), "Marker");
        assert_eq!(short_type_name::<nested::Wrapper<nested::Marker>>(), "Wrapper");
        assert_eq!(short_type_name::<u32>(), "u32");
    }

    #[test]
    fn test_lookup_by_name() {
        let mut registry = TypeRegistry::new();
        let key = TypeKey::of::<nested::Marker>();
        registry.add_component("Marker", key);

        assert_eq!(registry.component("Marker"), Some(key));
        assert_eq!(registry.resource("Marker"), None);
        assert_eq!(registry.storage(key), None);

        registry.set_storage(key, StorageKind::Sparse);
        assert_eq!(registry.storage(key), Some(StorageKind::Sparse));
    }

    #[test]
    fn test_unregistered_key_is_distinct() {
        let key = TypeKey::unregistered();
        assert!(key.is_unregistered());
        assert!(!TypeKey::of::<nested::Marker>().is_unregistered());
        assert_eq!(key, TypeKey::unregistered());
    }
}
