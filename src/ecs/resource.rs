//! Singleton resource store

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;

/// Trait for resources
pub trait Resource: 'static {}

/// At most one value per resource type.
#[derive(Default)]
pub struct Resources {
    values: HashMap<TypeId, RefCell<Box<dyn Any>>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `resource`, handing back the value it replaces.
    pub fn insert<R: Resource>(&mut self, resource: R) -> Option<R> {
        let value: Box<dyn Any> = Box::new(resource);
        let previous = self.values.insert(TypeId::of::<R>(), RefCell::new(value))?;
        previous.into_inner().downcast::<R>().ok().map(|boxed| *boxed)
    }

    pub fn get<R: Resource>(&self) -> Option<Ref<'_, R>> {
        let cell = self.values.get(&TypeId::of::<R>())?;
        Ref::filter_map(cell.borrow(), |value| value.downcast_ref::<R>()).ok()
    }

    pub fn get_mut<R: Resource>(&self) -> Option<RefMut<'_, R>> {
        let cell = self.values.get(&TypeId::of::<R>())?;
        RefMut::filter_map(cell.borrow_mut(), |value| value.downcast_mut::<R>()).ok()
    }

    /// The stored value, or `default` when none is registered.
    pub fn get_or<R: Resource + Clone>(&self, default: R) -> R {
        match self.get::<R>() {
            Some(value) => value.clone(),
            None => default,
        }
    }

    pub fn contains<R: Resource>(&self) -> bool {
        self.contains_type(TypeId::of::<R>())
    }

    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.values.contains_key(&type_id)
    }

    pub fn remove<R: Resource>(&mut self) -> Option<R> {
        let cell = self.values.remove(&TypeId::of::<R>())?;
        cell.into_inner().downcast::<R>().ok().map(|boxed| *boxed)
    }

    pub(crate) fn cell(&self, type_id: TypeId) -> Option<&RefCell<Box<dyn Any>>> {
        self.values.get(&type_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Score(u32);
    impl Resource for Score {}

    #[derive(Debug, Clone, PartialEq)]
    struct Gravity(f32);
    impl Resource for Gravity {}

    #[test]
    fn test_insert_replaces_previous() {
        let mut resources = Resources::new();
        assert_eq!(resources.insert(Score(1)), None);
        assert_eq!(resources.insert(Score(2)), Some(Score(1)));

        assert_eq!(resources.len(), 1);
        assert_eq!(*resources.get::<Score>().unwrap(), Score(2));
    }

    #[test]
    fn test_get_or_default() {
        let mut resources = Resources::new();
        assert_eq!(resources.get_or(Gravity(9.81)), Gravity(9.81));
        resources.insert(Gravity(1.6));
        assert_eq!(resources.get_or(Gravity(9.81)), Gravity(1.6));
    }

    #[test]
    fn test_mutate_and_remove() {
        let mut resources = Resources::new();
        resources.insert(Score(10));
        if let Some(mut score) = resources.get_mut::<Score>() {
            score.0 += 5;
        }
        assert_eq!(resources.remove::<Score>(), Some(Score(15)));
        assert_eq!(resources.remove::<Score>(), None);
        assert!(!resources.contains::<Score>());
        assert!(resources.is_empty());
    }
}
