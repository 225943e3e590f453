//! Per-run argument binding

use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};

use crate::ecs::command::{CommandQueue, Commands};
use crate::ecs::error::{EcsError, Result};
use crate::ecs::query::Query;
use crate::ecs::registry::{short_type_name, TypeKey};
use crate::ecs::resource::Resource;
use crate::ecs::world::World;

use super::param::{ParamDecl, ParamShape};

/// One bound parameter.
pub enum Arg<'w> {
    Commands,
    Resource {
        key: TypeKey,
        cell: Option<&'w RefCell<Box<dyn Any>>>,
    },
    /// Optional resource declared by a name nothing is registered under
    UnknownResource { name: String },
    Query(Query<'w>),
}

/// Positional arguments for one system invocation.
///
/// Every `Commands` parameter shares one queue; it is applied after the
/// system returns.
pub struct Args<'w> {
    params: Vec<Arg<'w>>,
    commands: Commands<'w>,
}

impl<'w> Args<'w> {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg<'w>> {
        self.params.get(index)
    }

    pub fn query(&self, index: usize) -> Result<&Query<'w>> {
        match self.params.get(index) {
            Some(Arg::Query(query)) => Ok(query),
            _ => Err(mismatch(index, "a query")),
        }
    }

    pub fn commands(&self, index: usize) -> Result<&Commands<'w>> {
        match self.params.get(index) {
            Some(Arg::Commands) => Ok(&self.commands),
            _ => Err(mismatch(index, "a command handle")),
        }
    }

    /// A resource declared as required. Binding guarantees it is present.
    pub fn resource<R: Resource>(&self, index: usize) -> Result<Ref<'w, R>> {
        self.optional_resource::<R>(index)?.ok_or_else(|| {
            mismatch(
                index,
                format!("a present {} resource", short_type_name::<R>()),
            )
        })
    }

    pub fn resource_mut<R: Resource>(&self, index: usize) -> Result<RefMut<'w, R>> {
        self.optional_resource_mut::<R>(index)?.ok_or_else(|| {
            mismatch(
                index,
                format!("a present {} resource", short_type_name::<R>()),
            )
        })
    }

    /// A resource declared as optional: `None` when it was not registered.
    pub fn optional_resource<R: Resource>(&self, index: usize) -> Result<Option<Ref<'w, R>>> {
        let cell = self.resource_cell::<R>(index)?;
        Ok(cell.and_then(|cell| {
            Ref::filter_map(cell.borrow(), |value| value.downcast_ref::<R>()).ok()
        }))
    }

    pub fn optional_resource_mut<R: Resource>(
        &self,
        index: usize,
    ) -> Result<Option<RefMut<'w, R>>> {
        let cell = self.resource_cell::<R>(index)?;
        Ok(cell.and_then(|cell| {
            RefMut::filter_map(cell.borrow_mut(), |value| value.downcast_mut::<R>()).ok()
        }))
    }

    fn resource_cell<R: Resource>(
        &self,
        index: usize,
    ) -> Result<Option<&'w RefCell<Box<dyn Any>>>> {
        match self.params.get(index) {
            Some(&Arg::Resource { key, cell }) if key.id() == TypeId::of::<R>() => Ok(cell),
            Some(Arg::UnknownResource { name }) if name == short_type_name::<R>() => Ok(None),
            _ => Err(mismatch(
                index,
                format!("a {} resource", short_type_name::<R>()),
            )),
        }
    }

    pub(crate) fn into_commands(self) -> CommandQueue {
        self.commands.into_queue()
    }
}

fn mismatch(index: usize, expected: impl Into<String>) -> EcsError {
    EcsError::ArgumentMismatch {
        index,
        expected: expected.into(),
    }
}

/// Result of binding one system.
pub enum Binding<'w> {
    Ready(Args<'w>),
    /// Required resources were missing; the system does not run this time.
    Skipped { missing: Vec<String> },
}

/// Resolve `params` and bind each one against `world`.
pub fn bind<'w>(system: &str, params: &[ParamDecl], world: &'w World) -> Result<Binding<'w>> {
    let mut bound = Vec::with_capacity(params.len());
    let mut missing = Vec::new();

    for decl in params {
        let shape = decl
            .resolve(world.registry())
            .map_err(|err| EcsError::UnrecognizedParameter {
                system: system.to_string(),
                parameter: decl.to_string(),
                reason: err.to_string(),
            })?;

        let arg = match shape {
            ParamShape::Commands => Arg::Commands,
            ParamShape::Resource { key, optional } => {
                let cell = world.resources().cell(key.id());
                if cell.is_none() && !optional {
                    missing.push(key.name().to_string());
                }
                Arg::Resource { key, cell }
            }
            ParamShape::UnknownResource { name, optional } => {
                if !optional {
                    missing.push(name.clone());
                }
                Arg::UnknownResource { name }
            }
            ParamShape::Query(spec) => Arg::Query(Query::new(world, spec)),
        };
        bound.push(arg);
    }

    if !missing.is_empty() {
        return Ok(Binding::Skipped { missing });
    }

    Ok(Binding::Ready(Args {
        params: bound,
        commands: Commands::new(world.entities()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::Component;
    use crate::ecs::query::QuerySpec;

    #[derive(Debug, PartialEq)]
    struct Gravity(f32);
    impl Resource for Gravity {}

    #[derive(Debug, PartialEq)]
    struct Wind(f32);
    impl Resource for Wind {}

    #[derive(Debug, PartialEq)]
    struct Mass(f32);
    impl Component for Mass {}

    fn shape(shape: ParamShape) -> ParamDecl {
        ParamDecl::Shape(shape)
    }

    #[test]
    fn test_binds_every_shape() {
        let mut world = World::new();
        world.add_resource(Gravity(9.81));
        world.create_entity((Mass(2.0),)).unwrap();

        let params = vec![
            shape(ParamShape::Commands),
            shape(ParamShape::Resource {
                key: TypeKey::of::<Gravity>(),
                optional: false,
            }),
            shape(ParamShape::Resource {
                key: TypeKey::of::<Wind>(),
                optional: true,
            }),
            shape(ParamShape::Query(QuerySpec::new().with::<Mass>())),
        ];

        let Binding::Ready(args) = bind("physics", &params, &world).unwrap() else {
            panic!("expected the system to be bound");
        };
        assert_eq!(args.len(), 4);
        assert!(args.commands(0).is_ok());
        assert_eq!(*args.resource::<Gravity>(1).unwrap(), Gravity(9.81));
        assert!(args.optional_resource::<Wind>(2).unwrap().is_none());
        assert_eq!(args.query(3).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_required_resource_skips() {
        let world = World::new();
        let params = vec![shape(ParamShape::Resource {
            key: TypeKey::of::<Gravity>(),
            optional: false,
        })];

        match bind("physics", &params, &world).unwrap() {
            Binding::Skipped { missing } => assert_eq!(missing, vec!["Gravity"]),
            Binding::Ready(_) => panic!("system should be skipped"),
        }
    }

    #[test]
    fn test_wrong_accessor_is_a_mismatch() {
        let mut world = World::new();
        world.add_resource(Gravity(1.0));
        let params = vec![shape(ParamShape::Resource {
            key: TypeKey::of::<Gravity>(),
            optional: false,
        })];

        let Binding::Ready(args) = bind("physics", &params, &world).unwrap() else {
            panic!("expected the system to be bound");
        };
        assert!(matches!(
            args.query(0),
            Err(EcsError::ArgumentMismatch { index: 0, .. })
        ));
        assert!(args.resource::<Wind>(0).is_err());
        assert!(args.commands(0).is_err());
        assert!(args.resource::<Gravity>(5).is_err());
    }

    #[test]
    fn test_unknown_names_bind_as_missing() {
        let mut world = World::new();
        world.create_entity((Mass(1.0),)).unwrap();

        let required = vec![ParamDecl::Text("Res<Gravity>".into())];
        match bind("physics", &required, &world).unwrap() {
            Binding::Skipped { missing } => assert_eq!(missing, vec!["Gravity"]),
            Binding::Ready(_) => panic!("system should be skipped"),
        }

        let params = vec![
            ParamDecl::Text("Option<Res<Wind>>".into()),
            ParamDecl::Text("Query<Mass, Option<Charge>>".into()),
            ParamDecl::Text("Query<Charge>".into()),
        ];
        let Binding::Ready(args) = bind("physics", &params, &world).unwrap() else {
            panic!("optional and query parameters never skip");
        };
        assert!(args.optional_resource::<Wind>(0).unwrap().is_none());
        assert!(args.optional_resource::<Gravity>(0).is_err());
        assert_eq!(args.query(1).unwrap().count(), 1);
        assert_eq!(args.query(2).unwrap().count(), 0);
    }

    #[test]
    fn test_unrecognized_text_parameter() {
        let world = World::new();
        let params = vec![ParamDecl::Text("Everything".into())];
        let err = bind("greedy", &params, &world).err().unwrap();
        match err {
            EcsError::UnrecognizedParameter {
                system, parameter, ..
            } => {
                assert_eq!(system, "greedy");
                assert_eq!(parameter, "Everything");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
