//! Systems and their declared parameters
//!
//! A system states what it needs as an ordered parameter list. Each run the
//! scheduler resolves that list against the world and hands the system its
//! bound `Args`; a system never wires up its own inputs.
//!
//! ```ignore
//! let movement = SystemBuilder::new("movement")
//!     .query(QuerySpec::new().with::<Position>().with::<Velocity>())
//!     .build(|args| {
//!         for row in args.query(0)? {
//!             let mut position = row.fetch_mut::<Position>()?;
//!             let velocity = row.fetch::<Velocity>()?;
//!             position.x += velocity.x;
//!         }
//!         Ok(())
//!     });
//! ```

mod bind;
mod param;

use anyhow::Result;

use super::component::Component;
use super::query::QuerySpec;
use super::registry::TypeKey;
use super::resource::Resource;

pub use bind::{bind, Arg, Args, Binding};
pub use param::{ParamDecl, ParamError, ParamShape};

/// System trait - anything the scheduler can run
pub trait System {
    fn name(&self) -> &str;

    /// Declared parameters, read again on every run.
    fn params(&self) -> Vec<ParamDecl>;

    fn run(&mut self, args: &Args<'_>) -> Result<()>;
}

type SystemFn = Box<dyn FnMut(&Args<'_>) -> Result<()>>;

/// A closure paired with the parameter list it was declared with.
pub struct FnSystem {
    name: String,
    params: Vec<ParamDecl>,
    func: SystemFn,
}

impl FnSystem {
    pub fn builder(name: impl Into<String>) -> SystemBuilder {
        SystemBuilder::new(name)
    }
}

impl System for FnSystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> Vec<ParamDecl> {
        self.params.clone()
    }

    fn run(&mut self, args: &Args<'_>) -> Result<()> {
        (self.func)(args)
    }
}

/// Declares a system's parameters, in order.
pub struct SystemBuilder {
    name: String,
    params: Vec<ParamDecl>,
}

impl SystemBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn commands(self) -> Self {
        self.shape(ParamShape::Commands)
    }

    pub fn resource<R: Resource>(self) -> Self {
        self.shape(ParamShape::Resource {
            key: TypeKey::of::<R>(),
            optional: false,
        })
    }

    pub fn optional_resource<R: Resource>(self) -> Self {
        self.shape(ParamShape::Resource {
            key: TypeKey::of::<R>(),
            optional: true,
        })
    }

    pub fn query(self, spec: QuerySpec) -> Self {
        self.shape(ParamShape::Query(spec))
    }

    /// Shorthand for a query over required components only.
    pub fn query_of<T: Component>(self) -> Self {
        self.query(QuerySpec::new().with::<T>())
    }

    /// A textual declaration such as `"Query<Position, Option<Velocity>>"`,
    /// resolved against the world's type names when the system is bound.
    pub fn param(mut self, declaration: impl Into<String>) -> Self {
        self.params.push(ParamDecl::Text(declaration.into()));
        self
    }

    pub fn shape(mut self, shape: ParamShape) -> Self {
        self.params.push(ParamDecl::Shape(shape));
        self
    }

    pub fn build<F>(self, func: F) -> FnSystem
    where
        F: FnMut(&Args<'_>) -> Result<()> + 'static,
    {
        FnSystem {
            name: self.name,
            params: self.params,
            func: Box::new(func),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Position;
    impl Component for Position {}

    #[derive(Debug)]
    struct Clock;
    impl Resource for Clock {}

    #[test]
    fn test_builder_records_params_in_order() {
        let system = SystemBuilder::new("tick")
            .commands()
            .resource::<Clock>()
            .optional_resource::<Clock>()
            .query_of::<Position>()
            .param("Res<Clock>")
            .build(|_| Ok(()));

        assert_eq!(system.name(), "tick");
        let params = system.params();
        assert_eq!(params.len(), 5);
        assert_eq!(params[0], ParamDecl::Shape(ParamShape::Commands));
        assert_eq!(
            params[2],
            ParamDecl::Shape(ParamShape::Resource {
                key: TypeKey::of::<Clock>(),
                optional: true,
            })
        );
        assert_eq!(params[3].to_string(), "Query<Position>");
        assert_eq!(params[4], ParamDecl::Text("Res<Clock>".into()));
    }
}
