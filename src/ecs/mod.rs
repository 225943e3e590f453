//! Entity Component System (ECS) implementation
//!
//! One table per component type, a singleton resource store, positive and
//! optional joins over the live entity set, and systems that declare their
//! inputs instead of fetching them.

pub mod command;
pub mod component;
pub mod entity;
pub mod error;
pub mod query;
pub mod registry;
pub mod resource;
pub mod storage;
pub mod system;
pub mod world;

pub use command::Commands;
pub use component::{Bundle, Component, ComponentTable, Table};
pub use entity::{Entity, EntityId, EntityRegistry};
pub use error::{EcsError, StorageError};
pub use query::{Query, QueryField, QueryIter, QuerySpec, Row};
pub use registry::{TypeKey, TypeRegistry};
pub use resource::{Resource, Resources};
pub use storage::{DenseStorage, SparseStorage, Storage, StorageKind};
pub use system::{Arg, Args, FnSystem, ParamDecl, ParamShape, System, SystemBuilder};
pub use world::World;
