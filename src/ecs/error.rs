//! Error types for the ECS core

use thiserror::Error;

use super::Entity;

/// Errors raised by a component storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("index must not be negative: {0}")]
    InvalidIndex(i64),
    #[error("an empty slot cannot be stored as a value")]
    NullValue,
}

/// Errors raised by the world, the binder or a system.
#[derive(Debug, Error)]
pub enum EcsError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("system '{system}' declares unrecognized parameter '{parameter}': {reason}")]
    UnrecognizedParameter {
        system: String,
        parameter: String,
        reason: String,
    },

    #[error("argument {index} is not {expected}")]
    ArgumentMismatch { index: usize, expected: String },

    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },

    #[error("{component} is not a field of this query")]
    UndeclaredField { component: &'static str },

    #[error("entity {0} is not alive")]
    NoSuchEntity(Entity),

    #[error("entity identifier space exhausted")]
    EntityIdsExhausted,

    #[error("system '{name}' failed")]
    System {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T, E = EcsError> = std::result::Result<T, E>;
