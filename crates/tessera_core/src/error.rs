//! # Engine Error Types
//!
//! All errors that can occur while creating entities or touching component stores.

use thiserror::Error;

use crate::ecs::{ComponentTag, EntityId};

/// Errors that can occur in the storage engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity identifier space is used up.
    #[error("entity capacity exhausted: identifiers must stay below {limit}")]
    CapacityExhausted {
        /// Exclusive upper bound on identifiers for the world.
        limit: usize,
    },

    /// The null entity (id 0) was passed where a real entity is required.
    #[error("the null entity cannot hold components or be destroyed")]
    NullEntity,

    /// The entity is not alive in this world.
    #[error("entity {0} is not alive")]
    DeadEntity(EntityId),

    /// The entity already holds a component of this type.
    #[error("entity {entity} already holds a `{component}`")]
    DuplicateComponent {
        /// Entity the add was attempted on.
        entity: EntityId,
        /// Component type name.
        component: &'static str,
    },

    /// The entity does not hold a component of this type.
    #[error("entity {entity} holds no `{component}`")]
    MissingComponent {
        /// Entity the lookup was attempted on.
        entity: EntityId,
        /// Component type name.
        component: &'static str,
    },

    /// No component type has been registered under this tag.
    #[error("no component type registered for tag {0}")]
    UnknownTag(ComponentTag),

    /// A type-erased value did not match the store it was routed to.
    #[error("type-erased value is not a `{expected}`")]
    TypeMismatch {
        /// Type name the store holds.
        expected: &'static str,
    },

    /// The same component type was requested twice in one multi-store fetch.
    #[error("component set `{0}` names a type more than once")]
    AliasedStores(&'static str),

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type EcsResult<T> = Result<T, EcsError>;
