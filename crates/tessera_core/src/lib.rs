//! # TESSERA Core Engine
//!
//! Sparse-set Entity Component Storage designed for:
//! - O(1) attach, detach and lookup of any component on any entity
//! - Packed, cache-contiguous component arrays
//! - Multi-type queries driven by the rarest component
//! - Read-only snapshots handed to worker threads without locks
//!
//! ## Architecture Rules
//!
//! 1. **The world owns everything** - entities are created and destroyed only there
//! 2. **One store per type** - each component type lives in its own sparse set
//! 3. **Borrows guard concurrency** - a store cannot change while a snapshot lives
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{World, WorldConfig};
//!
//! let mut world = World::with_config(WorldConfig::from_toml_file("world.toml")?)?;
//! let player = world.create_entity()?;
//! world.insert_bundle(player, (Position::default(), Velocity::default()))?;
//!
//! let mut pools = world.pools::<(Position, Velocity)>()?;
//! pools.for_each(|_, position, velocity| position.advance(velocity));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod memory;
pub mod sync;

pub use config::{StoreConfig, ViolationPolicy, WorldConfig};
pub use ecs::{
    smallest_store, AnyStore, BoxedComponent, Component, ComponentSet, ComponentStore,
    ComponentTag, DenseSlot, EntityId, Pools, SharedTypeTags, World, MAX_ENTITIES,
};
pub use error::{EcsError, EcsResult};
pub use memory::GrowthPolicy;
pub use sync::{IdView, OwnedSnapshot, Snapshot, SnapshotMut};
