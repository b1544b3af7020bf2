//! # Entity Component System
//!
//! A sparse-set ECS: every component type has its own packed store, and entities are
//! plain integers indexing into those stores.
//!
//! ## Design Philosophy
//!
//! - Attach, detach and lookup are O(1) per store
//! - Components of one type are contiguous, so iteration is a linear scan
//! - Multi-type queries walk the smallest store and probe the rest
//! - Type-erased access goes through [`AnyStore`], typed access never does

mod component;
mod entity;
mod erased;
mod query;
mod registry;
mod storage;
mod world;

pub use component::{Component, ComponentTag, SharedTypeTags, TagInfo, TypeTags};
pub use entity::{Entities, Entity, EntityId, RawId, MAX_ENTITIES};
pub use erased::{downcast_store, downcast_store_mut, AnyStore, BoxedComponent};
pub use query::{smallest_store, ComponentSet, Pools};
pub use registry::StoreRegistry;
pub use storage::{ComponentStore, DenseSlot};
pub use world::World;
