//! # Component Types and Tags
//!
//! Any `Send + Sync + 'static` type can be a component. Each component type gets a
//! small integer [`ComponentTag`] the first time it is seen by a [`TypeTags`]
//! registry; tags index the store table of every world built on that registry.
//!
//! Tag numbering is scoped to the registry object, not the process. Worlds built
//! with their own registry never observe each other's tags; worlds that must agree
//! on tags share one [`SharedTypeTags`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::erased::AnyStore;
use super::storage::ComponentStore;
use crate::config::StoreConfig;

/// Marker trait for component types.
///
/// Blanket-implemented for every `Send + Sync + 'static` type, so plain structs,
/// enums and zero-sized tags all qualify.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

/// Per-type integer tag, assigned in first-use order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTag(u32);

impl ComponentTag {
    /// Wraps a raw tag value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the tag as an index into a store table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Builds an empty type-erased store for a registered type.
pub(crate) type StoreFactory = fn(&StoreConfig) -> Box<dyn AnyStore>;

fn make_store<T: Component>(config: &StoreConfig) -> Box<dyn AnyStore> {
    Box::new(ComponentStore::<T>::with_config(*config))
}

/// What a registry knows about one tag.
///
/// The recorded factory lets a world create the store for a tag it has only seen
/// through the type-erased API.
#[derive(Clone, Copy, Debug)]
pub struct TagInfo {
    type_id: TypeId,
    type_name: &'static str,
    factory: StoreFactory,
}

impl TagInfo {
    /// Returns the Rust type id of the component.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the component's type name.
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub(crate) fn make_store(&self, config: &StoreConfig) -> Box<dyn AnyStore> {
        (self.factory)(config)
    }
}

/// Type → tag registry.
#[derive(Debug, Default)]
pub struct TypeTags {
    by_type: HashMap<TypeId, ComponentTag>,
    infos: Vec<TagInfo>,
}

impl TypeTags {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag for `T`, assigning the next free tag on first use.
    pub fn register<T: Component>(&mut self) -> ComponentTag {
        let type_id = TypeId::of::<T>();
        if let Some(&tag) = self.by_type.get(&type_id) {
            return tag;
        }

        #[allow(clippy::cast_possible_truncation)]
        let tag = ComponentTag(self.infos.len() as u32);
        let type_name = std::any::type_name::<T>();
        self.infos.push(TagInfo {
            type_id,
            type_name,
            factory: make_store::<T>,
        });
        self.by_type.insert(type_id, tag);

        tracing::debug!(%tag, type_name, "registered component type");
        tag
    }

    /// Returns the tag for `T` if it has been registered.
    #[inline]
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<ComponentTag> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Returns what is known about `tag`.
    #[inline]
    #[must_use]
    pub fn info(&self, tag: ComponentTag) -> Option<&TagInfo> {
        self.infos.get(tag.index())
    }

    /// Returns the number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Checks if no type has been registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Wraps this registry for sharing between worlds.
    #[must_use]
    pub fn into_shared(self) -> SharedTypeTags {
        SharedTypeTags(Arc::new(RwLock::new(self)))
    }
}

/// A [`TypeTags`] registry that can be shared between worlds.
///
/// Cloning shares the registry; [`SharedTypeTags::new`] creates an isolated one.
#[derive(Clone, Debug, Default)]
pub struct SharedTypeTags(Arc<RwLock<TypeTags>>);

impl SharedTypeTags {
    /// Creates a fresh, unshared registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag for `T`, assigning one on first use.
    pub fn register<T: Component>(&self) -> ComponentTag {
        if let Some(tag) = self.0.read().get::<T>() {
            return tag;
        }
        self.0.write().register::<T>()
    }

    /// Returns the tag for `T` if it has been registered.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<ComponentTag> {
        self.0.read().get::<T>()
    }

    /// Returns what is known about `tag`.
    #[must_use]
    pub fn info(&self, tag: ComponentTag) -> Option<TagInfo> {
        self.0.read().info(tag).copied()
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Checks if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// Checks if both handles point at the same registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
