//! # Store Registry
//!
//! Owns one [`ComponentStore`] per component type, indexed by [`ComponentTag`]. A slot
//! stays empty until its type is first requested, either through a typed accessor or
//! through a tag that was registered elsewhere on the same [`SharedTypeTags`].

use std::fmt;

use super::component::{Component, ComponentTag, SharedTypeTags};
use super::erased::{downcast_store, downcast_store_mut, AnyStore};
use super::storage::ComponentStore;
use crate::config::StoreConfig;
use crate::error::{EcsError, EcsResult};

/// Tag-indexed table of type-erased stores.
pub struct StoreRegistry {
    tags: SharedTypeTags,
    stores: Vec<Option<Box<dyn AnyStore>>>,
    config: StoreConfig,
}

impl StoreRegistry {
    /// Creates an empty registry that numbers types through `tags` and builds new
    /// stores from `config`.
    #[must_use]
    pub fn new(tags: SharedTypeTags, config: StoreConfig) -> Self {
        Self {
            tags,
            stores: Vec::new(),
            config,
        }
    }

    /// Returns the type-tag registry.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &SharedTypeTags {
        &self.tags
    }

    /// Returns the template config for new stores.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the tag for `T`, assigning one on first use. Does not create the store.
    #[inline]
    pub fn register<T: Component>(&self) -> ComponentTag {
        self.tags.register::<T>()
    }

    /// Returns the tag for `T` if it has been registered.
    #[inline]
    #[must_use]
    pub fn tag_of<T: Component>(&self) -> Option<ComponentTag> {
        self.tags.get::<T>()
    }

    /// Checks if the store for `tag` has been created.
    #[inline]
    #[must_use]
    pub fn has_pool(&self, tag: ComponentTag) -> bool {
        self.stores
            .get(tag.index())
            .is_some_and(Option::is_some)
    }

    /// Returns the number of created stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.iter().filter(|slot| slot.is_some()).count()
    }

    /// Checks if no store has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.iter().all(Option::is_none)
    }

    /// Returns the store for `T` if it exists.
    #[must_use]
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        let store = self.store_dyn(self.tag_of::<T>()?)?;
        downcast_store(store).ok()
    }

    /// Returns the store for `T`, creating it if absent.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeMismatch`] only if the tag table and the store table disagree,
    /// which cannot happen through this API.
    pub fn store_mut<T: Component>(&mut self) -> EcsResult<&mut ComponentStore<T>> {
        let tag = self.register::<T>();
        downcast_store_mut(self.slot_mut(tag)?)
    }

    /// Returns the store for `T` mutably, without creating it.
    pub fn existing_store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        let tag = self.tag_of::<T>()?;
        let store = self.stores.get_mut(tag.index())?.as_deref_mut()?;
        downcast_store_mut(store).ok()
    }

    /// Creates the store for `T` if absent and returns its tag.
    ///
    /// # Errors
    ///
    /// See [`store_mut`](Self::store_mut).
    pub fn ensure_store<T: Component>(&mut self) -> EcsResult<ComponentTag> {
        let tag = self.register::<T>();
        self.slot_mut(tag)?;
        Ok(tag)
    }

    /// Returns the store for `tag` if it exists.
    #[must_use]
    pub fn store_dyn(&self, tag: ComponentTag) -> Option<&dyn AnyStore> {
        self.stores.get(tag.index())?.as_deref()
    }

    /// Returns the store for `tag`, creating it from the tag's recorded factory if absent.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownTag`] if `tag` was never registered.
    pub fn store_dyn_mut(
        &mut self,
        tag: ComponentTag,
    ) -> EcsResult<&mut (dyn AnyStore + 'static)> {
        self.slot_mut(tag)
    }

    fn slot_mut(&mut self, tag: ComponentTag) -> EcsResult<&mut (dyn AnyStore + 'static)> {
        let info = self.tags.info(tag).ok_or(EcsError::UnknownTag(tag))?;
        if self.stores.len() <= tag.index() {
            self.stores.resize_with(tag.index() + 1, || None);
        }

        let config = self.config;
        let slot = &mut self.stores[tag.index()];
        let store = slot.get_or_insert_with(|| {
            tracing::debug!(%tag, type_name = info.type_name(), "creating component store");
            info.make_store(&config)
        });
        Ok(&mut **store)
    }

    /// Creates (if needed) and mutably borrows the stores for `N` distinct tags.
    ///
    /// # Errors
    ///
    /// [`EcsError::AliasedStores`] naming `set_name` if a tag appears twice, and
    /// [`EcsError::UnknownTag`] for an unregistered tag.
    pub(crate) fn disjoint_stores<const N: usize>(
        &mut self,
        tags: [ComponentTag; N],
        set_name: &'static str,
    ) -> EcsResult<[Option<&mut (dyn AnyStore + 'static)>; N]> {
        for tag in tags {
            self.slot_mut(tag)?;
        }
        let slots = self
            .stores
            .get_disjoint_mut(tags.map(ComponentTag::index))
            .map_err(|_| EcsError::AliasedStores(set_name))?;
        Ok(slots.map(|slot| slot.as_deref_mut()))
    }

    /// Iterates over the created stores with their tags.
    pub fn iter(&self) -> impl Iterator<Item = (ComponentTag, &dyn AnyStore)> + '_ {
        self.stores
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((tag_at(index), slot.as_deref()?)))
    }

    /// Iterates mutably over the created stores with their tags.
    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (ComponentTag, &mut (dyn AnyStore + 'static))> + '_ {
        self.stores
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| Some((tag_at(index), slot.as_deref_mut()?)))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn tag_at(index: usize) -> ComponentTag {
    ComponentTag::new(index as u32)
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(tag, store)| (tag, (store.type_name(), store.len()))))
            .finish()
    }
}
