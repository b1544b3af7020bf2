//! # ECS World
//!
//! The central container for all entities and components. The world is the only
//! place entities are created or destroyed, and the only place several stores can be
//! borrowed at once.

use std::any::Any;

use super::component::{Component, ComponentTag, SharedTypeTags};
use super::entity::{Entities, EntityId};
use super::erased::{AnyStore, BoxedComponent};
use super::query::{ComponentSet, Pools};
use super::registry::StoreRegistry;
use super::storage::ComponentStore;
use crate::config::{ViolationPolicy, WorldConfig};
use crate::error::{EcsError, EcsResult};

/// The ECS World: entity allocator plus one store per component type.
///
/// # Example
///
/// ```rust,ignore
/// let mut world = World::new();
///
/// let entity = world.create_entity()?;
/// world.add(entity, Position { x: 0.0, y: 0.0 })?;
/// world.add(entity, Velocity { x: 1.0, y: 0.0 })?;
///
/// world.pools::<(Position, Velocity)>()?.for_each(|_, position, velocity| {
///     position.x += velocity.x;
///     position.y += velocity.y;
/// });
/// ```
#[derive(Debug)]
pub struct World {
    entities: Entities,
    registry: StoreRegistry,
    config: WorldConfig,
}

impl Default for World {
    fn default() -> Self {
        Self::build(WorldConfig::default(), SharedTypeTags::new())
    }
}

impl World {
    /// Creates an empty world with default configuration and its own tag registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty world from `config`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(config: WorldConfig) -> EcsResult<Self> {
        Self::with_type_tags(config, SharedTypeTags::new())
    }

    /// Creates an empty world numbering component types through `tags`.
    ///
    /// Worlds built from clones of the same [`SharedTypeTags`] agree on every tag.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if `config` fails validation.
    pub fn with_type_tags(config: WorldConfig, tags: SharedTypeTags) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::build(config, tags))
    }

    fn build(config: WorldConfig, tags: SharedTypeTags) -> Self {
        Self {
            entities: Entities::new(config.max_entities, config.entity_growth),
            registry: StoreRegistry::new(tags, config.store_config()),
            config,
        }
    }

    /// Returns the world's configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the precondition policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> ViolationPolicy {
        self.config.policy
    }

    /// Returns the type-tag registry this world numbers types through.
    #[inline]
    #[must_use]
    pub fn type_tags(&self) -> &SharedTypeTags {
        self.registry.tags()
    }

    /// Returns the store table.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity, reusing the most recently destroyed id if any.
    ///
    /// # Errors
    ///
    /// [`EcsError::CapacityExhausted`] once every id below `max_entities` is alive.
    pub fn create_entity(&mut self) -> EcsResult<EntityId> {
        let id = self.entities.allocate()?;
        tracing::debug!(%id, "created entity");
        Ok(id)
    }

    /// Removes every component of `id` and frees the id for reuse.
    ///
    /// # Errors
    ///
    /// Under [`ViolationPolicy::Strict`], [`EcsError::NullEntity`] or
    /// [`EcsError::DeadEntity`] if `id` is not alive. Under
    /// [`ViolationPolicy::Permissive`] the call is a logged no-op.
    pub fn destroy_entity(&mut self, id: EntityId) -> EcsResult<()> {
        if !self.require_live(id)? {
            return Ok(());
        }
        let swept = self.sweep(id);
        self.entities.release(id);
        tracing::debug!(%id, swept, "destroyed entity");
        Ok(())
    }

    /// Checks if `id` is alive.
    #[inline]
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.is_live(id)
    }

    /// Removes every component of `id`, keeping the entity alive.
    ///
    /// Returns the number of components removed.
    pub fn clear_components(&mut self, id: EntityId) -> usize {
        self.sweep(id)
    }

    fn sweep(&mut self, id: EntityId) -> usize {
        self.registry
            .iter_mut()
            .filter(|(_, store)| store.has(id))
            .map(|(_, store)| store.remove_entity(id))
            .filter(|&removed| removed)
            .count()
    }

    /// Returns `Ok(true)` for a live id; otherwise applies the policy with `Ok(false)`
    /// as the permissive fallback.
    fn require_live(&self, id: EntityId) -> EcsResult<bool> {
        if self.entities.is_live(id) {
            return Ok(true);
        }
        let error = if id.is_null() {
            EcsError::NullEntity
        } else {
            EcsError::DeadEntity(id)
        };
        self.config.policy.apply(error, false)
    }

    /// Returns the number of alive entities.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Returns the highest id ever handed out.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.entities.entity_count()
    }

    /// Returns the number of ids waiting to be reused.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.entities.free_count()
    }

    /// Iterates over alive entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter_live()
    }

    // =========================================================================
    // Typed access
    // =========================================================================

    /// Returns the store for `T`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Never fails for a typed request; the `Result` is shared with the dynamic path.
    pub fn pool<T: Component>(&mut self) -> EcsResult<&mut ComponentStore<T>> {
        self.registry.store_mut::<T>()
    }

    /// Returns the store for `T` if it exists.
    #[must_use]
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.registry.store::<T>()
    }

    /// Borrows the stores for every type in `S` and picks the smallest.
    ///
    /// ```rust,ignore
    /// let mut pools = world.pools::<(Position, Velocity)>()?;
    /// for index in 0..pools.len() {
    ///     let Some(id) = pools.id_at(index) else { break };
    ///     if let Some((position, velocity)) = pools.get_mut(id) {
    ///         // ...
    ///     }
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// [`EcsError::AliasedStores`] if `S` names a type twice.
    pub fn pools<S: ComponentSet>(&mut self) -> EcsResult<Pools<'_, S>> {
        Ok(Pools::new(S::fetch(&mut self.registry)?))
    }

    /// Checks if `id` holds a `T`.
    #[must_use]
    pub fn has<T: Component>(&self, id: EntityId) -> bool {
        self.store::<T>().is_some_and(|store| store.has(id))
    }

    /// Gets `id`'s `T`.
    #[must_use]
    pub fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        self.store::<T>()?.get(id)
    }

    /// Gets `id`'s `T` mutably.
    pub fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        self.registry.existing_store_mut::<T>()?.get_mut(id)
    }

    /// Attaches `value` to a live entity.
    ///
    /// # Errors
    ///
    /// Under [`ViolationPolicy::Strict`], [`EcsError::DeadEntity`] or
    /// [`EcsError::NullEntity`] if `id` is not alive, plus the errors of
    /// [`ComponentStore::add`].
    pub fn add<T: Component>(&mut self, id: EntityId, value: T) -> EcsResult<()> {
        if !self.require_live(id)? {
            return Ok(());
        }
        self.pool::<T>()?.add(id, value)
    }

    /// Detaches and returns `id`'s `T`.
    ///
    /// # Errors
    ///
    /// Under [`ViolationPolicy::Strict`], [`EcsError::MissingComponent`] if `id` holds
    /// no `T`; under [`ViolationPolicy::Permissive`] returns `Ok(None)`.
    pub fn remove<T: Component>(&mut self, id: EntityId) -> EcsResult<Option<T>> {
        let policy = self.config.policy;
        match self.registry.existing_store_mut::<T>() {
            Some(store) => store.remove(id),
            None => {
                let error = EcsError::MissingComponent {
                    entity: id,
                    component: std::any::type_name::<T>(),
                };
                policy.apply(error, None)
            }
        }
    }

    /// Returns `id`'s `T`, attaching `init()` first if it has none.
    ///
    /// # Errors
    ///
    /// [`EcsError::NullEntity`] or [`EcsError::DeadEntity`] if `id` is not alive,
    /// regardless of policy: there is no value to hand back.
    pub fn get_or_insert_with<T: Component>(
        &mut self,
        id: EntityId,
        init: impl FnOnce() -> T,
    ) -> EcsResult<&mut T> {
        if !self.entities.is_live(id) {
            return Err(if id.is_null() {
                EcsError::NullEntity
            } else {
                EcsError::DeadEntity(id)
            });
        }
        self.pool::<T>()?.get_or_insert_with(id, init)
    }

    /// Attaches every component of `bundle` in tuple order.
    ///
    /// Not transactional: on error, components attached before the failing one stay
    /// attached. Pre-check with [`has`](Self::has) where that matters.
    ///
    /// # Errors
    ///
    /// The liveness errors of [`add`](Self::add), then the first store error.
    pub fn insert_bundle<S: ComponentSet>(&mut self, id: EntityId, bundle: S) -> EcsResult<()> {
        if !self.require_live(id)? {
            return Ok(());
        }
        bundle.insert(&mut self.registry, id)
    }

    /// Detaches every component of `S` in tuple order. Not transactional.
    ///
    /// # Errors
    ///
    /// The first error returned by [`ComponentStore::remove`].
    pub fn remove_bundle<S: ComponentSet>(&mut self, id: EntityId) -> EcsResult<()> {
        S::remove(&mut self.registry, id)
    }

    // =========================================================================
    // Type-erased access
    // =========================================================================

    /// Returns the tag for `T`, assigning one on first use.
    pub fn register<T: Component>(&self) -> ComponentTag {
        self.registry.register::<T>()
    }

    /// Returns the tag for `T` if it has been registered.
    #[must_use]
    pub fn tag_of<T: Component>(&self) -> Option<ComponentTag> {
        self.registry.tag_of::<T>()
    }

    /// Checks if this world has created the store for `tag`.
    #[must_use]
    pub fn has_pool(&self, tag: ComponentTag) -> bool {
        self.registry.has_pool(tag)
    }

    /// Returns the store for `tag` if it exists.
    #[must_use]
    pub fn pool_dynamic(&self, tag: ComponentTag) -> Option<&dyn AnyStore> {
        self.registry.store_dyn(tag)
    }

    /// Returns the store for `tag`, creating it if absent.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownTag`] if `tag` was never registered.
    pub fn pool_dynamic_mut(
        &mut self,
        tag: ComponentTag,
    ) -> EcsResult<&mut (dyn AnyStore + 'static)> {
        self.registry.store_dyn_mut(tag)
    }

    /// Gets `id`'s component in the store for `tag`.
    #[must_use]
    pub fn get_dynamic(&self, id: EntityId, tag: ComponentTag) -> Option<&dyn Any> {
        self.registry.store_dyn(tag)?.get_any(id)
    }

    /// Attaches a value whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownTag`] for an unregistered tag, [`EcsError::TypeMismatch`] if
    /// `value` is not the tag's type, plus the errors of [`add`](Self::add).
    pub fn add_dynamic(
        &mut self,
        id: EntityId,
        tag: ComponentTag,
        value: BoxedComponent,
    ) -> EcsResult<()> {
        if !self.require_live(id)? {
            return Ok(());
        }
        self.registry.store_dyn_mut(tag)?.add_boxed(id, value)
    }

    /// Detaches `id`'s component from the store for `tag`.
    ///
    /// # Errors
    ///
    /// [`EcsError::UnknownTag`] for an unregistered tag, plus the errors of
    /// [`remove`](Self::remove).
    pub fn remove_dynamic(&mut self, id: EntityId, tag: ComponentTag) -> EcsResult<()> {
        self.registry.store_dyn_mut(tag)?.remove_checked(id)
    }
}
