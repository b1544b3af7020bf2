//! # Component Storage
//!
//! Sparse-set storage for a single component type.
//!
//! ```text
//! sparse:  [0, 2, 0, 1, 0, 3]     <- indexed by entity id, 1-based slot or 0
//! packed:  [e3, e1, e5]           <- entity owning each dense slot
//! dense:   [C3, C1, C5]           <- component values, no gaps
//! ```
//!
//! - Membership, lookup, insert and delete are O(1)
//! - Values of one type are contiguous, so iteration is a linear scan
//! - Deletion swaps the last element into the hole, so order is not preserved

use std::ops::{Index, IndexMut};

use super::entity::{EntityId, RawId, MAX_ENTITIES};
use crate::config::{StoreConfig, ViolationPolicy};
use crate::error::{EcsError, EcsResult};
use crate::sync::{IdView, Snapshot, SnapshotMut};

/// Index-stable handle to a dense slot.
///
/// A handle is invalidated by **any** removal or clear on the store it came from,
/// including removal of a different entity: swap-removal may relocate another value
/// into the handle's index. Resolving a stale handle returns `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DenseSlot {
    index: usize,
    epoch: u64,
}

impl DenseSlot {
    /// Returns the 0-based dense index the handle points at.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

/// Packed storage for one component type.
///
/// # Type Parameters
///
/// * `T` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut store: ComponentStore<Position> = ComponentStore::with_capacity(1024);
/// store.add(entity, Position::new(1.0, 2.0, 3.0))?;
/// for (id, position) in &store {
///     // ...
/// }
/// ```
#[derive(Debug)]
pub struct ComponentStore<T> {
    /// Component values, contiguous.
    dense: Vec<T>,
    /// Entity owning each dense slot.
    packed: Vec<EntityId>,
    /// Entity id -> 1-based dense slot, 0 when absent.
    sparse: Vec<RawId>,
    /// Highest entity id ever indexed.
    max_sparse_id: usize,
    /// Bumped on every relocation; invalidates [`DenseSlot`] handles.
    epoch: u64,
    config: StoreConfig,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

impl<T> ComponentStore<T> {
    /// Creates an empty store with default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `expected_size` components.
    #[must_use]
    pub fn with_capacity(expected_size: usize) -> Self {
        Self::with_config(StoreConfig::with_expected_size(expected_size))
    }

    /// Creates an empty store from an explicit config.
    ///
    /// The capacity hint is clamped to [`MAX_ENTITIES`].
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let expected_size = config.expected_size.min(MAX_ENTITIES);
        Self {
            dense: Vec::with_capacity(expected_size),
            packed: Vec::with_capacity(expected_size),
            sparse: Vec::new(),
            max_sparse_id: 0,
            epoch: 0,
            config,
        }
    }

    /// Returns the store's configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the precondition policy.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> ViolationPolicy {
        self.config.policy
    }

    /// Returns the number of live components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Checks if the store holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Returns how many components fit before the packed arrays reallocate.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// Returns the highest entity id ever indexed.
    ///
    /// This bounds the sparse array; it says nothing about liveness.
    #[inline]
    #[must_use]
    pub const fn max_sparse_id(&self) -> usize {
        self.max_sparse_id
    }

    /// Checks if `id` holds a component in this store.
    #[inline]
    #[must_use]
    pub fn has(&self, id: EntityId) -> bool {
        self.sparse_slot(id).is_some()
    }

    /// Returns the raw 1-based sparse slot for `id`.
    #[inline]
    #[must_use]
    pub fn sparse_slot(&self, id: EntityId) -> Option<usize> {
        if id.index() > self.max_sparse_id {
            return None;
        }
        match self.sparse.get(id.index()) {
            Some(&slot) if slot != 0 => Some(slot as usize),
            _ => None,
        }
    }

    /// Returns the 0-based dense index holding `id`'s component.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, id: EntityId) -> Option<usize> {
        self.sparse_slot(id).map(|slot| slot - 1)
    }

    /// Returns the entity owning the component at dense `index`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> Option<EntityId> {
        self.packed.get(index).copied()
    }

    /// Gets the component of `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        let index = self.dense_index(id)?;
        self.dense.get(index)
    }

    /// Gets the component of `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let index = self.dense_index(id)?;
        self.dense.get_mut(index)
    }

    /// Attaches `value` to `id`.
    ///
    /// Amortized O(1): the value is appended to the dense tail.
    ///
    /// # Errors
    ///
    /// Under [`ViolationPolicy::Strict`], returns [`EcsError::NullEntity`] for the null id
    /// and [`EcsError::DuplicateComponent`] if `id` already holds a component here. Under
    /// [`ViolationPolicy::Permissive`] both are logged and the store is left unchanged.
    ///
    /// Returns [`EcsError::CapacityExhausted`] regardless of policy if `id` is not below
    /// [`MAX_ENTITIES`].
    pub fn add(&mut self, id: EntityId, value: T) -> EcsResult<()> {
        if id.is_null() {
            return self.config.policy.apply(EcsError::NullEntity, ());
        }
        if self.has(id) {
            let error = EcsError::DuplicateComponent {
                entity: id,
                component: std::any::type_name::<T>(),
            };
            return self.config.policy.apply(error, ());
        }
        self.push(id, value)
    }

    /// Appends without precondition checks. `id` must be non-null and absent.
    fn push(&mut self, id: EntityId, value: T) -> EcsResult<()> {
        if id.index() >= MAX_ENTITIES {
            return Err(EcsError::CapacityExhausted {
                limit: MAX_ENTITIES,
            });
        }
        let slot = RawId::try_from(self.dense.len() + 1)
            .map_err(|_| EcsError::CapacityExhausted { limit: MAX_ENTITIES })?;

        let growth = self.config.growth;
        let tail = self.dense.len();
        growth.grow_to_fit(&mut self.sparse, id.index(), 0);
        growth.reserve_for(&mut self.packed, tail);
        growth.reserve_for(&mut self.dense, tail);

        self.max_sparse_id = self.max_sparse_id.max(id.index());
        self.sparse[id.index()] = slot;
        self.packed.push(id);
        self.dense.push(value);
        Ok(())
    }

    /// Returns `id`'s component, attaching `init()` first if it has none.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::NullEntity`] for the null id and
    /// [`EcsError::CapacityExhausted`] for an id not below [`MAX_ENTITIES`], regardless
    /// of policy.
    pub fn get_or_insert_with(
        &mut self,
        id: EntityId,
        init: impl FnOnce() -> T,
    ) -> EcsResult<&mut T> {
        if id.is_null() {
            return Err(EcsError::NullEntity);
        }
        let index = match self.dense_index(id) {
            Some(index) => index,
            None => {
                self.push(id, init())?;
                self.dense.len() - 1
            }
        };
        Ok(&mut self.dense[index])
    }

    /// Detaches and returns `id`'s component.
    ///
    /// O(1) swap-remove: the last element moves into the vacated slot.
    ///
    /// # Errors
    ///
    /// Under [`ViolationPolicy::Strict`], returns [`EcsError::MissingComponent`] if `id`
    /// holds no component here; under [`ViolationPolicy::Permissive`] returns `Ok(None)`.
    pub fn remove(&mut self, id: EntityId) -> EcsResult<Option<T>> {
        match self.dense_index(id) {
            Some(index) => Ok(Some(self.swap_remove(id, index))),
            None => {
                let error = EcsError::MissingComponent {
                    entity: id,
                    component: std::any::type_name::<T>(),
                };
                self.config.policy.apply(error, None)
            }
        }
    }

    /// Detaches `id`'s component if present, ignoring the policy.
    pub fn take(&mut self, id: EntityId) -> Option<T> {
        let index = self.dense_index(id)?;
        Some(self.swap_remove(id, index))
    }

    /// Removes the component at dense `index`, which must belong to `id`.
    fn swap_remove(&mut self, id: EntityId, index: usize) -> T {
        // The moved element's pointer is rewritten before ours is cleared, so removing
        // the tail element (where `last == id`) still ends with a zeroed slot.
        if let Some(&last) = self.packed.last() {
            self.sparse[last.index()] = self.sparse[id.index()];
        }
        self.sparse[id.index()] = 0;
        self.packed.swap_remove(index);
        self.epoch = self.epoch.wrapping_add(1);
        self.dense.swap_remove(index)
    }

    /// Removes every component, keeping allocated capacity.
    pub fn clear(&mut self) {
        for id in self.packed.drain(..) {
            self.sparse[id.index()] = 0;
        }
        self.dense.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Returns a handle to `id`'s dense slot.
    #[inline]
    #[must_use]
    pub fn slot(&self, id: EntityId) -> Option<DenseSlot> {
        self.dense_index(id).map(|index| DenseSlot {
            index,
            epoch: self.epoch,
        })
    }

    /// Resolves a slot handle, or `None` if the store was relocated since.
    #[inline]
    #[must_use]
    pub fn resolve(&self, slot: DenseSlot) -> Option<&T> {
        if slot.epoch != self.epoch {
            return None;
        }
        self.dense.get(slot.index)
    }

    /// Resolves a slot handle mutably, or `None` if the store was relocated since.
    #[inline]
    pub fn resolve_mut(&mut self, slot: DenseSlot) -> Option<&mut T> {
        if slot.epoch != self.epoch {
            return None;
        }
        self.dense.get_mut(slot.index)
    }

    /// Returns the owning entities in packed order.
    #[inline]
    #[must_use]
    pub fn packed_ids(&self) -> &[EntityId] {
        &self.packed
    }

    /// Returns the component values in packed order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Returns the component values in packed order, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Iterates over the entities holding a component, in packed order.
    ///
    /// The order is only stable while no component is added or removed.
    #[inline]
    pub fn ids(&self) -> std::iter::Copied<std::slice::Iter<'_, EntityId>> {
        self.packed.iter().copied()
    }

    /// Iterates over all components with their entities.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.packed.iter().copied().zip(self.dense.iter())
    }

    /// Iterates mutably over all components with their entities.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.packed.iter().copied().zip(self.dense.iter_mut())
    }

    /// Exports the packed arrays for a concurrent reader.
    ///
    /// The snapshot borrows the store, so no component can be added or removed until
    /// every copy of it (including those handed to worker threads) is gone. A resize or
    /// swap-remove would otherwise move data out from under the reader.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_, T> {
        Snapshot::new(&self.dense, &self.packed, &self.sparse)
    }

    /// Exports the packed arrays for parallel jobs that write component values in place.
    ///
    /// Membership is frozen while the snapshot lives; only values can change.
    #[inline]
    pub fn snapshot_mut(&mut self) -> SnapshotMut<'_, T> {
        SnapshotMut::new(&mut self.dense, &self.packed, &self.sparse)
    }

    /// Exports only the membership arrays.
    #[inline]
    #[must_use]
    pub fn id_view(&self) -> IdView<'_> {
        IdView::new(&self.packed, &self.sparse)
    }
}

impl<T> Index<EntityId> for ComponentStore<T> {
    type Output = T;

    fn index(&self, id: EntityId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("{id} holds no `{}`", std::any::type_name::<T>()),
        }
    }
}

impl<T> IndexMut<EntityId> for ComponentStore<T> {
    fn index_mut(&mut self, id: EntityId) -> &mut T {
        match self.dense_index(id) {
            Some(index) => &mut self.dense[index],
            None => panic!("{id} holds no `{}`", std::any::type_name::<T>()),
        }
    }
}

impl<'a, T> IntoIterator for &'a ComponentStore<T> {
    type Item = (EntityId, &'a T);
    type IntoIter = std::iter::Zip<
        std::iter::Copied<std::slice::Iter<'a, EntityId>>,
        std::slice::Iter<'a, T>,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.packed.iter().copied().zip(self.dense.iter())
    }
}
