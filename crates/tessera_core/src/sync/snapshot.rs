//! # Snapshot Views
//!
//! Point-in-time exports of a store's packed arrays for work running outside the
//! world, typically on worker threads.
//!
//! ```text
//!   ComponentStore<T>
//!   ┌───────────────┐   snapshot()      ┌───────────────┐
//!   │ dense  [T]    │ ────────────────► │ Snapshot<T>   │  Copy + Send + Sync
//!   │ packed [Id]   │                   │ (read-only)   │  ──► N readers
//!   │ sparse [Raw]  │   snapshot_mut()  ├───────────────┤
//!   └───────────────┘ ────────────────► │ SnapshotMut<T>│  chunks_mut()
//!                                       │ (values only) │  ──► N writers
//!                                       └───────────────┘
//! ```
//!
//! Every view borrows its store. While a view (or any copy of it) is alive the store
//! cannot be mutated, so a resize or swap-remove can never move data under a reader.
//! The store provides no locking of its own: finishing the parallel work before the
//! next mutation is the borrow's job.

use bytemuck::Pod;

use crate::ecs::{EntityId, RawId};

fn slot_in(sparse: &[RawId], id: EntityId) -> Option<usize> {
    match sparse.get(id.index()) {
        Some(&slot) if slot != 0 => Some(slot as usize - 1),
        _ => None,
    }
}

/// Ids-only view of a store: packed ids plus the sparse index.
///
/// Used inside jobs to probe membership of a second store ("skip entities that also
/// hold `Frozen`") without touching its values.
#[derive(Clone, Copy, Debug)]
pub struct IdView<'a> {
    packed: &'a [EntityId],
    sparse: &'a [RawId],
}

impl<'a> IdView<'a> {
    pub(crate) fn new(packed: &'a [EntityId], sparse: &'a [RawId]) -> Self {
        Self { packed, sparse }
    }

    /// Returns the number of members.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.packed.len()
    }

    /// Checks if the view has no members.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packed.is_empty()
    }

    /// Checks if `id` is a member.
    #[inline]
    #[must_use]
    pub fn has(&self, id: EntityId) -> bool {
        slot_in(self.sparse, id).is_some()
    }

    /// Returns the 0-based dense index of `id`.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, id: EntityId) -> Option<usize> {
        slot_in(self.sparse, id)
    }

    /// Returns the member at dense `index`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> Option<EntityId> {
        self.packed.get(index).copied()
    }

    /// Returns the members in packed order.
    #[inline]
    #[must_use]
    pub fn ids(&self) -> &'a [EntityId] {
        self.packed
    }

    /// Releases the view.
    #[inline]
    pub fn dispose(self) {}
}

/// Read-only snapshot of a store's packed arrays.
///
/// `packed_ids()[i]` owns `dense()[i]` for every `i < len()`.
#[derive(Debug)]
pub struct Snapshot<'a, T> {
    dense: &'a [T],
    packed: &'a [EntityId],
    sparse: &'a [RawId],
}

impl<T> Clone for Snapshot<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Snapshot<'_, T> {}

impl<'a, T> Snapshot<'a, T> {
    pub(crate) fn new(dense: &'a [T], packed: &'a [EntityId], sparse: &'a [RawId]) -> Self {
        Self {
            dense,
            packed,
            sparse,
        }
    }

    /// Returns the number of components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Checks if the snapshot holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Checks if `id` holds a component.
    #[inline]
    #[must_use]
    pub fn has(&self, id: EntityId) -> bool {
        slot_in(self.sparse, id).is_some()
    }

    /// Returns the 0-based dense index of `id`.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, id: EntityId) -> Option<usize> {
        slot_in(self.sparse, id)
    }

    /// Gets the component of `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&'a T> {
        self.dense.get(slot_in(self.sparse, id)?)
    }

    /// Returns the entity owning dense `index`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> Option<EntityId> {
        self.packed.get(index).copied()
    }

    /// Returns the component values in packed order.
    #[inline]
    #[must_use]
    pub fn dense(&self) -> &'a [T] {
        self.dense
    }

    /// Returns the owning entities in packed order.
    #[inline]
    #[must_use]
    pub fn packed_ids(&self) -> &'a [EntityId] {
        self.packed
    }

    /// Iterates over the owning entities in packed order.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + 'a {
        self.packed.iter().copied()
    }

    /// Iterates over all components with their entities.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &'a T)> + 'a {
        self.packed.iter().copied().zip(self.dense.iter())
    }

    /// Returns the membership arrays on their own.
    #[inline]
    #[must_use]
    pub fn id_view(&self) -> IdView<'a> {
        IdView::new(self.packed, self.sparse)
    }

    /// Copies the arrays into an owned snapshot that outlives the store borrow.
    #[must_use]
    pub fn to_owned(self) -> OwnedSnapshot<T>
    where
        T: Clone,
    {
        OwnedSnapshot {
            dense: self.dense.to_vec(),
            packed: self.packed.to_vec(),
            sparse: self.sparse.to_vec(),
        }
    }

    /// Releases the snapshot.
    #[inline]
    pub fn dispose(self) {}
}

impl<'a, T: Pod> Snapshot<'a, T> {
    /// Returns the component values as raw bytes, without copying.
    #[inline]
    #[must_use]
    pub fn dense_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.dense)
    }

    /// Returns the owning entities as raw bytes, without copying.
    #[inline]
    #[must_use]
    pub fn packed_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.packed)
    }
}

/// Snapshot for jobs that update component values in place.
///
/// Membership is read-only; only values can be written.
#[derive(Debug)]
pub struct SnapshotMut<'a, T> {
    dense: &'a mut [T],
    packed: &'a [EntityId],
    sparse: &'a [RawId],
}

impl<'a, T> SnapshotMut<'a, T> {
    pub(crate) fn new(dense: &'a mut [T], packed: &'a [EntityId], sparse: &'a [RawId]) -> Self {
        Self {
            dense,
            packed,
            sparse,
        }
    }

    /// Returns the number of components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Checks if the snapshot holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Checks if `id` holds a component.
    #[inline]
    #[must_use]
    pub fn has(&self, id: EntityId) -> bool {
        slot_in(self.sparse, id).is_some()
    }

    /// Gets the component of `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.dense.get(slot_in(self.sparse, id)?)
    }

    /// Gets the component of `id` mutably.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.dense.get_mut(slot_in(self.sparse, id)?)
    }

    /// Returns the entity owning dense `index`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> Option<EntityId> {
        self.packed.get(index).copied()
    }

    /// Iterates mutably over all components with their entities.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.packed.iter().copied().zip(self.dense.iter_mut())
    }

    /// Splits the packed arrays into disjoint chunks of at most `chunk_size` elements.
    ///
    /// Each chunk pairs the owning ids with their values and can be moved to its own
    /// worker thread.
    pub fn chunks_mut(
        &mut self,
        chunk_size: usize,
    ) -> impl Iterator<Item = (&[EntityId], &mut [T])> {
        let chunk_size = chunk_size.max(1);
        self.packed
            .chunks(chunk_size)
            .zip(self.dense.chunks_mut(chunk_size))
    }

    /// Returns a read-only snapshot borrowing from this one.
    #[inline]
    #[must_use]
    pub fn as_snapshot(&self) -> Snapshot<'_, T> {
        Snapshot::new(self.dense, self.packed, self.sparse)
    }

    /// Returns the membership arrays on their own.
    #[inline]
    #[must_use]
    pub fn id_view(&self) -> IdView<'a> {
        IdView::new(self.packed, self.sparse)
    }

    /// Releases the snapshot.
    #[inline]
    pub fn dispose(self) {}
}

/// By-value copy of a store's packed arrays.
///
/// Unlike [`Snapshot`] it does not borrow the store, so it can be sent to a thread
/// that outlives the current frame. It reflects the store at the time of the copy.
#[derive(Clone, Debug, Default)]
pub struct OwnedSnapshot<T> {
    dense: Vec<T>,
    packed: Vec<EntityId>,
    sparse: Vec<RawId>,
}

impl<T> OwnedSnapshot<T> {
    /// Borrows the copy as a [`Snapshot`].
    #[inline]
    #[must_use]
    pub fn as_snapshot(&self) -> Snapshot<'_, T> {
        Snapshot::new(&self.dense, &self.packed, &self.sparse)
    }

    /// Returns the number of components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Checks if the copy holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Splits the copy into its values and owning ids, in packed order.
    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, Vec<EntityId>) {
        (self.dense, self.packed)
    }
}

#[cfg(test)]
mod tests {
    use crate::ecs::{ComponentStore, EntityId};

    #[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
    #[repr(C)]
    struct Heat(f32);

    fn store_with(ids: &[u16]) -> ComponentStore<Heat> {
        let mut store = ComponentStore::new();
        for &raw in ids {
            let id = EntityId::new(raw.into());
            store.add(id, Heat(f32::from(raw))).unwrap();
        }
        store
    }

    #[test]
    fn test_snapshot_matches_store() {
        let mut store = store_with(&[3, 8, 5]);
        store.remove(EntityId::new(3)).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.has(EntityId::new(8)));
        assert!(!snapshot.has(EntityId::new(3)));
        assert!(!snapshot.has(EntityId::new(4000)));
        for (index, id) in snapshot.ids().enumerate() {
            assert_eq!(snapshot.dense_index(id), Some(index));
            assert_eq!(snapshot.entity_at(index), Some(id));
            assert_eq!(snapshot.get(id), store.get(id));
        }
        snapshot.dispose();
    }

    #[test]
    fn test_snapshot_byte_views() {
        let store = store_with(&[1, 2]);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.dense_bytes().len(), 2 * std::mem::size_of::<Heat>());
        assert_eq!(
            snapshot.packed_bytes().len(),
            2 * std::mem::size_of::<EntityId>()
        );
    }

    #[test]
    fn test_snapshot_shared_across_threads() {
        let store = store_with(&[1, 2, 3, 4, 5, 6]);
        let snapshot = store.snapshot();

        let total: f32 = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..3)
                .map(|worker| {
                    scope.spawn(move || {
                        snapshot
                            .iter()
                            .skip(worker)
                            .step_by(3)
                            .map(|(_, heat)| heat.0)
                            .sum::<f32>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert!((total - 21.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_chunks_mut_on_worker_threads() {
        let mut store = store_with(&[10, 20, 30, 40, 50]);
        let frozen = store_with(&[20, 50]);
        let frozen_ids = frozen.id_view();

        let mut snapshot = store.snapshot_mut();
        std::thread::scope(|scope| {
            for (ids, values) in snapshot.chunks_mut(2) {
                scope.spawn(move || {
                    for (id, value) in ids.iter().zip(values.iter_mut()) {
                        if !frozen_ids.has(*id) {
                            value.0 += 1.0;
                        }
                    }
                });
            }
        });
        snapshot.dispose();

        assert_eq!(store.get(EntityId::new(10)), Some(&Heat(11.0)));
        assert_eq!(store.get(EntityId::new(20)), Some(&Heat(20.0)));
        assert_eq!(store.get(EntityId::new(50)), Some(&Heat(50.0)));
        assert_eq!(store.get(EntityId::new(40)), Some(&Heat(41.0)));
    }

    #[test]
    fn test_owned_snapshot_outlives_store() {
        let owned = {
            let store = store_with(&[7, 9]);
            store.snapshot().to_owned()
        };

        let handle = std::thread::spawn(move || {
            let view = owned.as_snapshot();
            view.get(EntityId::new(9)).copied()
        });
        assert_eq!(handle.join().unwrap(), Some(Heat(9.0)));
    }
}
