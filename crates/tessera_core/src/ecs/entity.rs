//! # Entity Management
//!
//! Entities are bare integer identifiers. All of an entity's state lives in the
//! component stores keyed by that integer; the entity table only records which
//! identifiers are currently alive.
//!
//! Identifiers carry no generation: once an id is destroyed it may be handed out
//! again to an unrelated entity, and code holding the stale id cannot tell the two
//! apart.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::error::{EcsError, EcsResult};
use crate::memory::GrowthPolicy;

/// Integer width of an entity identifier.
///
/// 32-bit by default; the `short-ids` feature selects 16-bit identifiers, halving the
/// sparse-array footprint at the cost of a much smaller identifier space.
#[cfg(not(feature = "short-ids"))]
pub type RawId = u32;

/// Integer width of an entity identifier.
#[cfg(feature = "short-ids")]
pub type RawId = u16;

/// Exclusive upper bound on entity identifiers for the chosen [`RawId`] width.
pub const MAX_ENTITIES: usize = RawId::MAX as usize;

/// Unique identifier for an entity.
///
/// Zero is reserved as [`EntityId::NULL`]; live entities are numbered from 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct EntityId(RawId);

impl EntityId {
    /// Null/unassigned entity ID.
    pub const NULL: Self = Self(0);

    /// Wraps a raw identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: RawId) -> Self {
        Self(raw)
    }

    /// Converts an array index into an identifier, if it fits in [`RawId`].
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        RawId::try_from(index).ok().map(Self)
    }

    /// Returns the raw integer.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> RawId {
        self.0
    }

    /// Returns the identifier as an index into sparse arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this entity ID is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// One slot of the entity table.
///
/// A slot is alive when its recorded id equals its own index; dead slots hold
/// [`EntityId::NULL`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Entity {
    /// The identifier recorded in this slot.
    pub id: EntityId,
}

impl Entity {
    /// Creates a live slot for `id`.
    #[inline]
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self { id }
    }

    /// Creates a dead/empty slot.
    #[inline]
    #[must_use]
    pub const fn dead() -> Self {
        Self { id: EntityId::NULL }
    }
}

/// Entity identifier allocator and recycler.
///
/// Freed identifiers are reused last-in first-out before the high-water counter is
/// advanced. Every id in `1..=entity_count()` is either alive or on the free list,
/// never both.
#[derive(Debug)]
pub struct Entities {
    /// Entity table, indexed by id. Slot 0 is never alive.
    slots: Vec<Entity>,
    /// Recycled identifiers, popped from the back.
    free: Vec<EntityId>,
    /// Highest identifier ever handed out.
    high_water: usize,
    /// Number of currently alive entities.
    live: usize,
    /// Exclusive upper bound on identifiers.
    limit: usize,
    /// Growth of the entity table.
    growth: GrowthPolicy,
}

impl Entities {
    /// Creates an empty allocator handing out identifiers below `limit`.
    ///
    /// `limit` is clamped to [`MAX_ENTITIES`].
    #[must_use]
    pub fn new(limit: usize, growth: GrowthPolicy) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            high_water: 0,
            live: 0,
            limit: limit.min(MAX_ENTITIES),
            growth,
        }
    }

    /// Allocates an identifier, reusing the most recently freed one if any.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::CapacityExhausted`] when the free list is empty and the
    /// counter has reached the limit.
    pub fn allocate(&mut self) -> EcsResult<EntityId> {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                let next = self.high_water + 1;
                if next >= self.limit {
                    return Err(EcsError::CapacityExhausted { limit: self.limit });
                }
                let id = EntityId::from_index(next)
                    .ok_or(EcsError::CapacityExhausted { limit: self.limit })?;
                self.high_water = next;
                id
            }
        };

        self.growth
            .grow_to_fit(&mut self.slots, id.index(), Entity::dead());
        self.slots[id.index()] = Entity::new(id);
        self.live += 1;

        Ok(id)
    }

    /// Marks a live identifier dead and pushes it on the free list.
    ///
    /// Returns `false` (and changes nothing) if `id` is not alive.
    pub fn release(&mut self, id: EntityId) -> bool {
        if !self.is_live(id) {
            return false;
        }
        self.slots[id.index()] = Entity::dead();
        self.free.push(id);
        self.live -= 1;
        true
    }

    /// Checks if an identifier is in bounds and alive.
    #[inline]
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        !id.is_null()
            && self
                .slots
                .get(id.index())
                .is_some_and(|slot| slot.id == id)
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Returns the highest identifier ever handed out.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.high_water
    }

    /// Returns the number of identifiers waiting to be reused.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the recycled identifiers; the last one is reused first.
    #[inline]
    #[must_use]
    pub fn free_list(&self) -> &[EntityId] {
        &self.free
    }

    /// Returns the exclusive upper bound on identifiers.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Iterates over alive identifiers in ascending order.
    pub fn iter_live(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .filter(|slot| !slot.id.is_null())
            .map(|slot| slot.id)
    }
}
