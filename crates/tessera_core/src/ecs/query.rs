//! # Multi-Store Queries
//!
//! A query borrows several stores at once and walks the smallest of them:
//!
//! ```text
//!   Position  [e1 e2 e3 e4 e5 e6 e7]   7
//!   Velocity  [e2 e5 e7]               3
//!   Frozen    [e5]                     1   <- smallest: iterate this one,
//!                                             probe the other two by id
//! ```
//!
//! Work is proportional to the rarest component, not the most common one.

use super::component::Component;
use super::entity::EntityId;
use super::erased::{downcast_store_mut, AnyStore};
use super::registry::StoreRegistry;
use super::storage::ComponentStore;
use crate::error::{EcsError, EcsResult};

/// A tuple of up to five distinct component types.
///
/// Implemented for `(A,)` through `(A, B, C, D, E)`. Used both to borrow several
/// stores at once ([`Pools`]) and to attach or detach several components in one call.
pub trait ComponentSet: Sized + 'static {
    /// One mutable store reference per component type, in tuple order.
    type Stores<'w>;

    /// Number of component types in the set.
    const LEN: usize;

    /// Borrows every store in the set, creating absent ones.
    ///
    /// # Errors
    ///
    /// [`EcsError::AliasedStores`] if the same type appears twice.
    fn fetch(registry: &mut StoreRegistry) -> EcsResult<Self::Stores<'_>>;

    /// Returns the live count of the store at `position`.
    fn store_len(stores: &Self::Stores<'_>, position: usize) -> usize;

    /// Returns the packed ids of the store at `position`.
    fn packed_ids<'a>(stores: &'a Self::Stores<'_>, position: usize) -> &'a [EntityId];

    /// Checks if `id` holds every component of the set.
    fn contains(stores: &Self::Stores<'_>, id: EntityId) -> bool;

    /// Attaches each value in tuple order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first error returned by [`ComponentStore::add`]. Components attached before
    /// it stay attached.
    fn insert(self, registry: &mut StoreRegistry, id: EntityId) -> EcsResult<()>;

    /// Detaches each component in tuple order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// The first error returned by [`ComponentStore::remove`]. Components detached
    /// before it stay detached.
    fn remove(registry: &mut StoreRegistry, id: EntityId) -> EcsResult<()>;
}

fn typed<'a, T: Component>(
    store: Option<&'a mut (dyn AnyStore + 'static)>,
) -> EcsResult<&'a mut ComponentStore<T>> {
    let store = store.ok_or(EcsError::TypeMismatch {
        expected: std::any::type_name::<T>(),
    })?;
    downcast_store_mut(store)
}

/// Mutable borrows of several stores plus the position of the smallest one.
pub struct Pools<'w, S: ComponentSet> {
    stores: S::Stores<'w>,
    smallest: usize,
}

impl<'w, S: ComponentSet> Pools<'w, S> {
    /// Wraps borrowed stores, picking the one with the fewest live components.
    ///
    /// On ties the earliest position wins.
    pub fn new(stores: S::Stores<'w>) -> Self {
        let smallest = (0..S::LEN)
            .min_by_key(|&position| S::store_len(&stores, position))
            .unwrap_or(0);
        Self { stores, smallest }
    }

    /// Returns the tuple position of the smallest store.
    #[inline]
    #[must_use]
    pub fn smallest(&self) -> usize {
        self.smallest
    }

    /// Returns the live count of the smallest store.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        S::store_len(&self.stores, self.smallest)
    }

    /// Checks if the smallest store is empty, i.e. nothing can match.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entity at packed `index` of the smallest store.
    #[inline]
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<EntityId> {
        S::packed_ids(&self.stores, self.smallest).get(index).copied()
    }

    /// Iterates over the smallest store's entities. These are candidates, not matches.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        S::packed_ids(&self.stores, self.smallest).iter().copied()
    }

    /// Checks if `id` holds every component of the set.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        S::contains(&self.stores, id)
    }

    /// Iterates over the entities holding every component of the set.
    pub fn matching(&self) -> impl Iterator<Item = EntityId> + use<'_, 'w, S> {
        self.ids().filter(move |&id| self.contains(id))
    }

    /// Returns the borrowed stores.
    #[inline]
    #[must_use]
    pub fn stores(&self) -> &S::Stores<'w> {
        &self.stores
    }

    /// Returns the borrowed stores mutably.
    #[inline]
    pub fn stores_mut(&mut self) -> &mut S::Stores<'w> {
        &mut self.stores
    }

    /// Releases the wrapper, keeping the store borrows.
    #[inline]
    pub fn into_stores(self) -> S::Stores<'w> {
        self.stores
    }
}

macro_rules! impl_component_set {
    ($len:literal; $($name:ident $var:ident $idx:tt),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            type Stores<'w> = ($(&'w mut ComponentStore<$name>,)+);

            const LEN: usize = $len;

            fn fetch(registry: &mut StoreRegistry) -> EcsResult<Self::Stores<'_>> {
                let tags = [$(registry.register::<$name>()),+];
                let [$($var),+] =
                    registry.disjoint_stores(tags, std::any::type_name::<Self>())?;
                Ok(($(typed::<$name>($var)?,)+))
            }

            fn store_len(stores: &Self::Stores<'_>, position: usize) -> usize {
                match position {
                    $($idx => stores.$idx.len(),)+
                    _ => 0,
                }
            }

            fn packed_ids<'a>(
                stores: &'a Self::Stores<'_>,
                position: usize,
            ) -> &'a [EntityId] {
                match position {
                    $($idx => stores.$idx.packed_ids(),)+
                    _ => &[],
                }
            }

            fn contains(stores: &Self::Stores<'_>, id: EntityId) -> bool {
                $(stores.$idx.has(id))&&+
            }

            fn insert(self, registry: &mut StoreRegistry, id: EntityId) -> EcsResult<()> {
                let ($($var,)+) = self;
                $(registry.store_mut::<$name>()?.add(id, $var)?;)+
                Ok(())
            }

            fn remove(registry: &mut StoreRegistry, id: EntityId) -> EcsResult<()> {
                $(registry.store_mut::<$name>()?.remove(id)?;)+
                Ok(())
            }
        }

        impl<'w, $($name: Component),+> Pools<'w, ($($name,)+)> {
            /// Gets every component of `id`, or `None` if any is missing.
            pub fn get_mut(&mut self, id: EntityId) -> Option<($(&mut $name,)+)> {
                let ($($var,)+) = &mut self.stores;
                Some(($($var.get_mut(id)?,)+))
            }

            /// Calls `f` for every entity holding every component of the set, walking
            /// the smallest store in packed order.
            pub fn for_each(&mut self, mut f: impl FnMut(EntityId, $(&mut $name),+)) {
                for index in 0..self.len() {
                    let Some(id) = self.id_at(index) else { break };
                    if let Some(($($var,)+)) = self.get_mut(id) {
                        f(id, $($var),+);
                    }
                }
            }
        }
    };
}

impl_component_set!(1; A a 0);
impl_component_set!(2; A a 0, B b 1);
impl_component_set!(3; A a 0, B b 1, C c 2);
impl_component_set!(4; A a 0, B b 1, C c 2, D d 3);
impl_component_set!(5; A a 0, B b 1, C c 2, D d 3, E e 4);

/// Returns the index of the store with the fewest live components.
///
/// On ties the earliest index wins; `None` for an empty slice.
#[must_use]
pub fn smallest_store(stores: &[&dyn AnyStore]) -> Option<usize> {
    stores
        .iter()
        .enumerate()
        .min_by_key(|(_, store)| store.len())
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::ecs::SharedTypeTags;

    #[derive(Debug, PartialEq)]
    struct A(u32);
    #[derive(Debug, PartialEq)]
    struct B(u32);
    #[derive(Debug, PartialEq)]
    struct C(u32);

    fn fill<T: Component>(store: &mut ComponentStore<T>, count: u32, make: fn(u32) -> T) {
        for raw in 1..=count {
            let id = EntityId::new(raw.try_into().unwrap());
            store.add(id, make(raw)).unwrap();
        }
    }

    type Triple = (ComponentStore<A>, ComponentStore<B>, ComponentStore<C>);

    fn stores(a: u32, b: u32, c: u32) -> Triple {
        let mut sa = ComponentStore::new();
        let mut sb = ComponentStore::new();
        let mut sc = ComponentStore::new();
        fill(&mut sa, a, A);
        fill(&mut sb, b, B);
        fill(&mut sc, c, C);
        (sa, sb, sc)
    }

    #[test]
    fn test_smallest_picked_regardless_of_order() {
        let (mut a, mut b, mut c) = stores(3, 7, 1);

        let pools = Pools::<(A, B, C)>::new((&mut a, &mut b, &mut c));
        assert_eq!(pools.smallest(), 2);
        assert_eq!(pools.len(), 1);

        let pools = Pools::<(C, A, B)>::new((&mut c, &mut a, &mut b));
        assert_eq!(pools.smallest(), 0);

        let pools = Pools::<(B, C, A)>::new((&mut b, &mut c, &mut a));
        assert_eq!(pools.smallest(), 1);
        assert_eq!(pools.id_at(0), Some(EntityId::new(1)));
    }

    #[test]
    fn test_ties_pick_first() {
        let (mut a, mut b, _) = stores(4, 4, 0);
        let pools = Pools::<(A, B)>::new((&mut a, &mut b));
        assert_eq!(pools.smallest(), 0);
    }

    #[test]
    fn test_for_each_visits_intersection() {
        let (mut a, mut b, _) = stores(6, 0, 0);
        for raw in [2, 4, 9] {
            b.add(EntityId::new(raw), B(raw.into())).unwrap();
        }

        let mut pools = Pools::<(A, B)>::new((&mut a, &mut b));
        assert_eq!(pools.smallest(), 1);
        let matching: Vec<_> = pools.matching().collect();
        assert_eq!(matching, vec![EntityId::new(2), EntityId::new(4)]);

        let mut visited = Vec::new();
        pools.for_each(|id, a, b| {
            a.0 += b.0;
            visited.push(id);
        });
        assert_eq!(visited, matching);

        let (a, _) = pools.into_stores();
        assert_eq!(a.get(EntityId::new(4)), Some(&A(8)));
        assert_eq!(a.get(EntityId::new(3)), Some(&A(3)));
    }

    #[test]
    fn test_fetch_from_registry() {
        let mut registry = StoreRegistry::new(SharedTypeTags::new(), StoreConfig::default());
        (A(1), B(2)).insert(&mut registry, EntityId::new(1)).unwrap();

        let stores = <(A, B)>::fetch(&mut registry).unwrap();
        let mut pools = Pools::<(A, B)>::new(stores);
        let (a, b) = pools.get_mut(EntityId::new(1)).unwrap();
        assert_eq!((a.0, b.0), (1, 2));
        assert!(pools.get_mut(EntityId::new(2)).is_none());

        assert_eq!(
            <(A, A)>::fetch(&mut registry).err(),
            Some(EcsError::AliasedStores(std::any::type_name::<(A, A)>()))
        );
    }

    #[test]
    fn test_bundle_is_not_transactional() {
        let mut registry = StoreRegistry::new(SharedTypeTags::new(), StoreConfig::default());
        let id = EntityId::new(3);
        registry.store_mut::<B>().unwrap().add(id, B(0)).unwrap();

        // A goes in, then B fails as a duplicate, C is never reached.
        let result = (A(1), B(1), C(1)).insert(&mut registry, id);
        assert!(matches!(result, Err(EcsError::DuplicateComponent { .. })));
        assert!(registry.store::<A>().unwrap().has(id));
        assert!(!registry.store::<C>().is_some_and(|c| c.has(id)));

        assert!(<(A, B)>::remove(&mut registry, id).is_ok());
        assert!(!registry.store::<A>().unwrap().has(id));
    }

    #[test]
    fn test_smallest_store_erased() {
        let (a, b, c) = stores(3, 7, 1);
        assert_eq!(smallest_store(&[&a, &b, &c]), Some(2));
        assert_eq!(smallest_store(&[&c, &a, &b]), Some(0));
        assert_eq!(smallest_store(&[]), None);
    }
}
