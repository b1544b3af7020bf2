//! # Type-Erased Stores
//!
//! The registry keeps every store behind [`AnyStore`] so it can sweep all of them
//! when an entity is destroyed, and so values whose type is only known at runtime
//! can be routed by tag.

use std::any::{Any, TypeId};

use super::component::Component;
use super::entity::EntityId;
use super::storage::ComponentStore;
use crate::error::{EcsError, EcsResult};
use crate::sync::IdView;

/// A component value whose type is only known at runtime.
pub type BoxedComponent = Box<dyn Any + Send + Sync>;

/// Object-safe view of a [`ComponentStore`].
pub trait AnyStore: Send + Sync + 'static {
    /// Returns the type id of the stored component.
    fn component_type(&self) -> TypeId;

    /// Returns the stored component's type name.
    fn type_name(&self) -> &'static str;

    /// Returns the number of live components.
    fn len(&self) -> usize;

    /// Checks if the store holds no components.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if `id` holds a component in this store.
    fn has(&self, id: EntityId) -> bool;

    /// Returns the owning entities in packed order.
    fn packed_ids(&self) -> &[EntityId];

    /// Exports the membership arrays.
    fn id_view(&self) -> IdView<'_>;

    /// Gets `id`'s component as `dyn Any`.
    fn get_any(&self, id: EntityId) -> Option<&dyn Any>;

    /// Gets `id`'s component mutably as `dyn Any`.
    fn get_any_mut(&mut self, id: EntityId) -> Option<&mut dyn Any>;

    /// Attaches a boxed value, following the store's policy.
    ///
    /// # Errors
    ///
    /// [`EcsError::TypeMismatch`] if the box does not hold the store's type, plus
    /// every error [`ComponentStore::add`] can return.
    fn add_boxed(&mut self, id: EntityId, value: BoxedComponent) -> EcsResult<()>;

    /// Detaches `id`'s component, following the store's policy.
    ///
    /// # Errors
    ///
    /// Every error [`ComponentStore::remove`] can return.
    fn remove_checked(&mut self, id: EntityId) -> EcsResult<()>;

    /// Detaches `id`'s component if present. Returns whether one was removed.
    fn remove_entity(&mut self, id: EntityId) -> bool;

    /// Removes every component.
    fn clear(&mut self);

    /// Upcasts for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn component_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn has(&self, id: EntityId) -> bool {
        ComponentStore::has(self, id)
    }

    fn packed_ids(&self) -> &[EntityId] {
        ComponentStore::packed_ids(self)
    }

    fn id_view(&self) -> IdView<'_> {
        ComponentStore::id_view(self)
    }

    fn get_any(&self, id: EntityId) -> Option<&dyn Any> {
        self.get(id).map(|value| value as &dyn Any)
    }

    fn get_any_mut(&mut self, id: EntityId) -> Option<&mut dyn Any> {
        self.get_mut(id).map(|value| value as &mut dyn Any)
    }

    fn add_boxed(&mut self, id: EntityId, value: BoxedComponent) -> EcsResult<()> {
        let value = value.downcast::<T>().map_err(|_| EcsError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })?;
        self.add(id, *value)
    }

    fn remove_checked(&mut self, id: EntityId) -> EcsResult<()> {
        self.remove(id).map(drop)
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.take(id).is_some()
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Downcasts a type-erased store to its concrete type.
///
/// # Errors
///
/// [`EcsError::TypeMismatch`] if the store does not hold `T`.
pub fn downcast_store<T: Component>(store: &dyn AnyStore) -> EcsResult<&ComponentStore<T>> {
    store
        .as_any()
        .downcast_ref::<ComponentStore<T>>()
        .ok_or(EcsError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

/// Downcasts a type-erased store to its concrete type, mutably.
///
/// # Errors
///
/// [`EcsError::TypeMismatch`] if the store does not hold `T`.
pub fn downcast_store_mut<T: Component>(
    store: &mut dyn AnyStore,
) -> EcsResult<&mut ComponentStore<T>> {
    store
        .as_any_mut()
        .downcast_mut::<ComponentStore<T>>()
        .ok_or(EcsError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Mass(f32);

    #[test]
    fn test_boxed_add_and_remove() {
        let mut store: Box<dyn AnyStore> = Box::new(ComponentStore::<Mass>::new());
        let id = EntityId::new(4);

        store.add_boxed(id, Box::new(Mass(2.5))).unwrap();
        assert!(store.has(id));
        assert_eq!(store.len(), 1);
        assert_eq!(store.packed_ids(), &[id]);
        assert_eq!(
            store.get_any(id).and_then(|v| v.downcast_ref::<Mass>()),
            Some(&Mass(2.5))
        );

        assert!(store.remove_entity(id));
        assert!(!store.remove_entity(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_boxed_type_mismatch() {
        let mut store: Box<dyn AnyStore> = Box::new(ComponentStore::<Mass>::new());
        let result = store.add_boxed(EntityId::new(1), Box::new(7u8));
        assert!(matches!(result, Err(EcsError::TypeMismatch { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_downcast() {
        let mut store: Box<dyn AnyStore> = Box::new(ComponentStore::<Mass>::new());
        downcast_store_mut::<Mass>(store.as_mut())
            .unwrap()
            .add(EntityId::new(2), Mass(1.0))
            .unwrap();

        assert_eq!(
            downcast_store::<Mass>(store.as_ref()).unwrap().get(EntityId::new(2)),
            Some(&Mass(1.0))
        );
        assert!(downcast_store::<u32>(store.as_ref()).is_err());
        assert!(store.remove_checked(EntityId::new(9)).is_err());
    }
}
