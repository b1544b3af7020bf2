//! # Array Growth Policy
//!
//! Backing arrays grow in chunks: at least `min_grow` slots past the requested index,
//! plus half the current length capped at `max_grow_per_resize`. This avoids both
//! quadratic reallocation on steady appends and unbounded single-shot growth on
//! very large arrays.

use serde::Deserialize;

use crate::ecs::MAX_ENTITIES;
use crate::error::{EcsError, EcsResult};

/// Chunked growth parameters for a resizable backing array.
///
/// # Example
///
/// ```rust,ignore
/// let growth = GrowthPolicy::STORES;
/// let mut sparse: Vec<u32> = Vec::new();
/// growth.grow_to_fit(&mut sparse, 5, 0);
/// assert_eq!(sparse.len(), 105);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GrowthPolicy {
    /// Slots always added past the requested index.
    pub min_grow: usize,
    /// Cap on the proportional part of a single resize.
    pub max_grow_per_resize: usize,
}

impl GrowthPolicy {
    /// Growth used for the world's entity table.
    pub const ENTITIES: Self = Self {
        min_grow: 100,
        max_grow_per_resize: 1000,
    };

    /// Growth used for component store arrays.
    pub const STORES: Self = Self {
        min_grow: 100,
        max_grow_per_resize: 100,
    };

    /// Length an array of `current` slots should grow to so that `index` fits.
    ///
    /// Never more than [`MAX_ENTITIES`] slots unless `index` itself is past that.
    #[inline]
    #[must_use]
    pub fn grown_len(&self, current: usize, index: usize) -> usize {
        let proportional = (current / 2).min(self.max_grow_per_resize);
        let fit = index.saturating_add(1);
        index
            .saturating_add(self.min_grow)
            .saturating_add(proportional)
            .min(MAX_ENTITIES)
            .max(fit)
    }

    /// Checks that both parameters are usable for arrays of at most `ceiling` slots.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] prefixed with `field` if `min_grow` is zero
    /// or either parameter exceeds `ceiling`.
    pub fn validate(&self, field: &str, ceiling: usize) -> EcsResult<()> {
        if self.min_grow == 0 {
            return Err(EcsError::InvalidConfig(format!(
                "{field}.min_grow must be non-zero"
            )));
        }
        if self.min_grow > ceiling {
            return Err(EcsError::InvalidConfig(format!(
                "{field}.min_grow must be at most {ceiling}, got {}",
                self.min_grow
            )));
        }
        if self.max_grow_per_resize > ceiling {
            return Err(EcsError::InvalidConfig(format!(
                "{field}.max_grow_per_resize must be at most {ceiling}, got {}",
                self.max_grow_per_resize
            )));
        }
        Ok(())
    }

    /// Resizes `array` so `index` is in bounds, filling new slots with `fill`.
    ///
    /// Returns `true` if the array was resized.
    pub fn grow_to_fit<T: Clone>(&self, array: &mut Vec<T>, index: usize, fill: T) -> bool {
        if index < array.len() {
            return false;
        }
        let new_len = self.grown_len(array.len(), index);
        tracing::trace!(from = array.len(), to = new_len, "growing sparse array");
        array.resize(new_len, fill);
        true
    }

    /// Reserves room for `index` in an append-only array without changing its length.
    ///
    /// Returns `true` if the array was reallocated.
    pub fn reserve_for<T>(&self, array: &mut Vec<T>, index: usize) -> bool {
        if index < array.capacity() {
            return false;
        }
        let target = self.grown_len(array.capacity(), index);
        tracing::trace!(from = array.capacity(), to = target, "growing packed array");
        array.reserve_exact(target - array.len());
        true
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::STORES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grown_len_is_chunked() {
        let growth = GrowthPolicy::STORES;
        assert_eq!(growth.grown_len(0, 0), 100);
        assert_eq!(growth.grown_len(100, 100), 250);
        // Proportional part is capped.
        assert_eq!(growth.grown_len(10_000, 10_000), 10_200);
    }

    #[test]
    fn test_grow_to_fit_fills_new_slots() {
        let growth = GrowthPolicy {
            min_grow: 4,
            max_grow_per_resize: 8,
        };
        let mut array = vec![7u32; 2];
        assert!(growth.grow_to_fit(&mut array, 3, 0));
        assert_eq!(array.len(), 8);
        assert_eq!(&array[..3], &[7, 7, 0]);
        assert!(!growth.grow_to_fit(&mut array, 7, 0));
    }

    #[test]
    fn test_reserve_for_keeps_length() {
        let growth = GrowthPolicy::STORES;
        let mut array: Vec<u8> = Vec::new();
        assert!(growth.reserve_for(&mut array, 0));
        assert!(array.is_empty());
        assert!(array.capacity() >= 100);
        assert!(!growth.reserve_for(&mut array, 50));
    }

    #[test]
    fn test_zero_min_grow_still_fits_index() {
        let growth = GrowthPolicy {
            min_grow: 0,
            max_grow_per_resize: 0,
        };
        let mut array: Vec<u8> = Vec::new();
        growth.grow_to_fit(&mut array, 9, 0);
        assert_eq!(array.len(), 10);
    }

    #[test]
    fn test_grown_len_saturates_at_max_entities() {
        let growth = GrowthPolicy {
            min_grow: usize::MAX,
            max_grow_per_resize: usize::MAX,
        };
        assert_eq!(growth.grown_len(usize::MAX, 5), MAX_ENTITIES);
        assert_eq!(growth.grown_len(0, MAX_ENTITIES), MAX_ENTITIES + 1);
    }

    #[test]
    fn test_validate_bounds() {
        assert!(GrowthPolicy::STORES.validate("stores.growth", 1000).is_ok());
        let zero = GrowthPolicy {
            min_grow: 0,
            max_grow_per_resize: 10,
        };
        let huge_min = GrowthPolicy {
            min_grow: 1001,
            max_grow_per_resize: 10,
        };
        let huge_cap = GrowthPolicy {
            min_grow: 10,
            max_grow_per_resize: 1001,
        };
        for policy in [zero, huge_min, huge_cap] {
            assert!(matches!(
                policy.validate("stores.growth", 1000),
                Err(EcsError::InvalidConfig(_))
            ));
        }
    }
}
