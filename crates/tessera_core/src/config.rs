//! # Engine Configuration
//!
//! Capacity hints, growth tuning and the precondition policy. Loaded once at
//! startup, typically from a TOML file:
//!
//! ```toml
//! max_entities = 50000
//! policy = "permissive"
//!
//! [entity_growth]
//! min_grow = 100
//! max_grow_per_resize = 1000
//!
//! [stores]
//! expected_size = 1024
//!
//! [stores.growth]
//! min_grow = 64
//! max_grow_per_resize = 256
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::ecs::MAX_ENTITIES;
use crate::error::{EcsError, EcsResult};
use crate::memory::GrowthPolicy;

/// What happens when a caller breaks an operation's precondition
/// (double add, removing an absent component, destroying a dead entity).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    /// Return an [`EcsError`] to the caller.
    #[default]
    Strict,
    /// Log a warning and treat the call as a no-op.
    Permissive,
}

impl ViolationPolicy {
    /// Applies the policy to a violation: `Err` when strict, `Ok(fallback)` when permissive.
    #[inline]
    pub(crate) fn apply<T>(self, error: EcsError, fallback: T) -> EcsResult<T> {
        match self {
            Self::Strict => Err(error),
            Self::Permissive => {
                tracing::warn!(%error, "ignoring precondition violation");
                Ok(fallback)
            }
        }
    }
}

/// Per-store tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of components to pre-allocate room for.
    pub expected_size: usize,
    /// Growth of the packed and sparse arrays.
    pub growth: GrowthPolicy,
    /// Precondition policy. Inherited from [`WorldConfig::policy`] for world-owned stores.
    #[serde(skip)]
    pub policy: ViolationPolicy,
}

impl StoreConfig {
    /// Config with a capacity hint and default growth.
    #[must_use]
    pub fn with_expected_size(expected_size: usize) -> Self {
        Self {
            expected_size,
            ..Self::default()
        }
    }

    /// Checks the capacity hint against `max_entities` and growth against [`MAX_ENTITIES`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the offending field.
    pub fn validate(&self, max_entities: usize) -> EcsResult<()> {
        if self.expected_size > max_entities {
            return Err(EcsError::InvalidConfig(format!(
                "stores.expected_size must be at most {max_entities}, got {}",
                self.expected_size
            )));
        }
        self.growth.validate("stores.growth", MAX_ENTITIES)
    }
}

/// World-level configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Exclusive upper bound on entity identifiers (never above [`MAX_ENTITIES`]).
    pub max_entities: usize,
    /// Growth of the entity table.
    pub entity_growth: GrowthPolicy,
    /// Template for every store the world creates.
    pub stores: StoreConfig,
    /// Precondition policy for entity and store operations.
    pub policy: ViolationPolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_ENTITIES,
            entity_growth: GrowthPolicy::ENTITIES,
            stores: StoreConfig::default(),
            policy: ViolationPolicy::Strict,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the document does not parse or fails
    /// [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or is invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            EcsError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), ?config, "loaded world config");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities < 2 || self.max_entities > MAX_ENTITIES {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities must be in 2..={MAX_ENTITIES}, got {}",
                self.max_entities
            )));
        }
        self.entity_growth.validate("entity_growth", MAX_ENTITIES)?;
        self.stores.validate(self.max_entities)
    }

    /// Store config handed to every store this world creates.
    #[inline]
    #[must_use]
    pub(crate) fn store_config(&self) -> StoreConfig {
        StoreConfig {
            policy: self.policy,
            ..self.stores
        }
    }
}
