//! # Pool Layouts
//!
//! Pool configuration as it is written in TOML files:
//!
//! ```toml
//! name = "Obstacles"
//! in_parent = true
//! reuse_pools = false
//! pooling_method = "InTurnPriorityOrder"
//! can_pool_same_type_next = false
//! seed = 42
//!
//! [[entries]]
//! prototype = "Cactus"
//! pool_size = 4
//! priority = 3
//!
//! [[entries]]
//! prototype = "Bird"
//! pool_size = 2
//! priority = 1
//! pool_can_increase = false
//! ```
//!
//! Layouts are loaded once at startup, validated, and then turned into
//! [`PoolEntry`] values through a [`PrototypeCatalog`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entry::PoolEntry;
use crate::error::{PoolError, PoolResult};
use crate::prototype::PrototypeCatalog;

/// How a multi-type pool picks the next instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolingMethod {
    /// Every instance of one type, then the next type, in configured order.
    SequentialOrder,
    /// One of each type in turn, in configured order.
    #[serde(alias = "InTurnTypeBased")]
    InTurnTypeOrder,
    /// Types in descending priority, each gated by its priority share.
    #[serde(alias = "InTurnPriorityBased")]
    InTurnPriorityOrder,
    /// Uniform over every instance in the registry.
    RandomUniformOverInstances,
    /// Uniform over instances, which weights each type by its population.
    #[default]
    #[serde(alias = "RandomTypeBased")]
    RandomWeightedByTypeCount,
    /// Uniform over types, then the first type with something to give.
    #[serde(alias = "RandomPoolBased")]
    RandomUniformOverPool,
    /// Random starting type, then priority-gated in turn.
    #[serde(alias = "RandomPriorityBased")]
    RandomWeightedByPriority,
}

impl PoolingMethod {
    /// Methods that walk a fixed instance order with a cursor.
    #[inline]
    #[must_use]
    pub const fn is_cursor_based(self) -> bool {
        matches!(self, Self::SequentialOrder | Self::InTurnTypeOrder)
    }

    /// Methods that fill round-robin and skip disabled entries while filling.
    #[inline]
    #[must_use]
    pub const fn skips_disabled_on_fill(self) -> bool {
        matches!(
            self,
            Self::SequentialOrder | Self::InTurnTypeOrder | Self::InTurnPriorityOrder
        )
    }

    /// Methods driven by the random generator.
    #[inline]
    #[must_use]
    pub const fn is_random(self) -> bool {
        matches!(
            self,
            Self::RandomUniformOverInstances
                | Self::RandomWeightedByTypeCount
                | Self::RandomUniformOverPool
                | Self::RandomWeightedByPriority
        )
    }
}

fn read_layout(path: &Path) -> PoolResult<String> {
    std::fs::read_to_string(path).map_err(|e| PoolError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

const fn default_true() -> bool {
    true
}

const fn default_single_size() -> usize {
    20
}

/// One `[[entries]]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySettings {
    /// Prototype name, resolved through the catalog.
    pub prototype: String,
    /// Instances created on fill.
    #[serde(default)]
    pub pool_size: usize,
    /// Weight for the priority policies.
    #[serde(default)]
    pub priority: u32,
    /// Whether the pool may grow this entry on demand.
    #[serde(default = "default_true")]
    pub pool_can_increase: bool,
    /// Whether the entry takes part in selection.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl EntrySettings {
    /// Builds the runtime entry, registering the prototype name.
    pub fn to_entry(&self, catalog: &mut PrototypeCatalog) -> PoolEntry {
        PoolEntry::new(catalog.register(&self.prototype), self.pool_size)
            .with_priority(self.priority)
            .with_growth(self.pool_can_increase)
            .with_enabled(self.enabled)
    }
}

/// Layout of a multi-type pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Pool name; also keys the container in reuse mode.
    pub name: String,
    /// Whether instances live in a named container.
    #[serde(default = "default_true")]
    pub in_parent: bool,
    /// Whether an existing container of the same name is adopted.
    #[serde(default)]
    pub reuse_pools: bool,
    /// Selection policy.
    #[serde(default)]
    pub pooling_method: PoolingMethod,
    /// Whether the same prototype may be handed out twice in a row.
    #[serde(default = "default_true")]
    pub can_pool_same_type_next: bool,
    /// Seed for the random policies; clock-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Prototypes of the pool, in configured order.
    #[serde(default)]
    pub entries: Vec<EntrySettings>,
}

impl PoolSettings {
    /// Creates settings with defaults and no entries.
    #[must_use]
    pub fn new(name: impl Into<String>, pooling_method: PoolingMethod) -> Self {
        Self {
            name: name.into(),
            in_parent: true,
            reuse_pools: false,
            pooling_method,
            can_pool_same_type_next: true,
            seed: None,
            entries: Vec::new(),
        }
    }

    /// Parses and validates a TOML layout.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] on malformed TOML or an invalid layout.
    pub fn from_toml_str(source: &str) -> PoolResult<Self> {
        let settings: Self =
            toml::from_str(source).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a TOML layout file.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Io`] if the file cannot be read, otherwise as
    /// [`PoolSettings::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        Self::from_toml_str(&read_layout(path.as_ref())?)
    }

    /// Renders the layout back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> PoolResult<String> {
        toml::to_string(self).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }

    /// Checks the layout for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] for an empty name, no entries, an
    /// empty prototype name, or the same prototype listed twice.
    pub fn validate(&self) -> PoolResult<()> {
        if self.name.trim().is_empty() {
            return Err(PoolError::InvalidConfig("pool name must not be empty".to_string()));
        }
        if self.entries.is_empty() {
            return Err(PoolError::InvalidConfig(format!(
                "pool {} must list at least one entry",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.prototype.trim().is_empty() {
                return Err(PoolError::InvalidConfig(format!(
                    "pool {} has an entry without a prototype",
                    self.name
                )));
            }
            if !seen.insert(entry.prototype.as_str()) {
                return Err(PoolError::InvalidConfig(format!(
                    "pool {} lists prototype {} twice",
                    self.name, entry.prototype
                )));
            }
        }
        Ok(())
    }

    /// Builds the runtime entries, in configured order.
    pub fn to_entries(&self, catalog: &mut PrototypeCatalog) -> Vec<PoolEntry> {
        self.entries
            .iter()
            .map(|entry| entry.to_entry(catalog))
            .collect()
    }
}

/// Layout of a single-type pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSettings {
    /// Pool name; also keys the container in reuse mode.
    pub name: String,
    /// Prototype name. A pool without one hands out nothing.
    #[serde(default)]
    pub prototype: Option<String>,
    /// Instances created on fill.
    #[serde(default = "default_single_size")]
    pub pool_size: usize,
    /// Whether the pool may grow on demand.
    #[serde(default = "default_true")]
    pub pool_can_increase: bool,
    /// Whether instances live in a named container.
    #[serde(default = "default_true")]
    pub in_parent: bool,
    /// Whether an existing container of the same name is adopted.
    #[serde(default)]
    pub reuse_pools: bool,
}

impl SingleSettings {
    /// Creates settings for `prototype` with the default size of 20.
    #[must_use]
    pub fn new(name: impl Into<String>, prototype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prototype: Some(prototype.into()),
            pool_size: default_single_size(),
            pool_can_increase: true,
            in_parent: true,
            reuse_pools: false,
        }
    }

    /// Parses a TOML layout.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] on malformed TOML or an empty name.
    pub fn from_toml_str(source: &str) -> PoolResult<Self> {
        let settings: Self =
            toml::from_str(source).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        if settings.name.trim().is_empty() {
            return Err(PoolError::InvalidConfig("pool name must not be empty".to_string()));
        }
        Ok(settings)
    }

    /// Reads and parses a TOML layout file.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Io`] if the file cannot be read, otherwise as
    /// [`SingleSettings::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        Self::from_toml_str(&read_layout(path.as_ref())?)
    }

    /// Builds the runtime entry, or `None` when no prototype is configured.
    pub fn to_entry(&self, catalog: &mut PrototypeCatalog) -> Option<PoolEntry> {
        self.prototype.as_deref().map(|name| {
            PoolEntry::new(catalog.register(name), self.pool_size)
                .with_growth(self.pool_can_increase)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBSTACLES: &str = r#"
        name = "Obstacles"
        pooling_method = "InTurnPriorityOrder"
        can_pool_same_type_next = false
        seed = 42

        [[entries]]
        prototype = "Cactus"
        pool_size = 4
        priority = 3

        [[entries]]
        prototype = "Bird"
        pool_size = 2
        priority = 1
        pool_can_increase = false
        enabled = false
    "#;

    #[test]
    fn test_parse_full_layout() {
        let settings = PoolSettings::from_toml_str(OBSTACLES).unwrap();
        assert_eq!(settings.name, "Obstacles");
        assert!(settings.in_parent);
        assert!(!settings.reuse_pools);
        assert_eq!(settings.pooling_method, PoolingMethod::InTurnPriorityOrder);
        assert!(!settings.can_pool_same_type_next);
        assert_eq!(settings.seed, Some(42));
        assert_eq!(settings.entries.len(), 2);
        assert!(settings.entries[0].pool_can_increase);
        assert!(!settings.entries[1].pool_can_increase);
        assert!(!settings.entries[1].enabled);
    }

    #[test]
    fn test_original_method_names_accepted() {
        for (name, method) in [
            ("InTurnTypeBased", PoolingMethod::InTurnTypeOrder),
            ("InTurnPriorityBased", PoolingMethod::InTurnPriorityOrder),
            ("RandomPoolBased", PoolingMethod::RandomUniformOverPool),
            ("RandomTypeBased", PoolingMethod::RandomWeightedByTypeCount),
            ("RandomPriorityBased", PoolingMethod::RandomWeightedByPriority),
            ("SequentialOrder", PoolingMethod::SequentialOrder),
        ] {
            let source = format!(
                "name = \"P\"\npooling_method = \"{name}\"\n[[entries]]\nprototype = \"A\"\n"
            );
            let settings = PoolSettings::from_toml_str(&source).unwrap();
            assert_eq!(settings.pooling_method, method, "{name}");
        }
    }

    #[test]
    fn test_default_method() {
        let settings =
            PoolSettings::from_toml_str("name = \"P\"\n[[entries]]\nprototype = \"A\"\n").unwrap();
        assert_eq!(settings.pooling_method, PoolingMethod::RandomWeightedByTypeCount);
        assert!(settings.can_pool_same_type_next);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            PoolSettings::from_toml_str("name = \"P\""),
            Err(PoolError::InvalidConfig(_))
        ));
        assert!(matches!(
            PoolSettings::from_toml_str("name = \"\"\n[[entries]]\nprototype = \"A\"\n"),
            Err(PoolError::InvalidConfig(_))
        ));
        let twice =
            "name = \"P\"\n[[entries]]\nprototype = \"A\"\n[[entries]]\nprototype = \"A\"\n";
        assert!(matches!(
            PoolSettings::from_toml_str(twice),
            Err(PoolError::InvalidConfig(message)) if message.contains("twice")
        ));
        assert!(matches!(
            PoolSettings::from_toml_str("name = 3"),
            Err(PoolError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PoolSettings::from_toml_file("/nonexistent/pool.toml"),
            Err(PoolError::Io { .. })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = PoolSettings::from_toml_str(OBSTACLES).unwrap();
        let rendered = settings.to_toml_string().unwrap();
        assert_eq!(PoolSettings::from_toml_str(&rendered).unwrap(), settings);
    }

    #[test]
    fn test_entries_share_catalog_ids() {
        let settings = PoolSettings::from_toml_str(OBSTACLES).unwrap();
        let mut catalog = PrototypeCatalog::new();
        let bird = catalog.register("Bird");
        let entries = settings.to_entries(&mut catalog);

        assert_eq!(entries[1].id(), bird.id);
        assert_eq!(entries[0].capacity, 4);
        assert_eq!(entries[0].priority, 3);
        assert!(!entries[1].enabled);
    }

    #[test]
    fn test_single_settings() {
        let settings =
            SingleSettings::from_toml_str("name = \"Chests\"\nprototype = \"Chest\"\n").unwrap();
        assert_eq!(settings.pool_size, 20);
        assert!(settings.pool_can_increase);

        let mut catalog = PrototypeCatalog::new();
        let entry = settings.to_entry(&mut catalog).unwrap();
        assert_eq!(entry.prototype.name, "Chest");

        let empty = SingleSettings::from_toml_str("name = \"Nothing\"").unwrap();
        assert!(empty.to_entry(&mut catalog).is_none());
    }
}
