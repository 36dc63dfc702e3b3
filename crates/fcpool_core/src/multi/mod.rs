//! # Multi-Type Pool
//!
//! A pool of several prototypes with a configurable selection policy.
//!
//! ## Fill order
//!
//! | method                      | fill                                    |
//! |-----------------------------|-----------------------------------------|
//! | `SequentialOrder`           | entry by entry, configured order        |
//! | `InTurnTypeOrder`           | round-robin, configured order           |
//! | `InTurnPriorityOrder`       | round-robin, descending priority        |
//! | random methods              | entry by entry, shuffled order          |
//!
//! The round-robin and sequential fills skip disabled entries; the random
//! fills instantiate them anyway so they can be enabled later.

mod selection;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{PoolSettings, PoolingMethod};
use crate::container::{ContainerOptions, PoolContainers, PoolKind, SharedRegistry};
use crate::entry::PoolEntry;
use crate::error::PoolError;
use crate::pool::{FillSummary, ObjectPool};
use crate::prototype::{Poolable, PrototypeCatalog, PrototypeId, PrototypeProvider};
use crate::registry::{InstanceId, Registry};
use crate::rng::PoolRng;

pub use selection::SelectionState;
use selection::{instantiate, Selector};

/// Construction options of a [`MultiTypePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiTypeOptions {
    /// Selection policy.
    pub method: PoolingMethod,
    /// Whether the same prototype may be handed out twice in a row.
    /// Forced on when the pool has fewer than two entries.
    pub can_pool_same_type_next: bool,
    /// Seed of the random policies; clock-seeded when `None`.
    pub seed: Option<u64>,
    /// Container placement.
    pub container: ContainerOptions,
}

impl Default for MultiTypeOptions {
    fn default() -> Self {
        Self {
            method: PoolingMethod::default(),
            can_pool_same_type_next: true,
            seed: None,
            container: ContainerOptions::default(),
        }
    }
}

impl MultiTypeOptions {
    /// Default options with the given policy.
    #[must_use]
    pub fn with_method(method: PoolingMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }
}

/// A pool of several prototypes.
///
/// # Example
///
/// ```rust,ignore
/// let settings = PoolSettings::from_toml_str(layout)?;
/// let mut obstacles =
///     MultiTypePool::from_settings(&settings, &mut catalog, make_obstacle, &mut containers);
/// if let Some(id) = obstacles.spawn(now) {
///     obstacles.with_instance_mut(id, |o| o.x = spawn_x);
/// }
/// ```
pub struct MultiTypePool<T, P> {
    name: String,
    provider: P,
    registry: SharedRegistry<T>,
    container: Option<String>,
    selector: Selector,
    last_fill: FillSummary,
}

impl<T, P> MultiTypePool<T, P>
where
    T: Poolable,
    P: PrototypeProvider<T>,
{
    /// Creates the pool, attaches it to its container and fills it.
    pub fn new(
        name: impl Into<String>,
        entries: Vec<PoolEntry>,
        options: MultiTypeOptions,
        provider: P,
        containers: &mut PoolContainers<T>,
    ) -> Self {
        let name = name.into();
        let attachment = containers.attach(PoolKind::MultiType, &name, options.container);
        let selector = Selector::new(
            options.method,
            options.can_pool_same_type_next,
            entries,
            PoolRng::from_seed_option(options.seed),
        );
        let mut pool = Self {
            name,
            provider,
            registry: attachment.registry,
            container: attachment.container,
            selector,
            last_fill: FillSummary {
                reused: attachment.reused,
                ..FillSummary::default()
            },
        };
        pool.fill();
        pool
    }

    /// Builds the pool from a layout.
    pub fn from_settings(
        settings: &PoolSettings,
        catalog: &mut PrototypeCatalog,
        provider: P,
        containers: &mut PoolContainers<T>,
    ) -> Self {
        let options = MultiTypeOptions {
            method: settings.pooling_method,
            can_pool_same_type_next: settings.can_pool_same_type_next,
            seed: settings.seed,
            container: ContainerOptions {
                in_parent: settings.in_parent,
                reuse_pools: settings.reuse_pools,
            },
        };
        Self::new(
            settings.name.clone(),
            settings.to_entries(catalog),
            options,
            provider,
            containers,
        )
    }

    /// Rebuilds the orders and tops every entry up to its capacity.
    ///
    /// Instances already present for a prototype (an adopted container)
    /// count toward its capacity. Resets the selection state.
    pub fn fill(&mut self) -> &FillSummary {
        self.last_fill.instantiated = 0;
        self.last_fill.issues.clear();
        self.selector.state = SelectionState::default();
        self.selector.original_order.clear();

        if self.selector.entries.is_empty() {
            warn!(pool = %self.name, "multi-type pool has no prototype to pool");
            self.last_fill.issues.push(PoolError::NoPrototypes {
                pool: self.name.clone(),
            });
            self.selector.priority_order.clear();
            self.selector.shuffled_order.clear();
            return &self.last_fill;
        }
        if self.selector.entries.len() < 2 {
            self.selector.can_pool_same_type_next = true;
        }
        self.selector.rebuild_orders();

        let method = self.selector.method;
        let skip_disabled = method.skips_disabled_on_fill();
        for entry in self.selector.entries.iter().filter(|entry| !entry.enabled) {
            if skip_disabled {
                warn!(
                    pool = %self.name,
                    prototype = %entry.prototype.name,
                    "prototype disabled at fill"
                );
                self.last_fill.issues.push(PoolError::DisabledAtFill {
                    prototype: entry.prototype.name.clone(),
                });
            } else {
                debug!(
                    pool = %self.name,
                    prototype = %entry.prototype.name,
                    "filling disabled prototype"
                );
            }
        }

        let registry = Arc::clone(&self.registry);
        let mut registry = registry.lock();
        let mut missing: Vec<usize> = self
            .selector
            .entries
            .iter()
            .map(|entry| {
                if skip_disabled && !entry.enabled {
                    0
                } else {
                    entry.capacity.saturating_sub(registry.count_of(entry.id()))
                }
            })
            .collect();

        let order: Vec<usize> = if method.is_random() {
            self.selector.shuffled_order.clone()
        } else if method.is_cursor_based() {
            (0..self.selector.entries.len()).collect()
        } else {
            self.selector.priority_order.clone()
        };
        let round_robin = matches!(
            method,
            PoolingMethod::InTurnTypeOrder | PoolingMethod::InTurnPriorityOrder
        );

        let mut created = 0;
        if round_robin {
            while missing.iter().any(|&count| count > 0) {
                for &index in &order {
                    if missing[index] > 0 {
                        self.create(index, &mut *registry);
                        missing[index] -= 1;
                        created += 1;
                    }
                }
            }
        } else {
            for &index in &order {
                for _ in 0..missing[index] {
                    self.create(index, &mut *registry);
                    created += 1;
                }
            }
        }

        let entries = &self.selector.entries;
        self.selector.original_order = registry
            .iter()
            .filter(|(_, slot)| entries.iter().any(|entry| entry.id() == slot.owner()))
            .map(|(id, _)| id)
            .collect();
        drop(registry);

        self.last_fill.instantiated = created;
        debug!(pool = %self.name, created, method = ?method, "multi-type pool filled");
        &self.last_fill
    }

    fn create(&mut self, index: usize, registry: &mut Registry<T>) -> InstanceId {
        instantiate(
            &self.selector.entries[index],
            registry,
            &mut self.provider,
            false,
        )
    }

    /// Inactive instance of one prototype, growing that entry if allowed.
    ///
    /// Returns `None` for a prototype the pool does not hold or a disabled
    /// entry.
    pub fn acquire_of(&mut self, prototype: PrototypeId) -> Option<InstanceId> {
        let registry = Arc::clone(&self.registry);
        let mut registry = registry.lock();
        self.selector
            .acquire_of(prototype, &mut *registry, &mut self.provider)
    }

    /// Enables or disables a prototype for selection. Returns `false` when
    /// the pool holds no such prototype.
    pub fn set_enabled(&mut self, prototype: PrototypeId, enabled: bool) -> bool {
        let Some(index) = self.selector.entry_index(prototype) else {
            return false;
        };
        self.selector.entries[index].enabled = enabled;
        debug!(pool = %self.name, prototype = %prototype, enabled, "prototype toggled");
        true
    }

    /// Restarts the cursor-based walks from the beginning.
    pub fn reset_cursor(&mut self) {
        self.selector.state.cursor = 0;
        self.selector.state.type_cursor = 0;
    }

    /// Entry of a prototype.
    #[must_use]
    pub fn entry(&self, prototype: PrototypeId) -> Option<&PoolEntry> {
        self.selector
            .entry_index(prototype)
            .map(|index| &self.selector.entries[index])
    }

    /// Entries in configured order.
    #[must_use]
    pub fn entries(&self) -> &[PoolEntry] {
        &self.selector.entries
    }

    /// Entry prototypes by descending priority; ties keep configured order.
    pub fn priority_order(&self) -> impl Iterator<Item = PrototypeId> + '_ {
        self.selector
            .priority_order
            .iter()
            .map(|&index| self.selector.entries[index].id())
    }

    /// Instances in fill order, as walked by the cursor-based methods.
    #[must_use]
    pub fn original_order(&self) -> &[InstanceId] {
        &self.selector.original_order
    }

    /// Current selection state.
    #[must_use]
    pub const fn selection_state(&self) -> SelectionState {
        self.selector.state
    }

    /// Selection policy.
    #[must_use]
    pub const fn method(&self) -> PoolingMethod {
        self.selector.method
    }

    /// Whether the same prototype may be handed out twice in a row.
    #[must_use]
    pub const fn can_pool_same_type_next(&self) -> bool {
        self.selector.can_pool_same_type_next
    }

    /// Outcome of the last fill.
    #[must_use]
    pub const fn last_fill(&self) -> &FillSummary {
        &self.last_fill
    }
}

impl<T, P> ObjectPool for MultiTypePool<T, P>
where
    T: Poolable,
    P: PrototypeProvider<T>,
{
    type Object = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn registry(&self) -> &SharedRegistry<T> {
        &self.registry
    }

    fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    fn acquire(&mut self) -> Option<InstanceId> {
        let registry = Arc::clone(&self.registry);
        let mut registry = registry.lock();
        self.selector.acquire(&mut *registry, &mut self.provider)
    }
}
