//! # Single-Type Pool
//!
//! The degenerate pool: one prototype, no selection policy. It hands out the
//! first inactive instance and grows by one when it runs dry and is allowed to.

use tracing::{debug, warn};

use crate::config::SingleSettings;
use crate::container::{ContainerOptions, PoolContainers, PoolKind, SharedRegistry};
use crate::entry::PoolEntry;
use crate::error::PoolError;
use crate::pool::{FillSummary, ObjectPool};
use crate::prototype::{Poolable, PrototypeCatalog, PrototypeProvider};
use crate::registry::InstanceId;

/// A pool of one prototype.
///
/// # Example
///
/// ```rust,ignore
/// let mut containers: PoolContainers<Chest> = PoolContainers::new();
/// let chest = catalog.register("Chest");
/// let mut chests = SingleTypePool::new(
///     "Chests",
///     Some(PoolEntry::new(chest, 10)),
///     ContainerOptions::default(),
///     |_: &Prototype| Chest::default(),
///     &mut containers,
/// );
/// let id = chests.spawn(now)?;
/// ```
pub struct SingleTypePool<T, P> {
    name: String,
    entry: Option<PoolEntry>,
    provider: P,
    registry: SharedRegistry<T>,
    container: Option<String>,
    last_fill: FillSummary,
}

impl<T, P> SingleTypePool<T, P>
where
    T: Poolable,
    P: PrototypeProvider<T>,
{
    /// Creates the pool, attaches it to its container and fills it.
    ///
    /// A pool without an entry is legal but hands out nothing; the problem
    /// is logged and recorded in the fill summary.
    pub fn new(
        name: impl Into<String>,
        entry: Option<PoolEntry>,
        options: ContainerOptions,
        provider: P,
        containers: &mut PoolContainers<T>,
    ) -> Self {
        let name = name.into();
        let attachment = containers.attach(PoolKind::SingleType, &name, options);
        let mut pool = Self {
            name,
            entry,
            provider,
            registry: attachment.registry,
            container: attachment.container,
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
        settings: &SingleSettings,
        catalog: &mut PrototypeCatalog,
        provider: P,
        containers: &mut PoolContainers<T>,
    ) -> Self {
        let options = ContainerOptions {
            in_parent: settings.in_parent,
            reuse_pools: settings.reuse_pools,
        };
        Self::new(
            settings.name.clone(),
            settings.to_entry(catalog),
            options,
            provider,
            containers,
        )
    }

    /// Tops the registry up to the configured size.
    ///
    /// Instances already present for this prototype (an adopted container)
    /// count toward the size, so only the difference is created.
    pub fn fill(&mut self) -> &FillSummary {
        self.last_fill.instantiated = 0;
        self.last_fill.issues.clear();

        let Some(entry) = &self.entry else {
            warn!(pool = %self.name, "single-type pool has no prototype to pool");
            self.last_fill.issues.push(PoolError::NoPrototypes {
                pool: self.name.clone(),
            });
            return &self.last_fill;
        };

        let mut registry = self.registry.lock();
        let missing = entry.capacity.saturating_sub(registry.count_of(entry.id()));
        for _ in 0..missing {
            let object = self.provider.instantiate(&entry.prototype);
            let name = format!("{}-{}", entry.prototype.name, registry.len());
            registry.push(object, entry.id(), name);
        }
        drop(registry);

        self.last_fill.instantiated = missing;
        debug!(pool = %self.name, created = missing, "single-type pool filled");
        &self.last_fill
    }

    /// Outcome of the last fill.
    #[must_use]
    pub const fn last_fill(&self) -> &FillSummary {
        &self.last_fill
    }

    /// The configured entry.
    #[must_use]
    pub const fn entry(&self) -> Option<&PoolEntry> {
        self.entry.as_ref()
    }
}

impl<T, P> ObjectPool for SingleTypePool<T, P>
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
        let Some(entry) = &self.entry else {
            warn!(pool = %self.name, "acquire on a pool without prototype");
            return None;
        };

        let mut registry = self.registry.lock();
        if let Some(id) = registry.find_inactive(entry.id()) {
            return Some(id);
        }
        if !entry.can_grow {
            return None;
        }
        let object = self.provider.instantiate(&entry.prototype);
        let name = format!("{}-{}", entry.prototype.name, registry.len());
        Some(registry.push_grown(object, entry.id(), name))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::prototype::Prototype;

    #[derive(Debug, Default)]
    struct Chest;

    impl Poolable for Chest {}

    fn make_chest(_: &Prototype) -> Chest {
        Chest
    }

    fn chests(
        size: usize,
        can_grow: bool,
        containers: &mut PoolContainers<Chest>,
    ) -> SingleTypePool<Chest, fn(&Prototype) -> Chest> {
        let chest = PrototypeCatalog::new().register("Chest");
        SingleTypePool::new(
            "Chests",
            Some(PoolEntry::new(chest, size).with_growth(can_grow)),
            ContainerOptions::default(),
            make_chest as fn(&Prototype) -> Chest,
            containers,
        )
    }

    #[test]
    fn test_fill_names_instances() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let pool = chests(3, true, &mut containers);
        let registry = pool.registry().lock();
        let names: Vec<&str> = registry.iter().map(|(_, slot)| slot.name()).collect();
        assert_eq!(names, ["Chest-0", "Chest-1", "Chest-2"]);
    }

    #[test]
    fn test_acquire_first_inactive() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let mut pool = chests(2, false, &mut containers);

        let first = pool.acquire().unwrap();
        // Not activated yet, so it is reported again.
        assert_eq!(pool.acquire(), Some(first));
        pool.activate(first, Duration::ZERO);
        let second = pool.acquire().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_exhausted_without_growth() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let mut pool = chests(2, false, &mut containers);
        assert!(pool.spawn(Duration::ZERO).is_some());
        let held = pool.spawn(Duration::ZERO).unwrap();
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.acquire(), None);

        pool.deactivate(held);
        assert_eq!(pool.acquire(), Some(held));
    }

    #[test]
    fn test_grows_by_one() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let mut pool = chests(1, true, &mut containers);
        pool.spawn(Duration::ZERO).unwrap();

        let grown = pool.acquire().unwrap();
        assert!(!pool.is_active(grown));
        assert_eq!(pool.stats().total, 2);
        assert_eq!(pool.stats().grown, 1);
        assert_eq!(
            pool.registry().lock().get(grown).map(|slot| slot.name().to_string()),
            Some("Chest-1".to_string())
        );
    }

    #[test]
    fn test_without_prototype() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let mut pool = SingleTypePool::new(
            "Empty",
            None,
            ContainerOptions::default(),
            make_chest,
            &mut containers,
        );
        assert_eq!(pool.acquire(), None);
        assert!(matches!(
            pool.last_fill().issues.as_slice(),
            [PoolError::NoPrototypes { .. }]
        ));
    }

    #[test]
    fn test_reuse_tops_up_to_max() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let mut catalog = PrototypeCatalog::new();
        let small = SingleSettings {
            pool_size: 3,
            reuse_pools: true,
            ..SingleSettings::new("Chests", "Chest")
        };
        let large = SingleSettings {
            pool_size: 5,
            ..small.clone()
        };

        let first =
            SingleTypePool::from_settings(&small, &mut catalog, make_chest, &mut containers);
        let second =
            SingleTypePool::from_settings(&large, &mut catalog, make_chest, &mut containers);

        assert!(second.last_fill().reused);
        assert_eq!(second.last_fill().instantiated, 2);
        assert_eq!(first.stats().total, 5);
        assert_eq!(containers.len(), 1);
    }

    #[test]
    fn test_destroy_drops_instances() {
        let mut containers: PoolContainers<Chest> = PoolContainers::new();
        let mut pool = chests(4, true, &mut containers);
        pool.destroy(&mut containers);
        assert!(containers.is_empty());
        assert_eq!(pool.stats().total, 0);
    }
}
