//! # Pool Containers
//!
//! A container is a named registry that several pools may attach to. The
//! store of containers is an ordinary value owned by the caller and handed to
//! pool constructors; there is no process-wide instance.
//!
//! ## Attachment rules
//!
//! | `in_parent` | `reuse_pools` | result                                   |
//! |-------------|---------------|------------------------------------------|
//! | false       | any           | private registry, no container           |
//! | true        | false         | fresh container, replaces any namesake   |
//! | true        | true          | existing container adopted, else created |

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::registry::Registry;

/// Registry shared between the pools attached to one container.
pub type SharedRegistry<T> = Arc<Mutex<Registry<T>>>;

/// How a pool is placed relative to containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerOptions {
    /// Whether instances live in a named container.
    pub in_parent: bool,
    /// Whether an existing container of the same name is adopted.
    pub reuse_pools: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            in_parent: true,
            reuse_pools: false,
        }
    }
}

impl ContainerOptions {
    /// Container shared with every namesake pool.
    #[must_use]
    pub const fn reused() -> Self {
        Self {
            in_parent: true,
            reuse_pools: true,
        }
    }

    /// No container at all.
    #[must_use]
    pub const fn detached() -> Self {
        Self {
            in_parent: false,
            reuse_pools: false,
        }
    }
}

/// Which kind of pool owns a container; part of the container name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// [`SingleTypePool`](crate::SingleTypePool).
    SingleType,
    /// [`MultiTypePool`](crate::MultiTypePool).
    MultiType,
}

impl PoolKind {
    /// Name of the container a pool called `pool_name` attaches to.
    #[must_use]
    pub fn container_name(self, pool_name: &str) -> String {
        match self {
            Self::SingleType => format!("[SingleTypeObjectPooler] {pool_name}"),
            Self::MultiType => format!("[MultiTypeObjectPooler] {pool_name}"),
        }
    }
}

/// Where a pool's registry lives.
#[derive(Debug)]
pub struct Attachment<T> {
    /// The registry to use.
    pub registry: SharedRegistry<T>,
    /// Container name, or `None` for a private registry.
    pub container: Option<String>,
    /// True when an existing container was adopted.
    pub reused: bool,
}

/// Store of named containers.
#[derive(Debug)]
pub struct PoolContainers<T> {
    containers: HashMap<String, SharedRegistry<T>>,
}

impl<T> Default for PoolContainers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PoolContainers<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            containers: HashMap::new(),
        }
    }

    /// Looks up a container by its full name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<SharedRegistry<T>> {
        self.containers.get(name).cloned()
    }

    /// Number of containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// True when no container exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Resolves the registry for a pool following the attachment rules.
    pub fn attach(
        &mut self,
        kind: PoolKind,
        pool_name: &str,
        options: ContainerOptions,
    ) -> Attachment<T> {
        if !options.in_parent {
            return Attachment {
                registry: Arc::new(Mutex::new(Registry::new())),
                container: None,
                reused: false,
            };
        }

        let name = kind.container_name(pool_name);
        if options.reuse_pools {
            if let Some(registry) = self.find(&name) {
                debug!(container = %name, "reusing pool container");
                return Attachment {
                    registry,
                    container: Some(name),
                    reused: true,
                };
            }
        }

        let registry = Arc::new(Mutex::new(Registry::new()));
        self.containers.insert(name.clone(), Arc::clone(&registry));
        debug!(container = %name, "created pool container");
        Attachment {
            registry,
            container: Some(name),
            reused: false,
        }
    }

    /// Destroys a container and every instance in it.
    ///
    /// Pools still attached keep an empty registry. Returns `false` when no
    /// container of that name exists.
    pub fn destroy(&mut self, name: &str) -> bool {
        match self.containers.remove(name) {
            Some(registry) => {
                registry.lock().clear();
                debug!(container = %name, "destroyed pool container");
                true
            }
            None => false,
        }
    }
}
