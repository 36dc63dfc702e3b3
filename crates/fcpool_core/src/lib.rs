//! # FC Pool Core
//!
//! Typed object pooling for games and simulations:
//! - Single-type pools that grow on demand
//! - Multi-type pools with seven selection policies
//! - Named containers so several pools can share one registry
//! - Timed auto-return driven by the caller's clock
//!
//! ## Architecture Rules
//!
//! 1. **Instances are never destroyed one by one** - they go back to the pool
//! 2. **Acquire reports, activate flips** - selection never changes state
//! 3. **No hidden globals** - containers and prototypes are passed in
//! 4. **Seedable randomness** - a seed fixes every random selection
//!
//! ## Example
//!
//! ```rust,ignore
//! use fcpool_core::{MultiTypePool, ObjectPool, PoolContainers, PoolSettings, PrototypeCatalog};
//!
//! let mut catalog = PrototypeCatalog::new();
//! let mut containers = PoolContainers::new();
//! let settings = PoolSettings::from_toml_file("data/pools/obstacles.toml")?;
//! let mut pool =
//!     MultiTypePool::from_settings(&settings, &mut catalog, make_obstacle, &mut containers);
//!
//! let id = pool.spawn(now).expect("pool exhausted");
//! pool.tick(now + frame);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod container;
pub mod entry;
pub mod error;
pub mod multi;
pub mod pool;
pub mod prototype;
pub mod registry;
pub mod rng;
pub mod single;

pub use config::{EntrySettings, PoolSettings, PoolingMethod, SingleSettings};
pub use container::{Attachment, ContainerOptions, PoolContainers, PoolKind, SharedRegistry};
pub use entry::PoolEntry;
pub use error::{PoolError, PoolResult};
pub use multi::{MultiTypeOptions, MultiTypePool, SelectionState};
pub use pool::{FillSummary, ObjectPool};
pub use prototype::{Poolable, Prototype, PrototypeCatalog, PrototypeId, PrototypeProvider};
pub use registry::{InstanceId, PoolStats, Registry, Slot};
pub use rng::PoolRng;
pub use single::SingleTypePool;
