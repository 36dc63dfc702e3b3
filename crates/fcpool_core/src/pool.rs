//! # The Pooler Surface
//!
//! [`ObjectPool`] is what gameplay code talks to. Both pool kinds implement
//! it, so a spawner can be written once against `impl ObjectPool`.
//!
//! The contract is split in two: [`acquire`](ObjectPool::acquire) only
//! *reports* an inactive instance, and the caller flips it active with
//! [`activate`](ObjectPool::activate) once it is positioned.
//! [`spawn`](ObjectPool::spawn) does both in one call.

use std::sync::Arc;
use std::time::Duration;

use crate::container::{PoolContainers, SharedRegistry};
use crate::error::PoolError;
use crate::prototype::Poolable;
use crate::registry::{InstanceId, PoolStats};

/// Outcome of filling a pool.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FillSummary {
    /// Instances created by this fill.
    pub instantiated: usize,
    /// True when the pool adopted an existing container.
    pub reused: bool,
    /// Configuration problems that were logged instead of failing the fill.
    pub issues: Vec<PoolError>,
}

/// Common surface of every pool.
pub trait ObjectPool {
    /// The pooled type.
    type Object: Poolable;

    /// Pool name.
    fn name(&self) -> &str;

    /// The registry this pool hands instances out of.
    fn registry(&self) -> &SharedRegistry<Self::Object>;

    /// Name of the container the registry lives in, if any.
    fn container(&self) -> Option<&str>;

    /// Reports an inactive instance to hand out, growing the pool when it is
    /// allowed to. Never returns an active instance and never activates one.
    fn acquire(&mut self) -> Option<InstanceId>;

    /// Marks an instance active at simulation time `now`.
    fn activate(&self, id: InstanceId, now: Duration) -> bool {
        self.registry().lock().activate(id, now)
    }

    /// Returns an instance to the pool.
    fn deactivate(&self, id: InstanceId) -> bool {
        self.registry().lock().deactivate(id)
    }

    /// Acquires and activates in one step.
    fn spawn(&mut self, now: Duration) -> Option<InstanceId> {
        let id = self.acquire()?;
        self.activate(id, now);
        Some(id)
    }

    /// Recycles every instance whose lifetime ran out by `now`.
    fn tick(&self, now: Duration) -> usize {
        self.registry().lock().expire(now)
    }

    /// Whether the instance is currently out.
    fn is_active(&self, id: InstanceId) -> bool {
        self.registry().lock().is_active(id)
    }

    /// Runs `f` on the instance.
    fn with_instance<R, F>(&self, id: InstanceId, f: F) -> Option<R>
    where
        F: FnOnce(&Self::Object) -> R,
    {
        let registry = self.registry().lock();
        registry.get(id).map(|slot| f(slot.object()))
    }

    /// Runs `f` on the instance mutably.
    fn with_instance_mut<R, F>(&self, id: InstanceId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Self::Object) -> R,
    {
        let mut registry = self.registry().lock();
        registry.object_mut(id).map(f)
    }

    /// Visits every active instance; returning `false` sends it back.
    fn update_active<F>(&self, keep: F) -> usize
    where
        F: FnMut(InstanceId, &mut Self::Object) -> bool,
    {
        self.registry().lock().update_active(keep)
    }

    /// Utilization counters of the backing registry.
    fn stats(&self) -> PoolStats {
        self.registry().lock().stats()
    }

    /// Tears the pool down: its container (and every instance in it) is
    /// destroyed, or the private registry is cleared.
    fn destroy(&mut self, containers: &mut PoolContainers<Self::Object>) {
        // Only tear down the container if it is still ours; a namesake
        // created later without reuse is left alone.
        let owned = self.container().filter(|name| {
            containers
                .find(name)
                .is_some_and(|registry| Arc::ptr_eq(&registry, self.registry()))
        });
        match owned {
            Some(name) => {
                containers.destroy(name);
            }
            None => self.registry().lock().clear(),
        }
    }
}
