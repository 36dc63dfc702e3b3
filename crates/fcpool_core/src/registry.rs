//! # Instance Registry
//!
//! The live collection of pooled instances, in creation order.
//!
//! Instances are appended and never removed one by one, so an [`InstanceId`]
//! stays valid for as long as the registry is not cleared. Each slot remembers
//! the prototype it came from, its deterministic name, whether a caller has
//! it out right now, and when it should come back on its own.

use std::time::Duration;

use tracing::debug;

use crate::prototype::{Poolable, PrototypeId};

/// Handle to an instance in a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Position of the instance in creation order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One pooled instance and its bookkeeping.
#[derive(Debug)]
pub struct Slot<T> {
    object: T,
    owner: PrototypeId,
    name: String,
    active: bool,
    expires_at: Option<Duration>,
}

impl<T> Slot<T> {
    /// The pooled object.
    #[inline]
    pub const fn object(&self) -> &T {
        &self.object
    }

    /// Prototype this instance was created from.
    #[inline]
    pub const fn owner(&self) -> PrototypeId {
        self.owner
    }

    /// Deterministic name derived from the prototype.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a caller currently has this instance out.
    #[inline]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Pending auto-return time, if any.
    #[inline]
    pub const fn expires_at(&self) -> Option<Duration> {
        self.expires_at
    }
}

/// Utilization counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances held by the registry.
    pub total: usize,
    /// Instances currently out.
    pub active: usize,
    /// Instances ready to be handed out.
    pub inactive: usize,
    /// Instances created on demand after the initial fill.
    pub grown: usize,
}

/// Ordered store of pooled instances.
#[derive(Debug)]
pub struct Registry<T> {
    slots: Vec<Slot<T>>,
    grown: usize,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            grown: 0,
        }
    }

    /// Number of instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the registry holds nothing.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends an inactive instance and returns its handle.
    pub fn push(&mut self, object: T, owner: PrototypeId, name: String) -> InstanceId {
        let id = InstanceId(self.slots.len());
        self.slots.push(Slot {
            object,
            owner,
            name,
            active: false,
            expires_at: None,
        });
        id
    }

    /// Appends an instance created on demand, counting it as growth.
    pub fn push_grown(&mut self, object: T, owner: PrototypeId, name: String) -> InstanceId {
        self.grown += 1;
        let id = self.push(object, owner, name);
        debug!(instance = id.0, owner = %owner, "registry grew");
        id
    }

    /// Slot lookup.
    #[inline]
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&Slot<T>> {
        self.slots.get(id.0)
    }

    /// Handle of the instance at creation position `index`.
    #[inline]
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<InstanceId> {
        (index < self.slots.len()).then_some(InstanceId(index))
    }

    /// Mutable object lookup.
    #[inline]
    pub fn object_mut(&mut self, id: InstanceId) -> Option<&mut T> {
        self.slots.get_mut(id.0).map(|slot| &mut slot.object)
    }

    /// Owner of an instance.
    #[inline]
    #[must_use]
    pub fn owner_of(&self, id: InstanceId) -> Option<PrototypeId> {
        self.get(id).map(Slot::owner)
    }

    /// True if the instance exists and is active.
    #[inline]
    #[must_use]
    pub fn is_active(&self, id: InstanceId) -> bool {
        self.get(id).is_some_and(Slot::is_active)
    }

    /// First inactive instance of `owner`, in creation order.
    #[must_use]
    pub fn find_inactive(&self, owner: PrototypeId) -> Option<InstanceId> {
        self.slots
            .iter()
            .position(|slot| slot.owner == owner && !slot.active)
            .map(InstanceId)
    }

    /// Number of instances created from `owner`.
    #[must_use]
    pub fn count_of(&self, owner: PrototypeId) -> usize {
        self.slots.iter().filter(|slot| slot.owner == owner).count()
    }

    /// Iterates over all instances in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (InstanceId, &Slot<T>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (InstanceId(index), slot))
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let active = self.slots.iter().filter(|slot| slot.active).count();
        PoolStats {
            total: self.slots.len(),
            active,
            inactive: self.slots.len() - active,
            grown: self.grown,
        }
    }

    /// Drops every instance. Outstanding handles become dangling and every
    /// lookup through them returns `None`.
    pub fn clear(&mut self) {
        debug!(instances = self.slots.len(), "registry cleared");
        self.slots.clear();
        self.grown = 0;
    }
}

impl<T: Poolable> Registry<T> {
    /// Marks an inactive instance active and arms its expiry.
    ///
    /// Returns `false` if the instance is unknown or already active; an
    /// instance never carries more than one pending expiry.
    pub fn activate(&mut self, id: InstanceId, now: Duration) -> bool {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return false;
        };
        if slot.active {
            return false;
        }
        slot.active = true;
        slot.expires_at = slot
            .object
            .lifetime()
            .filter(|lifetime| !lifetime.is_zero())
            .map(|lifetime| now + lifetime);
        slot.object.on_activate();
        true
    }

    /// Returns an active instance to the pool, cancelling its expiry.
    ///
    /// Returns `false` if the instance is unknown or already inactive.
    pub fn deactivate(&mut self, id: InstanceId) -> bool {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return false;
        };
        if !slot.active {
            return false;
        }
        slot.active = false;
        slot.expires_at = None;
        slot.object.on_deactivate();
        true
    }

    /// Deactivates every instance whose expiry is at or before `now`.
    ///
    /// Returns the number of instances recycled.
    pub fn expire(&mut self, now: Duration) -> usize {
        let mut recycled = 0;
        for slot in &mut self.slots {
            if slot.active && slot.expires_at.is_some_and(|deadline| deadline <= now) {
                slot.active = false;
                slot.expires_at = None;
                slot.object.on_deactivate();
                recycled += 1;
            }
        }
        if recycled > 0 {
            debug!(recycled, "expired instances returned to pool");
        }
        recycled
    }

    /// Visits every active instance; those for which `keep` returns `false`
    /// are returned to the pool.
    pub fn update_active<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(InstanceId, &mut T) -> bool,
    {
        let mut recycled = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.active {
                continue;
            }
            if !keep(InstanceId(index), &mut slot.object) {
                slot.active = false;
                slot.expires_at = None;
                slot.object.on_deactivate();
                recycled += 1;
            }
        }
        recycled
    }
}
