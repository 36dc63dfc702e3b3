//! # Pool Entries
//!
//! An entry binds one prototype to the parameters a pool uses for it.

use crate::prototype::{Prototype, PrototypeId};

/// One prototype of a pool and how it may be pooled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolEntry {
    /// The prototype to instantiate.
    pub prototype: Prototype,
    /// Instances created when the pool is filled.
    pub capacity: usize,
    /// Weight used by the priority policies. Zero never passes the gate.
    pub priority: u32,
    /// Whether the pool may instantiate more than `capacity` on demand.
    pub can_grow: bool,
    /// Disabled entries are skipped by every policy. Toggled at runtime.
    pub enabled: bool,
}

impl PoolEntry {
    /// Creates an enabled, growable entry with priority zero.
    #[must_use]
    pub fn new(prototype: Prototype, capacity: usize) -> Self {
        Self {
            prototype,
            capacity,
            priority: 0,
            can_grow: true,
            enabled: true,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets whether the entry may grow past its capacity.
    #[must_use]
    pub const fn with_growth(mut self, can_grow: bool) -> Self {
        self.can_grow = can_grow;
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Identity of the entry's prototype.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PrototypeId {
        self.prototype.id
    }
}
