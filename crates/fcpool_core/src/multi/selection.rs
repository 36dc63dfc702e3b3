//! # Selection Policies
//!
//! Every policy is a bounded scan: random draws and gate rolls per call are
//! capped by `max(registry.len(), entries.len())` and each entry is visited at
//! most once afterwards, so an `acquire` always terminates, even when nothing
//! can be handed out.
//!
//! ## Probability gate
//!
//! The priority policies roll `r` uniformly in `1..=100` for each examined
//! entry and accept it when `r <= 100 * priority / S`, with `S` the priority
//! sum over *all* entries, disabled ones included. A zero priority (or a zero
//! sum) never passes.

use tracing::trace;

use crate::config::PoolingMethod;
use crate::entry::PoolEntry;
use crate::prototype::{PrototypeId, PrototypeProvider};
use crate::registry::{InstanceId, Registry};
use crate::rng::PoolRng;

/// Mutable retrieval state of a multi-type pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionState {
    /// Prototype of the last instance handed out; cleared when an
    /// `acquire` hands out nothing.
    pub last_prototype: Option<PrototypeId>,
    /// Position in the fill order for the cursor-based methods.
    pub cursor: usize,
    /// Position in the priority order for `InTurnPriorityOrder`.
    pub type_cursor: usize,
}

/// Entries, orders and state the policies work on.
#[derive(Debug)]
pub(super) struct Selector {
    pub(super) method: PoolingMethod,
    pub(super) can_pool_same_type_next: bool,
    pub(super) entries: Vec<PoolEntry>,
    /// Entry indices, descending priority, ties in configured order.
    pub(super) priority_order: Vec<usize>,
    /// Entry indices in shuffled order, used by the random fills.
    pub(super) shuffled_order: Vec<usize>,
    /// Instances in fill order, walked by the cursor-based methods.
    pub(super) original_order: Vec<InstanceId>,
    pub(super) state: SelectionState,
    pub(super) rng: PoolRng,
}

/// Creates one instance of `entry` and appends it.
pub(super) fn instantiate<T, P>(
    entry: &PoolEntry,
    registry: &mut Registry<T>,
    provider: &mut P,
    grown: bool,
) -> InstanceId
where
    P: PrototypeProvider<T>,
{
    let object = provider.instantiate(&entry.prototype);
    let name = entry.prototype.name.clone();
    if grown {
        registry.push_grown(object, entry.id(), name)
    } else {
        registry.push(object, entry.id(), name)
    }
}

impl Selector {
    pub(super) fn new(
        method: PoolingMethod,
        can_pool_same_type_next: bool,
        entries: Vec<PoolEntry>,
        rng: PoolRng,
    ) -> Self {
        Self {
            method,
            can_pool_same_type_next,
            entries,
            priority_order: Vec::new(),
            shuffled_order: Vec::new(),
            original_order: Vec::new(),
            state: SelectionState::default(),
            rng,
        }
    }

    /// Rebuilds the priority and shuffled orders from the entries.
    pub(super) fn rebuild_orders(&mut self) {
        let mut priority_order: Vec<usize> = (0..self.entries.len()).collect();
        // `sort_by` is stable: equal priorities keep their configured order.
        priority_order
            .sort_by(|&a, &b| self.entries[b].priority.cmp(&self.entries[a].priority));
        self.priority_order = priority_order;

        self.shuffled_order = (0..self.entries.len()).collect();
        self.rng.shuffle(&mut self.shuffled_order);
    }

    /// Runs the configured policy and records what was handed out.
    pub(super) fn acquire<T, P>(
        &mut self,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let picked = match self.method {
            PoolingMethod::SequentialOrder | PoolingMethod::InTurnTypeOrder => {
                self.acquire_in_order(registry, provider)
            }
            PoolingMethod::InTurnPriorityOrder => self.acquire_in_turn_priority(registry, provider),
            PoolingMethod::RandomUniformOverInstances
            | PoolingMethod::RandomWeightedByTypeCount => {
                self.acquire_random_instance(registry, provider)
            }
            PoolingMethod::RandomUniformOverPool => self.acquire_random_pool(registry, provider),
            PoolingMethod::RandomWeightedByPriority => {
                self.acquire_random_priority(registry, provider)
            }
        };
        self.remember(picked, registry);
        picked
    }

    /// Inactive instance of one specific prototype, growing if allowed.
    pub(super) fn acquire_of<T, P>(
        &mut self,
        prototype: PrototypeId,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let index = self.entry_index(prototype)?;
        if !self.entries[index].enabled {
            return None;
        }
        let picked = self.take_or_grow(index, registry, provider);
        if picked.is_some() {
            self.remember(picked, registry);
        }
        picked
    }

    /// Records the prototype handed out. Nothing handed out clears it, so the
    /// next call may pick any type again.
    fn remember<T>(&mut self, picked: Option<InstanceId>, registry: &Registry<T>) {
        self.state.last_prototype = picked.and_then(|id| registry.owner_of(id));
        match picked {
            Some(id) => trace!(instance = id.index(), method = ?self.method, "instance selected"),
            None => trace!(method = ?self.method, "nothing to hand out"),
        }
    }

    /// Cursor walk over the fill order.
    ///
    /// The cursor moves by exactly one per call whatever the outcome.
    fn acquire_in_order<T, P>(
        &mut self,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        if self.original_order.is_empty() {
            return None;
        }
        if self.state.cursor >= self.original_order.len() {
            self.state.cursor = 0;
        }
        let slot = self.original_order[self.state.cursor];
        self.state.cursor += 1;

        let index = self.entry_index(registry.owner_of(slot)?)?;
        if !self.entries[index].enabled {
            return None;
        }
        if !registry.is_active(slot) {
            return Some(slot);
        }
        self.take_or_grow(index, registry, provider)
    }

    /// Priority-gated turn over the priority order.
    ///
    /// The type cursor persists across calls and moves by one per gate
    /// roll, so every entry is examined equally often and the hand-out
    /// frequencies follow the priority shares.
    fn acquire_in_turn_priority<T, P>(
        &mut self,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let types = self.priority_order.len();
        if types == 0 {
            return None;
        }
        let bound = self.bound(registry);
        let start = self.state.type_cursor % types;
        let (candidate, next) = self.gate_from(start, bound);
        self.state.type_cursor = next;
        self.scan_priority(candidate, registry, provider)
    }

    /// Uniform draw over instances.
    ///
    /// Sampling instances rather than types weights each prototype by its
    /// population, so this serves both instance-uniform methods.
    fn acquire_random_instance<T, P>(
        &mut self,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let slot = self.draw_instance(registry)?;
        if !registry.is_active(slot) {
            return Some(slot);
        }
        let index = self.entry_index(registry.owner_of(slot)?)?;
        self.take_or_grow(index, registry, provider)
    }

    /// Uniform draw over entries, then forward to the first that can give.
    fn acquire_random_pool<T, P>(
        &mut self,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let types = self.entries.len();
        if types == 0 {
            return None;
        }
        let bound = self.bound(registry);
        let start = self.draw_entry(bound);
        let order: Vec<usize> = (0..types).map(|step| (start + step) % types).collect();
        self.take_first(&order, registry, provider)
    }

    /// Random starting type, then a local priority-gated turn.
    fn acquire_random_priority<T, P>(
        &mut self,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        if self.entries.is_empty() {
            return None;
        }
        let bound = self.bound(registry);
        let drawn = self.draw_entry(bound);
        let start = self
            .priority_order
            .iter()
            .position(|&index| index == drawn)
            .unwrap_or(0);
        let (candidate, _) = self.gate_from(start, bound);
        self.scan_priority(candidate, registry, provider)
    }

    /// Rolls the gate along the priority order from `start`.
    ///
    /// Disabled entries, and the last handed-out prototype when repeats are
    /// not allowed, are stepped over without a roll. Returns the position
    /// that passed (or, when the bound runs out, the next position to look
    /// at) and the position after the last one examined.
    fn gate_from(&mut self, start: usize, bound: usize) -> (usize, usize) {
        let types = self.priority_order.len();
        let avoided = self.avoided();
        let mut position = start;
        for _ in 0..bound {
            let index = self.priority_order[position];
            let entry = &self.entries[index];
            let skip = !entry.enabled || (types > 1 && Some(entry.id()) == avoided);
            let next = (position + 1) % types;
            if !skip && self.probability_check(index) {
                return (position, next);
            }
            position = next;
        }
        trace!(bound, "probability gate exhausted, falling back to turn order");
        (position, position)
    }

    /// Walks the priority order once from `start`.
    fn scan_priority<T, P>(
        &self,
        start: usize,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let types = self.priority_order.len();
        let order: Vec<usize> = (0..types)
            .map(|step| self.priority_order[(start + step) % types])
            .collect();
        self.take_first(&order, registry, provider)
    }

    /// Takes or grows from the first enabled entry of `order` that can give.
    ///
    /// The last handed-out prototype is only considered once every other
    /// entry came up empty.
    fn take_first<T, P>(
        &self,
        order: &[usize],
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let avoided = self.avoided();
        let enabled = order.iter().copied().filter(|&index| self.entries[index].enabled);
        let (preferred, repeated): (Vec<usize>, Vec<usize>) =
            enabled.partition(|&index| Some(self.entries[index].id()) != avoided);
        preferred
            .into_iter()
            .chain(repeated)
            .find_map(|index| self.take_or_grow(index, registry, provider))
    }

    /// Accepts entry `index` with probability `priority / S`.
    pub(super) fn probability_check(&mut self, index: usize) -> bool {
        let priority_sum: u64 = self.entries.iter().map(|e| u64::from(e.priority)).sum();
        let priority = self.entries[index].priority;
        if priority == 0 || priority_sum == 0 {
            return false;
        }
        let chance = priority as f32 / priority_sum as f32 * 100.0;
        self.rng.percent() as f32 <= chance
    }

    /// Random instance whose owner is enabled and, if repeats are not
    /// allowed, differs from the last prototype.
    fn draw_instance<T>(&mut self, registry: &Registry<T>) -> Option<InstanceId> {
        let count = registry.len();
        if count == 0 {
            return None;
        }
        let avoided = self.avoided();
        let usable = |selector: &Self, index: usize| -> bool {
            registry
                .id_at(index)
                .and_then(|id| registry.get(id))
                .is_some_and(|slot| {
                    selector.owner_enabled(slot.owner()) && Some(slot.owner()) != avoided
                })
        };

        let mut index = self.rng.index(count);
        let mut draws = 1;
        while !usable(self, index) && draws < count {
            index = self.rng.index(count);
            draws += 1;
        }
        if usable(self, index) {
            return registry.id_at(index);
        }

        // Out of draws: sweep forward, first honouring the repeat rule, then not.
        let sweep = (1..count).map(|step| (index + step) % count);
        if let Some(found) = sweep.clone().find(|&i| usable(self, i)) {
            return registry.id_at(found);
        }
        std::iter::once(index)
            .chain(sweep)
            .find(|&i| {
                registry
                    .id_at(i)
                    .and_then(|id| registry.get(id))
                    .is_some_and(|slot| self.owner_enabled(slot.owner()))
            })
            .and_then(|i| registry.id_at(i))
    }

    /// Random entry index that differs from the last prototype when repeats
    /// are not allowed.
    fn draw_entry(&mut self, bound: usize) -> usize {
        let types = self.entries.len();
        let mut index = self.rng.index(types);
        let Some(last) = self.avoided() else {
            return index;
        };
        let mut draws = 1;
        while self.entries[index].id() == last && draws < bound {
            index = self.rng.index(types);
            draws += 1;
        }
        if self.entries[index].id() == last {
            if let Some(other) = (1..types)
                .map(|step| (index + step) % types)
                .find(|&i| self.entries[i].id() != last)
            {
                index = other;
            }
        }
        index
    }

    /// Inactive instance of entry `index`, or a new one if it may grow.
    fn take_or_grow<T, P>(
        &self,
        index: usize,
        registry: &mut Registry<T>,
        provider: &mut P,
    ) -> Option<InstanceId>
    where
        P: PrototypeProvider<T>,
    {
        let entry = &self.entries[index];
        if let Some(id) = registry.find_inactive(entry.id()) {
            return Some(id);
        }
        if entry.can_grow {
            return Some(instantiate(entry, registry, provider, true));
        }
        None
    }

    /// Prototype that must not be handed out next, if any.
    fn avoided(&self) -> Option<PrototypeId> {
        if self.can_pool_same_type_next {
            None
        } else {
            self.state.last_prototype
        }
    }

    fn bound<T>(&self, registry: &Registry<T>) -> usize {
        registry.len().max(self.entries.len())
    }

    pub(super) fn entry_index(&self, prototype: PrototypeId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == prototype)
    }

    fn owner_enabled(&self, owner: PrototypeId) -> bool {
        self.entry_index(owner)
            .is_some_and(|index| self.entries[index].enabled)
    }
}
