//! # Prototypes
//!
//! A prototype is the template a pool instantiates. Pools never compare
//! instances by name: every prototype gets an integer [`PrototypeId`] from a
//! [`PrototypeCatalog`] when the pools are configured, and that id is the only
//! identity the selection policies look at.
//!
//! The pooled type itself must implement [`Poolable`], which is how gameplay
//! code learns about activation and how long an instance may stay out.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{PoolError, PoolResult};

/// Identifier of a prototype, issued by a [`PrototypeCatalog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrototypeId(u32);

impl PrototypeId {
    /// Creates an id from a raw value.
    ///
    /// Prefer [`PrototypeCatalog::register`]; this exists for callers that
    /// issue ids from their own enums.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Prototype {
    /// Identity used for every type comparison.
    pub id: PrototypeId,
    /// Display name, also the base of instance names.
    pub name: String,
}

/// Interns prototype names into ids.
///
/// One catalog should be shared by every pool that may reuse a container, so
/// that the same prototype name maps to the same id everywhere.
#[derive(Debug, Default, Clone)]
pub struct PrototypeCatalog {
    by_name: HashMap<String, PrototypeId>,
    names: Vec<String>,
}

impl PrototypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, returning its prototype. Registering a name twice
    /// returns the same id.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` prototypes are registered.
    pub fn register(&mut self, name: &str) -> Prototype {
        if let Some(&id) = self.by_name.get(name) {
            return Prototype {
                id,
                name: name.to_string(),
            };
        }
        let id = PrototypeId(u32::try_from(self.names.len()).expect("prototype ids exhausted"));
        self.by_name.insert(name.to_string(), id);
        self.names.push(name.to_string());
        Prototype {
            id,
            name: name.to_string(),
        }
    }

    /// Looks up an already registered prototype.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownPrototype`] if `name` was never registered.
    pub fn resolve(&self, name: &str) -> PoolResult<Prototype> {
        self.by_name
            .get(name)
            .map(|&id| Prototype {
                id,
                name: name.to_string(),
            })
            .ok_or_else(|| PoolError::UnknownPrototype(name.to_string()))
    }

    /// Returns the name issued for `id`.
    #[must_use]
    pub fn name_of(&self, id: PrototypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Number of registered prototypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Capability every pooled type must have.
///
/// All methods have defaults, so a plain data type only needs an empty
/// `impl Poolable for T {}`.
pub trait Poolable {
    /// How long an activated instance stays out before the pool takes it
    /// back on [`tick`](crate::ObjectPool::tick). `None` or zero means it
    /// lives until deactivated.
    fn lifetime(&self) -> Option<Duration> {
        None
    }

    /// Called when the instance goes from inactive to active.
    fn on_activate(&mut self) {}

    /// Called when the instance goes back to the pool.
    fn on_deactivate(&mut self) {}
}

/// Source of new instances.
///
/// The pool calls this when it fills and whenever it is allowed to grow.
/// Instances are never destroyed one by one; they live as long as the
/// registry that holds them.
pub trait PrototypeProvider<T> {
    /// Builds a fresh, inactive instance of `prototype`.
    fn instantiate(&mut self, prototype: &Prototype) -> T;
}

impl<T, F> PrototypeProvider<T> for F
where
    F: FnMut(&Prototype) -> T,
{
    fn instantiate(&mut self, prototype: &Prototype) -> T {
        self(prototype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut catalog = PrototypeCatalog::new();
        let a = catalog.register("Cactus");
        let b = catalog.register("Bird");
        let again = catalog.register("Cactus");

        assert_eq!(a.id, again.id);
        assert_ne!(a.id, b.id);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name_of(b.id), Some("Bird"));
    }

    #[test]
    fn test_resolve_unknown() {
        let catalog = PrototypeCatalog::new();
        assert_eq!(
            catalog.resolve("Ghost"),
            Err(PoolError::UnknownPrototype("Ghost".to_string()))
        );
    }

    #[test]
    fn test_closure_provider() {
        let mut made = 0;
        let mut provider = |p: &Prototype| {
            made += 1;
            p.name.clone()
        };
        let proto = PrototypeCatalog::new().register("Coin");
        assert_eq!(provider.instantiate(&proto), "Coin");
        assert_eq!(made, 1);
    }
}
