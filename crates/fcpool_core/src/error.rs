//! # Pool Error Types
//!
//! All errors that can occur while configuring or filling a pool.
//!
//! Retrieval never fails with an error: an empty result is a plain `None`.

use thiserror::Error;

/// Errors that can occur in the pooling system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Invalid pool layout (bad TOML, missing fields, inconsistent entries).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A layout file could not be read.
    #[error("cannot read {path}: {message}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error, rendered.
        message: String,
    },

    /// A prototype name that the catalog never issued an id for.
    #[error("unknown prototype: {0}")]
    UnknownPrototype(String),

    /// The pool has nothing it could instantiate.
    #[error("pool {pool} has no prototype to pool")]
    NoPrototypes {
        /// Name of the offending pool.
        pool: String,
    },

    /// An entry was disabled when the pool was filled and got no instances.
    #[error("prototype {prototype} is disabled at fill time")]
    DisabledAtFill {
        /// Name of the disabled prototype.
        prototype: String,
    },
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;
