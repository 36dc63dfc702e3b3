//! Demo error type.

use fcpool_core::PoolError;
use thiserror::Error;

/// Errors raised while setting up a demo scene.
#[derive(Error, Debug)]
pub enum DemoError {
    /// A pool layout was rejected.
    #[error("pool layout: {0}")]
    Layout(#[from] PoolError),

    /// Scene settings could not be parsed.
    #[error("scene settings: {0}")]
    Settings(#[from] toml::de::Error),

    /// A scene setting is out of range.
    #[error("scene setting {field} = {value}: {reason}")]
    OutOfRange {
        /// Setting name.
        field: &'static str,
        /// Rejected value.
        value: f32,
        /// What the value must be.
        reason: &'static str,
    },
}

/// Result type for demo setup.
pub type DemoResult<T> = Result<T, DemoError>;

/// Rejects NaN and infinities.
pub(crate) fn require_finite(field: &'static str, value: f32) -> DemoResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DemoError::OutOfRange {
            field,
            value,
            reason: "must be finite",
        })
    }
}

/// Rejects zero, negative and non-finite values.
pub(crate) fn require_positive(field: &'static str, value: f32) -> DemoResult<()> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(DemoError::OutOfRange {
            field,
            value,
            reason: "must be greater than zero",
        })
    }
}

/// Rejects negative and non-finite values.
pub(crate) fn require_non_negative(field: &'static str, value: f32) -> DemoResult<()> {
    require_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(DemoError::OutOfRange {
            field,
            value,
            reason: "must not be negative",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_checks() {
        assert!(require_finite("speed", -3.0).is_ok());
        assert!(require_finite("speed", f32::NAN).is_err());
        assert!(require_positive("rate", 0.0).is_err());
        assert!(require_positive("rate", f32::INFINITY).is_err());
        assert!(require_non_negative("spread", 0.0).is_ok());
        assert!(matches!(
            require_non_negative("spread", -1.0),
            Err(DemoError::OutOfRange { field: "spread", .. })
        ));
    }
}
