//! Error types for engine construction
//!
//! Runtime update processing never fails: malformed updates degrade to
//! counted no-ops (see [`crate::stats::FusionStats`]). The only fallible
//! operation is building an engine from an invalid configuration.

use std::fmt;

/// Errors detected when validating a [`crate::config::FusionConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A geometric parameter is NaN or infinite
    NotFinite {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// The match rejection threshold must be positive and finite
    InvalidMatchThreshold {
        /// The rejected value
        value: f64,
    },

    /// The smoothing retention factor must lie in `[0, 1)`
    InvalidSmoothing {
        /// The rejected value
        value: f64,
    },

    /// The sensor baseline separation must be non-negative
    NegativeSeparation {
        /// The rejected value
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFinite { field, value } => {
                write!(f, "configuration field {} is not finite: {}", field, value)
            }
            ConfigError::InvalidMatchThreshold { value } => {
                write!(
                    f,
                    "match threshold must be positive and finite, got {}",
                    value
                )
            }
            ConfigError::InvalidSmoothing { value } => {
                write!(
                    f,
                    "smoothing retention factor must lie in [0, 1), got {}",
                    value
                )
            }
            ConfigError::NegativeSeparation { value } => {
                write!(f, "sensor separation must be non-negative, got {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
