//! Error types for the Quicksilver shape engine
//!
//! Shape operations themselves never fail: a missing property is `None`, and
//! a broken caller precondition (duplicate add, out-of-range slot) is a
//! programming error that is asserted, not reported. The errors here cover the
//! surfaces around the engine: loading and validating configuration.

use std::fmt;
use thiserror::Error;

/// Which configuration knob an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    /// `transition_max_size`
    TransitionMaxSize,
    /// `index_threshold`
    IndexThreshold,
    /// `transition_table_map_threshold`
    TransitionTableMapThreshold,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigField::TransitionMaxSize => write!(f, "transition_max_size"),
            ConfigField::IndexThreshold => write!(f, "index_threshold"),
            ConfigField::TransitionTableMapThreshold => {
                write!(f, "transition_table_map_threshold")
            }
        }
    }
}

/// Main error type for the shape engine
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is out of range
    #[error("ConfigError: {field}: {message}")]
    ConfigError { field: ConfigField, message: String },

    /// IO error while reading a configuration file
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Malformed JSON configuration
    #[error("JSONError: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a configuration error for `field`
    pub fn config_error(field: ConfigField, message: impl Into<String>) -> Self {
        Error::ConfigError {
            field,
            message: message.into(),
        }
    }
}

/// Result type alias for the shape engine
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized error message templates
pub mod messages {
    /// Message for a threshold that must be at least one
    pub const MUST_BE_POSITIVE: &str = "must be greater than zero";

    /// Format a "X must not exceed Y" message
    pub fn must_not_exceed(what: &str, limit: &str) -> String {
        format!("{} must not exceed {}", what, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::config_error(ConfigField::IndexThreshold, messages::MUST_BE_POSITIVE);
        assert_eq!(
            err.to_string(),
            "ConfigError: index_threshold: must be greater than zero"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError { .. }));
        assert!(err.to_string().starts_with("IOError:"));
    }

    #[test]
    fn test_must_not_exceed_message() {
        assert_eq!(
            messages::must_not_exceed("transition_max_size", "index_threshold"),
            "transition_max_size must not exceed index_threshold"
        );
    }
}
