//! Error types for the logger configuration subsystem.

use std::io;

use thiserror::Error;

/// Errors raised while resolving levels, building sinks, or applying a
/// declarative configuration.
///
/// All variants surface synchronously at the call that detects the problem;
/// nothing is retried internally.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A severity specification that is neither a canonical name, a boolean
    /// shorthand, nor one of the six canonical numeric values.
    #[error("invalid logging level: {0}")]
    InvalidLevel(String),
    /// A symbolic handler-type name with no registered sink constructor.
    #[error("unknown handler type: {0}")]
    UnknownHandlerType(String),
    /// A configuration value of the wrong shape or a parameter of the wrong
    /// type.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Underlying I/O error while acquiring a sink's resource.
    #[error(transparent)]
    Io(#[from] io::Error),
}
