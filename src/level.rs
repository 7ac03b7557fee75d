//! Severity levels and the heterogeneous level-specification resolver.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// The six canonical severity levels, ordered `NOTSET < DEBUG < INFO <
/// WARNING < ERROR < CRITICAL`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    #[default]
    Notset,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Numeric value of the level (0, 10, 20, 30, 40, 50).
    pub const fn value(self) -> u8 {
        match self {
            Level::Notset => 0,
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }

    /// Inverse of [`Level::value`]; `None` for anything that is not one of
    /// the six canonical values.
    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Level::Notset),
            10 => Some(Level::Debug),
            20 => Some(Level::Info),
            30 => Some(Level::Warning),
            40 => Some(Level::Error),
            50 => Some(Level::Critical),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Notset => "NOTSET",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    /// Case-insensitive parse accepting the canonical names plus the `WARN`
    /// and `FATAL` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTSET" => Ok(Self::Notset),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "FATAL" | "CRITICAL" => Ok(Self::Critical),
            _ => Err(ConfigError::InvalidLevel(s.to_string())),
        }
    }
}

/// Heterogeneous severity specification accepted by configuration entry
/// points.
///
/// Booleans are a shorthand for "verbose" (`true` → DEBUG) versus "quiet"
/// (`false` → WARNING). Numeric input must be exactly one of the canonical
/// values. An absent spec (`Option::None` at call sites) resolves to
/// [`Level::Notset`] via [`LevelSpec::resolve_opt`].
#[derive(Clone, Debug, PartialEq)]
pub enum LevelSpec {
    Name(String),
    Verbose(bool),
    Numeric(i64),
}

impl LevelSpec {
    /// Resolve the specification into a canonical [`Level`].
    pub fn resolve(&self) -> Result<Level, ConfigError> {
        match self {
            LevelSpec::Name(name) => name.parse(),
            LevelSpec::Verbose(true) => Ok(Level::Debug),
            LevelSpec::Verbose(false) => Ok(Level::Warning),
            LevelSpec::Numeric(n) => u8::try_from(*n)
                .ok()
                .and_then(Level::from_value)
                .ok_or_else(|| ConfigError::InvalidLevel(n.to_string())),
        }
    }

    /// Resolve an optional specification; absent means NOTSET.
    pub fn resolve_opt(spec: Option<&LevelSpec>) -> Result<Level, ConfigError> {
        spec.map_or(Ok(Level::Notset), LevelSpec::resolve)
    }
}

impl From<&str> for LevelSpec {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for LevelSpec {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<bool> for LevelSpec {
    fn from(value: bool) -> Self {
        Self::Verbose(value)
    }
}

impl From<i64> for LevelSpec {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<Level> for LevelSpec {
    fn from(value: Level) -> Self {
        Self::Numeric(i64::from(value.value()))
    }
}
