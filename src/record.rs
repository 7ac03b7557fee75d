//! Log record representation.

use std::fmt;

use chrono::{DateTime, Local};

use crate::level::Level;

/// A single severity-tagged text record emitted by a logger.
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Name of the logger that created this record.
    pub logger: String,
    /// Severity of the record.
    pub level: Level,
    /// The message content.
    pub message: String,
    /// Time the record was created.
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Construct a record stamped with the current local time.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            timestamp: Local::now(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
