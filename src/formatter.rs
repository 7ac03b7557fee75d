//! Record formatters producing the fixed text layout applied to every sink.

use std::sync::Arc;

use crate::record::LogRecord;

/// Record layout shared by all sinks:
/// `timestamp - logger name - level - message`.
pub const DEFAULT_LOG_FORMAT: &str = "{asctime} - {name} - {levelname} - {message}";
/// Timestamp layout used by [`DEFAULT_LOG_FORMAT`].
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Trait for formatting log records into strings.
///
/// Implementors must be `Send + Sync` so one formatter instance can be
/// shared across every sink built in a configuration call.
pub trait Formatter: Send + Sync {
    /// Format a log record into a single line (without trailing newline).
    fn format(&self, record: &LogRecord) -> String;
}

impl Formatter for Arc<dyn Formatter> {
    fn format(&self, record: &LogRecord) -> String {
        (**self).format(record)
    }
}

/// Return the shared formatter applied to freshly built sinks.
pub fn default_formatter() -> Arc<dyn Formatter> {
    Arc::new(DefaultFormatter)
}

/// Formatter producing the fixed default layout.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultFormatter;

impl Formatter for DefaultFormatter {
    fn format(&self, record: &LogRecord) -> String {
        format!(
            "{} - {} - {} - {}",
            record.timestamp.format(DEFAULT_DATE_FORMAT),
            record.logger,
            record.level,
            record.message
        )
    }
}

/// Formatter driven by a template string.
///
/// Recognised placeholders: `{asctime}`, `{name}`, `{levelname}` and
/// `{message}`. The date layout is a `chrono` strftime string.
#[derive(Clone, Debug)]
pub struct TemplateFormatter {
    format: String,
    date_format: String,
}

impl TemplateFormatter {
    pub fn new(format: impl Into<String>, date_format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            date_format: date_format.into(),
        }
    }
}

impl Default for TemplateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FORMAT, DEFAULT_DATE_FORMAT)
    }
}

impl Formatter for TemplateFormatter {
    fn format(&self, record: &LogRecord) -> String {
        self.format
            .replace(
                "{asctime}",
                &record.timestamp.format(&self.date_format).to_string(),
            )
            .replace("{name}", &record.logger)
            .replace("{levelname}", record.level.as_str())
            .replace("{message}", &record.message)
    }
}
