//! lognata: declarative logger configuration and a thin REST client.
//!
//! The logging side turns a symbolic handler configuration into a named,
//! registry-managed [`Logger`] carrying ready-to-use sinks: call
//! [`configure_logger`] with a name, a severity specification and a
//! [`HandlerSpec`], and log through the returned handle. The REST side,
//! [`rest::RestClient`], wraps a service base URL with defaulted request
//! options and uniform error handling. The two halves share nothing but the
//! crate; use either alone.
//!
//! ```no_run
//! use lognata::{ConfigureOptions, HandlerSpec, Registry, SinkParams, configure_logger};
//!
//! # fn main() -> Result<(), lognata::ConfigError> {
//! let handlers = HandlerSpec::map()
//!     .with("stream", SinkParams::new().with("log_level", "debug"))
//!     .with("file", SinkParams::new().with("filename", "/var/tmp/app.log"));
//! let logger = configure_logger(
//!     Registry::global(),
//!     "app",
//!     Some(&"info".into()),
//!     &handlers,
//!     ConfigureOptions::default(),
//! )?;
//! logger.info("configured");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod formatter;
pub mod level;
pub mod logger;
pub mod record;
pub mod registry;
pub mod rest;
pub mod setup;
pub mod sinks;

pub use config::{HandlerSpec, ParamValue, SinkParams, build_sinks};
pub use error::ConfigError;
pub use formatter::{DEFAULT_DATE_FORMAT, DEFAULT_LOG_FORMAT, Formatter, TemplateFormatter};
pub use level::{Level, LevelSpec};
pub use logger::Logger;
pub use record::LogRecord;
pub use registry::Registry;
pub use setup::{
    ConfigureOptions, configure_logger, logger_exists, remove_all_loggers, remove_logger,
};
pub use sinks::{Sink, SinkHandle, SinkKind, build_sink};
