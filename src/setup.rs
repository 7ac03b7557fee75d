//! One-call logger configuration.
//!
//! [`configure_logger`] is the declarative entry point: resolve the severity
//! specification, build the configured sink set, then apply both to the
//! named logger. Resolution and construction happen before the logger is
//! touched, so a failed call leaves the logger exactly as it was.

use crate::config::{HandlerSpec, build_sinks};
use crate::error::ConfigError;
use crate::level::LevelSpec;
use crate::logger::Logger;
use crate::registry::Registry;

/// Knobs controlling how freshly built sinks are applied.
#[derive(Clone, Copy, Debug)]
pub struct ConfigureOptions {
    /// Close and detach all existing sinks before attaching the new set.
    pub remove_handlers: bool,
    /// When keeping existing sinks, still replace those sharing a kind with
    /// an incoming sink. Only meaningful with `remove_handlers` off.
    pub reset_handler_type: bool,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        Self {
            remove_handlers: true,
            reset_handler_type: false,
        }
    }
}

/// Configure the logger registered under `name`, creating it on first use.
///
/// An absent `level` leaves the logger threshold as it was (NOTSET for a
/// fresh logger). Sink construction is atomic; see [`build_sinks`].
pub fn configure_logger(
    registry: &Registry,
    name: &str,
    level: Option<&LevelSpec>,
    handlers: &HandlerSpec,
    options: ConfigureOptions,
) -> Result<Logger, ConfigError> {
    let level = level.map(LevelSpec::resolve).transpose()?;
    let sinks = build_sinks(handlers)?;

    let logger = registry.get_or_create(name);
    if let Some(level) = level {
        logger.set_level(level);
    }
    if options.remove_handlers {
        logger.clear_sinks();
    }
    logger.attach_sinks(sinks, !options.remove_handlers && options.reset_handler_type);
    Ok(logger)
}

/// Remove a logger from the registry, closing its sinks. Returns whether it
/// existed.
pub fn remove_logger(registry: &Registry, name: &str) -> bool {
    registry.remove(name)
}

/// Tear down every registered logger.
pub fn remove_all_loggers(registry: &Registry) {
    registry.clear();
}

pub fn logger_exists(registry: &Registry, name: &str) -> bool {
    registry.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkParams;
    use crate::level::Level;

    fn stream_spec(level: &str) -> HandlerSpec {
        HandlerSpec::map().with("stream", SinkParams::new().with("log_level", level))
    }

    #[test]
    fn absent_level_leaves_logger_at_notset() {
        let registry = Registry::new();
        let logger = configure_logger(
            &registry,
            "svc",
            None,
            &HandlerSpec::Discard,
            ConfigureOptions::default(),
        )
        .unwrap();
        assert_eq!(logger.level(), Level::Notset);
        assert_eq!(logger.sink_count(), 1);
    }

    #[test]
    fn reconfigure_closes_previous_sinks_by_default() {
        let registry = Registry::new();
        let logger = configure_logger(
            &registry,
            "svc",
            Some(&LevelSpec::Name("info".into())),
            &stream_spec("debug"),
            ConfigureOptions::default(),
        )
        .unwrap();
        let old = logger.sinks();

        let reconfigured = configure_logger(
            &registry,
            "svc",
            Some(&LevelSpec::Name("error".into())),
            &stream_spec("warning"),
            ConfigureOptions::default(),
        )
        .unwrap();

        assert!(logger.ptr_eq(&reconfigured));
        assert_eq!(logger.level(), Level::Error);
        assert_eq!(logger.sink_count(), 1);
        assert!(old.iter().all(|sink| sink.is_closed()));
    }

    #[test]
    fn keeping_handlers_accumulates_sinks() {
        let registry = Registry::new();
        let options = ConfigureOptions {
            remove_handlers: false,
            reset_handler_type: false,
        };
        configure_logger(&registry, "svc", None, &stream_spec("debug"), options).unwrap();
        let logger =
            configure_logger(&registry, "svc", None, &stream_spec("info"), options).unwrap();
        assert_eq!(logger.sink_count(), 2);
    }

    #[test]
    fn reset_handler_type_replaces_same_kind() {
        let registry = Registry::new();
        let keep = ConfigureOptions {
            remove_handlers: false,
            reset_handler_type: false,
        };
        configure_logger(&registry, "svc", None, &stream_spec("debug"), keep).unwrap();
        let logger = registry.get_or_create("svc");
        let old = logger.sinks();

        let reset = ConfigureOptions {
            remove_handlers: false,
            reset_handler_type: true,
        };
        configure_logger(&registry, "svc", None, &stream_spec("info"), reset).unwrap();

        assert_eq!(logger.sink_count(), 1);
        assert!(old[0].is_closed());
        assert_eq!(logger.sinks()[0].level(), Level::Info);
    }

    #[test]
    fn failed_configuration_leaves_logger_untouched() {
        let registry = Registry::new();
        let logger = configure_logger(
            &registry,
            "svc",
            Some(&LevelSpec::Name("info".into())),
            &stream_spec("debug"),
            ConfigureOptions::default(),
        )
        .unwrap();

        let err = configure_logger(
            &registry,
            "svc",
            Some(&LevelSpec::Name("info".into())),
            &HandlerSpec::map().with("console", SinkParams::new()),
            ConfigureOptions::default(),
        )
        .expect_err("unknown handler");

        assert!(matches!(err, ConfigError::UnknownHandlerType(_)));
        assert_eq!(logger.sink_count(), 1);
        assert!(!logger.sinks()[0].is_closed());
    }

    #[test]
    fn invalid_level_fails_before_building_sinks() {
        let registry = Registry::new();
        let err = configure_logger(
            &registry,
            "svc",
            Some(&LevelSpec::Name("loud".into())),
            &HandlerSpec::Discard,
            ConfigureOptions::default(),
        )
        .expect_err("bad level");
        assert!(matches!(err, ConfigError::InvalidLevel(_)));
        assert!(!registry.contains("svc"));
    }

    #[test]
    fn remove_logger_round_trip() {
        let registry = Registry::new();
        configure_logger(
            &registry,
            "svc",
            None,
            &HandlerSpec::Discard,
            ConfigureOptions::default(),
        )
        .unwrap();

        assert!(logger_exists(&registry, "svc"));
        assert!(remove_logger(&registry, "svc"));
        assert!(!logger_exists(&registry, "svc"));
        assert!(!remove_logger(&registry, "svc"));
    }

    #[test]
    fn remove_all_loggers_empties_registry() {
        let registry = Registry::new();
        configure_logger(
            &registry,
            "one",
            None,
            &HandlerSpec::Discard,
            ConfigureOptions::default(),
        )
        .unwrap();
        configure_logger(
            &registry,
            "two",
            None,
            &HandlerSpec::Discard,
            ConfigureOptions::default(),
        )
        .unwrap();

        remove_all_loggers(&registry);
        assert!(registry.is_empty());
    }
}
