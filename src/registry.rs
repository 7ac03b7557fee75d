//! Process-wide logger registry.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::logger::Logger;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::default);

/// Name → logger map handed out as cheap clones.
///
/// Fetching the same name twice yields handles to the same logger, so
/// configuration applied through one handle is visible through the other.
/// Most callers use [`Registry::global`]; tests create private registries to
/// stay isolated.
#[derive(Clone, Default)]
pub struct Registry {
    loggers: Arc<RwLock<HashMap<String, Logger>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Fetch the logger registered under `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Logger {
        let mut loggers = self.loggers.write();
        loggers
            .entry(name.to_string())
            .or_insert_with(|| Logger::new(name))
            .clone()
    }

    /// Fetch an existing logger without creating one.
    pub fn get(&self, name: &str) -> Option<Logger> {
        self.loggers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.read().contains_key(name)
    }

    /// Remove a logger, closing its sinks first. Returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.loggers.write().remove(name);
        match removed {
            Some(logger) => {
                logger.clear_sinks();
                true
            }
            None => false,
        }
    }

    /// Remove every logger, closing all their sinks.
    pub fn clear(&self) {
        let drained: Vec<Logger> = self.loggers.write().drain().map(|(_, l)| l).collect();
        for logger in drained {
            logger.clear_sinks();
        }
    }

    /// Registered names, unordered.
    pub fn names(&self) -> Vec<String> {
        self.loggers.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.loggers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::{NullSink, SinkHandle};

    #[test]
    fn same_name_returns_same_logger() {
        let registry = Registry::new();
        let a = registry.get_or_create("svc");
        let b = registry.get_or_create("svc");
        assert!(a.ptr_eq(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_does_not_create() {
        let registry = Registry::new();
        assert!(registry.get("absent").is_none());
        assert!(!registry.contains("absent"));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_closes_sinks_and_reports_existence() {
        let registry = Registry::new();
        let logger = registry.get_or_create("svc");
        let sink = SinkHandle::new(NullSink::new());
        logger.attach_sink(sink.clone(), false);

        assert!(registry.remove("svc"));
        assert!(sink.is_closed());
        assert!(!registry.contains("svc"));
        assert!(!registry.remove("svc"));
    }

    #[test]
    fn clear_empties_the_registry() {
        let registry = Registry::new();
        let sink = SinkHandle::new(NullSink::new());
        registry.get_or_create("one").attach_sink(sink.clone(), false);
        registry.get_or_create("two");

        registry.clear();

        assert!(registry.is_empty());
        assert!(sink.is_closed());
    }

    #[test]
    fn names_lists_registered_loggers() {
        let registry = Registry::new();
        registry.get_or_create("a");
        registry.get_or_create("b");
        let mut names = registry.names();
        names.sort();
        assert_eq!(names, ["a", "b"]);
    }
}
