//! Named logger handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::RwLock;

use crate::formatter::{DefaultFormatter, Formatter};
use crate::level::Level;
use crate::record::LogRecord;
use crate::sinks::SinkHandle;

struct LoggerInner {
    name: String,
    level: AtomicU8,
    sinks: RwLock<Vec<SinkHandle>>,
}

/// Cheaply clonable handle to a named logger.
///
/// Clones share the same level and sink list, so a logger fetched twice from
/// the registry behaves as one object. A fresh logger has level NOTSET and no
/// sinks: every record passes the logger gate and goes nowhere.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                name: name.into(),
                level: AtomicU8::new(Level::Notset.value()),
                sinks: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn level(&self) -> Level {
        Level::from_value(self.inner.level.load(Ordering::Relaxed)).unwrap_or(Level::Notset)
    }

    pub fn set_level(&self, level: Level) {
        self.inner.level.store(level.value(), Ordering::Relaxed);
    }

    /// Record a message at `level`, returning the formatted line when the
    /// record passed the logger gate.
    ///
    /// Each attached sink applies its own threshold afterwards; a sink write
    /// failure is reported through the `log` facade and does not stop
    /// delivery to the remaining sinks.
    pub fn log(&self, level: Level, message: &str) -> Option<String> {
        let threshold = self.level();
        if threshold != Level::Notset && level < threshold {
            return None;
        }
        let record = LogRecord::new(self.name(), level, message);
        let sinks = self.inner.sinks.read();
        for sink in sinks.iter() {
            if let Err(err) = sink.emit(&record) {
                log::warn!("lognata: sink {:?} failed: {err}", sink.kind());
            }
        }
        Some(DefaultFormatter.format(&record))
    }

    pub fn debug(&self, message: &str) -> Option<String> {
        self.log(Level::Debug, message)
    }

    pub fn info(&self, message: &str) -> Option<String> {
        self.log(Level::Info, message)
    }

    pub fn warning(&self, message: &str) -> Option<String> {
        self.log(Level::Warning, message)
    }

    pub fn error(&self, message: &str) -> Option<String> {
        self.log(Level::Error, message)
    }

    pub fn critical(&self, message: &str) -> Option<String> {
        self.log(Level::Critical, message)
    }

    /// Attach a sink.
    ///
    /// With `reset_by_kind`, existing sinks of the same kind are closed and
    /// detached first, so the new sink replaces its peers instead of joining
    /// them.
    pub fn attach_sink(&self, sink: SinkHandle, reset_by_kind: bool) {
        let mut sinks = self.inner.sinks.write();
        if reset_by_kind {
            sinks.retain(|existing| {
                if existing.kind() == sink.kind() {
                    close_logging(existing);
                    false
                } else {
                    true
                }
            });
        }
        sinks.push(sink);
    }

    /// Attach several sinks in order, applying the same replacement policy
    /// to each.
    pub fn attach_sinks(
        &self,
        sinks: impl IntoIterator<Item = SinkHandle>,
        reset_by_kind: bool,
    ) {
        for sink in sinks {
            self.attach_sink(sink, reset_by_kind);
        }
    }

    /// Detach a specific sink by identity, closing it. Returns whether the
    /// sink was attached.
    pub fn detach_sink(&self, sink: &SinkHandle) -> bool {
        let mut sinks = self.inner.sinks.write();
        let before = sinks.len();
        sinks.retain(|existing| {
            if existing.ptr_eq(sink) {
                close_logging(existing);
                false
            } else {
                true
            }
        });
        sinks.len() != before
    }

    /// Close and detach every sink.
    pub fn clear_sinks(&self) {
        let mut sinks = self.inner.sinks.write();
        for sink in sinks.drain(..) {
            close_logging(&sink);
        }
    }

    pub fn sink_count(&self) -> usize {
        self.inner.sinks.read().len()
    }

    /// Snapshot of the attached sink handles, in attachment order.
    pub fn sinks(&self) -> Vec<SinkHandle> {
        self.inner.sinks.read().clone()
    }

    /// Identity comparison for clones of the same logger.
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn close_logging(sink: &SinkHandle) {
    if let Err(err) = sink.close() {
        log::warn!("lognata: failed to close sink {:?}: {err}", sink.kind());
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("level", &self.level())
            .field("sinks", &self.sink_count())
            .finish()
    }
}
