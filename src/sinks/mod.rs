//! Output sinks and the symbolic-name sink factory.
//!
//! A sink is a destination for formatted log records. Every sink carries its
//! own severity threshold and a shared formatter; the severity gate and the
//! closed-state check live on [`SinkHandle`] so concrete sinks only implement
//! resource handling.

use std::any::Any;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::SinkParams;
use crate::error::ConfigError;
use crate::formatter::{Formatter, default_formatter};
use crate::level::Level;
use crate::record::LogRecord;

pub mod file;
pub mod http;
#[cfg(test)]
pub(crate) mod test_support;
pub mod mail;
pub mod memory;
pub mod net;
pub mod rotating;
pub mod stream;

pub use file::{FileSink, WatchedFileSink};
pub use http::{HttpMethod, HttpSink};
pub use mail::MailSink;
pub use memory::{MemorySink, QueueSink};
pub use net::{DatagramSink, SocketSink, SyslogSink};
pub use rotating::{RotatingFileSink, RotationInterval, TimedRotatingFileSink};
pub use stream::{NullSink, StreamSink};

/// Closed set of symbolic handler-type names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Null,
    Stream,
    File,
    WatchedFile,
    RotatingFile,
    TimedRotatingFile,
    Socket,
    Datagram,
    Syslog,
    EventLog,
    Smtp,
    Memory,
    Http,
    Queue,
}

impl SinkKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SinkKind::Null => "null",
            SinkKind::Stream => "stream",
            SinkKind::File => "file",
            SinkKind::WatchedFile => "watchedfile",
            SinkKind::RotatingFile => "rotatingfile",
            SinkKind::TimedRotatingFile => "timedrotatingfile",
            SinkKind::Socket => "socket",
            SinkKind::Datagram => "datagram",
            SinkKind::Syslog => "syslog",
            SinkKind::EventLog => "eventlog",
            SinkKind::Smtp => "smtp",
            SinkKind::Memory => "memory",
            SinkKind::Http => "http",
            SinkKind::Queue => "queue",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(Self::Null),
            "stream" => Ok(Self::Stream),
            "file" => Ok(Self::File),
            "watchedfile" => Ok(Self::WatchedFile),
            "rotatingfile" => Ok(Self::RotatingFile),
            "timedrotatingfile" => Ok(Self::TimedRotatingFile),
            "socket" => Ok(Self::Socket),
            "datagram" => Ok(Self::Datagram),
            "syslog" => Ok(Self::Syslog),
            // `nteventlog` is the name older configurations use
            "eventlog" | "nteventlog" => Ok(Self::EventLog),
            "smtp" => Ok(Self::Smtp),
            "memory" => Ok(Self::Memory),
            "http" => Ok(Self::Http),
            "queue" => Ok(Self::Queue),
            _ => Err(ConfigError::UnknownHandlerType(s.to_string())),
        }
    }
}

/// State shared by every concrete sink: threshold, formatter, closed flag.
pub(crate) struct SinkCore {
    level: Level,
    formatter: Arc<dyn Formatter>,
    closed: bool,
}

impl SinkCore {
    pub(crate) fn new() -> Self {
        Self {
            level: Level::Notset,
            formatter: default_formatter(),
            closed: false,
        }
    }

    pub(crate) fn level(&self) -> Level {
        self.level
    }

    pub(crate) fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub(crate) fn set_formatter(&mut self, formatter: Arc<dyn Formatter>) {
        self.formatter = formatter;
    }

    pub(crate) fn closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub(crate) fn format(&self, record: &LogRecord) -> String {
        self.formatter.format(record)
    }
}

/// Implements the [`Sink`] methods that merely delegate to the embedded
/// [`SinkCore`] field.
macro_rules! sink_core_delegates {
    () => {
        fn level(&self) -> crate::level::Level {
            self.core.level()
        }

        fn set_level(&mut self, level: crate::level::Level) {
            self.core.set_level(level);
        }

        fn set_formatter(
            &mut self,
            formatter: std::sync::Arc<dyn crate::formatter::Formatter>,
        ) {
            self.core.set_formatter(formatter);
        }

        fn is_closed(&self) -> bool {
            self.core.closed()
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}
pub(crate) use sink_core_delegates;

/// Trait implemented by all output sinks.
///
/// `emit` is only invoked by [`SinkHandle`] after the severity gate and the
/// closed-state check have passed, so implementations format and write
/// unconditionally. `close` releases the underlying OS resource and must be
/// idempotent.
pub trait Sink: Send + 'static {
    fn kind(&self) -> SinkKind;
    fn level(&self) -> Level;
    fn set_level(&mut self, level: Level);
    fn set_formatter(&mut self, formatter: Arc<dyn Formatter>);
    fn emit(&mut self, record: &LogRecord) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
    fn is_closed(&self) -> bool;
    /// Access to the concrete sink for [`SinkHandle::with_sink`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Cheaply clonable, shareable handle to a sink.
///
/// A logger owns handles rather than sinks so callers (and tests) can retain
/// a clone and observe closure after the logger releases the sink.
#[derive(Clone)]
pub struct SinkHandle {
    inner: Arc<Mutex<dyn Sink>>,
    kind: SinkKind,
}

impl SinkHandle {
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        let kind = sink.kind();
        Self {
            inner: Arc::new(Mutex::new(sink)),
            kind,
        }
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn level(&self) -> Level {
        self.inner.lock().level()
    }

    pub fn set_level(&self, level: Level) {
        self.inner.lock().set_level(level);
    }

    pub fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        self.inner.lock().set_formatter(formatter);
    }

    /// Emit a record through the sink.
    ///
    /// Records below the sink threshold are dropped here; emitting on a
    /// closed sink is a no-op.
    pub fn emit(&self, record: &LogRecord) -> io::Result<()> {
        let mut sink = self.inner.lock();
        if sink.is_closed() || record.level < sink.level() {
            return Ok(());
        }
        sink.emit(record)
    }

    /// Close the sink, releasing its underlying resource. Idempotent.
    pub fn close(&self) -> io::Result<()> {
        let mut sink = self.inner.lock();
        if sink.is_closed() {
            return Ok(());
        }
        sink.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_closed()
    }

    /// Identity comparison: two handles are the same sink when they share
    /// the allocation.
    pub fn ptr_eq(&self, other: &SinkHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run `f` against the concrete sink when it is an `S`.
    ///
    /// This is how capabilities beyond the [`Sink`] trait are reached after
    /// construction, such as [`QueueSink::receiver`] or
    /// [`MemorySink::set_target`] on declaratively built sinks.
    pub fn with_sink<S: Sink, R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let mut sink = self.inner.lock();
        sink.as_any_mut().downcast_mut::<S>().map(f)
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Construct a configured sink from a symbolic kind and a parameter set.
///
/// Parameter keys are the external contract of each destination; unknown
/// keys are ignored. The caller applies the resolved severity threshold and
/// the shared formatter after construction.
pub fn build_sink(kind: SinkKind, params: &SinkParams) -> Result<SinkHandle, ConfigError> {
    let handle = match kind {
        SinkKind::Null => SinkHandle::new(NullSink::new()),
        SinkKind::Stream => match params.str_opt("stream")?.unwrap_or("stderr") {
            "stdout" => SinkHandle::new(StreamSink::stdout()),
            "stderr" => SinkHandle::new(StreamSink::stderr()),
            other => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "unknown stream target: {other}"
                )));
            }
        },
        SinkKind::File => SinkHandle::new(FileSink::open(params.require_str("filename")?)?),
        SinkKind::WatchedFile => {
            SinkHandle::new(WatchedFileSink::open(params.require_str("filename")?)?)
        }
        SinkKind::RotatingFile => {
            let filename = params.require_str("filename")?;
            let max_bytes = params.u64_opt("max_bytes")?.unwrap_or(0);
            let backup_count = params.usize_opt("backup_count")?.unwrap_or(0);
            SinkHandle::new(RotatingFileSink::open(filename, max_bytes, backup_count)?)
        }
        SinkKind::TimedRotatingFile => {
            let filename = params.require_str("filename")?;
            let when = params
                .str_opt("when")?
                .unwrap_or("hours")
                .parse::<RotationInterval>()?;
            let interval = params.u64_opt("interval")?.unwrap_or(1);
            let backup_count = params.usize_opt("backup_count")?.unwrap_or(0);
            SinkHandle::new(TimedRotatingFileSink::open(
                filename,
                when,
                interval,
                backup_count,
            )?)
        }
        SinkKind::Socket => SinkHandle::new(SocketSink::new(
            params.require_str("host")?,
            params.require_u16("port")?,
        )),
        SinkKind::Datagram => SinkHandle::new(DatagramSink::new(
            params.require_str("host")?,
            params.require_u16("port")?,
        )),
        SinkKind::Syslog => {
            let host = params.str_opt("host")?.unwrap_or("localhost");
            let port = params.u16_opt("port")?.unwrap_or(514);
            let facility = params.u64_opt("facility")?.unwrap_or(1);
            if facility > 23 {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "syslog facility out of range: {facility}"
                )));
            }
            SinkHandle::new(SyslogSink::new(host, port, facility as u8))
        }
        SinkKind::EventLog => {
            // No event-log binding is linked; the symbolic name stays
            // recognised so configurations fail with a configuration error
            // rather than an unknown-type error.
            return Err(ConfigError::InvalidConfiguration(
                "eventlog sink is not available on this platform".to_string(),
            ));
        }
        SinkKind::Smtp => {
            let mailhost = params.require_str("mailhost")?;
            let port = params.u16_opt("port")?.unwrap_or(25);
            let from_addr = params.require_str("from_addr")?;
            let to_addrs: Vec<String> = params
                .require_str("to_addrs")?
                .split(',')
                .map(|addr| addr.trim().to_string())
                .filter(|addr| !addr.is_empty())
                .collect();
            if to_addrs.is_empty() {
                return Err(ConfigError::InvalidConfiguration(
                    "smtp sink needs at least one recipient".to_string(),
                ));
            }
            let subject = params.str_opt("subject")?.unwrap_or("Log record");
            SinkHandle::new(MailSink::new(mailhost, port, from_addr, to_addrs, subject))
        }
        SinkKind::Memory => {
            let capacity = params.usize_opt("capacity")?.unwrap_or(100);
            let flush_level = match params.str_opt("flush_level")? {
                Some(name) => name.parse()?,
                None => Level::Error,
            };
            SinkHandle::new(MemorySink::new(capacity, flush_level, None))
        }
        SinkKind::Http => {
            let host = params.require_str("host")?;
            let url = params.require_str("url")?;
            let method = params
                .str_opt("method")?
                .unwrap_or("GET")
                .parse::<HttpMethod>()?;
            let secure = params.bool_opt("secure")?.unwrap_or(false);
            let credentials = match (params.str_opt("username")?, params.str_opt("password")?) {
                (Some(user), Some(pass)) => Some((user.to_string(), pass.to_string())),
                (None, None) => None,
                _ => {
                    return Err(ConfigError::InvalidConfiguration(
                        "http sink credentials need both username and password".to_string(),
                    ));
                }
            };
            SinkHandle::new(HttpSink::new(host, url, method, secure, credentials))
        }
        SinkKind::Queue => {
            let capacity = params.usize_opt("capacity")?.unwrap_or(1024);
            SinkHandle::new(QueueSink::bounded(capacity).0)
        }
    };
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use static_assertions::assert_impl_all;

    #[test]
    fn sink_handle_is_send_sync() {
        assert_impl_all!(SinkHandle: Send, Sync);
    }

    #[rstest]
    #[case("stream", SinkKind::Stream)]
    #[case("file", SinkKind::File)]
    #[case("null", SinkKind::Null)]
    #[case("watchedfile", SinkKind::WatchedFile)]
    #[case("rotatingfile", SinkKind::RotatingFile)]
    #[case("timedrotatingfile", SinkKind::TimedRotatingFile)]
    #[case("socket", SinkKind::Socket)]
    #[case("datagram", SinkKind::Datagram)]
    #[case("syslog", SinkKind::Syslog)]
    #[case("eventlog", SinkKind::EventLog)]
    #[case("smtp", SinkKind::Smtp)]
    #[case("memory", SinkKind::Memory)]
    #[case("http", SinkKind::Http)]
    #[case("queue", SinkKind::Queue)]
    fn symbolic_names_round_trip(#[case] name: &str, #[case] kind: SinkKind) {
        assert_eq!(name.parse::<SinkKind>().unwrap(), kind);
        assert_eq!(kind.as_str(), name);
    }

    #[rstest]
    #[case("console")]
    #[case("STREAM")]
    #[case("")]
    fn unknown_symbolic_name_is_rejected(#[case] name: &str) {
        let err = name.parse::<SinkKind>().expect_err("must reject");
        assert!(matches!(err, ConfigError::UnknownHandlerType(_)));
    }

    #[test]
    fn nteventlog_parses_as_the_eventlog_kind() {
        assert_eq!("nteventlog".parse::<SinkKind>().unwrap(), SinkKind::EventLog);
    }

    #[rstest]
    #[case(SinkKind::Socket)]
    #[case(SinkKind::Datagram)]
    fn factory_rejects_out_of_range_port(#[case] kind: SinkKind) {
        let params = SinkParams::new()
            .with("host", "127.0.0.1")
            .with("port", 70_000i64);
        let err = build_sink(kind, &params).expect_err("port above u16::MAX");
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn factory_rejects_out_of_range_syslog_facility() {
        let params = SinkParams::new().with("facility", 24i64);
        let err = build_sink(SinkKind::Syslog, &params).expect_err("facility above 23");
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn factory_rejects_missing_mandatory_parameter() {
        let err = build_sink(SinkKind::File, &SinkParams::new()).expect_err("no filename");
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn factory_rejects_eventlog() {
        let err = build_sink(SinkKind::EventLog, &SinkParams::new()).expect_err("unsupported");
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
    }

    #[test]
    fn emit_after_close_is_a_noop() {
        let handle = build_sink(SinkKind::Null, &SinkParams::new()).unwrap();
        handle.close().unwrap();
        assert!(handle.is_closed());
        let record = LogRecord::new("core", Level::Error, "late");
        handle.emit(&record).unwrap();
        // closing twice stays fine
        handle.close().unwrap();
    }
}
