//! Console stream sink and the discard sink.

use std::io::{self, Write};

use super::{Sink, SinkCore, SinkKind, sink_core_delegates};
use crate::record::LogRecord;

/// Sink that silently drops every record.
///
/// Built when no handler configuration is supplied at all, so emit calls on
/// an unconfigured logger stay cheap and side-effect free.
pub struct NullSink {
    core: SinkCore,
}

impl NullSink {
    pub fn new() -> Self {
        Self {
            core: SinkCore::new(),
        }
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for NullSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Null
    }

    fn emit(&mut self, _record: &LogRecord) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.core.mark_closed();
        Ok(())
    }
}

/// Sink writing formatted lines to a stream, flushed per record.
pub struct StreamSink {
    core: SinkCore,
    writer: Box<dyn Write + Send>,
}

impl StreamSink {
    /// Create a sink writing to an arbitrary stream. Used directly in tests
    /// with shared in-memory buffers.
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            core: SinkCore::new(),
            writer,
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Default console target, mirroring the platform's stream handler.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl Sink for StreamSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Stream
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = self.core.format(record);
        writeln!(self.writer, "{line}")?;
        self.writer.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        let result = self.writer.flush();
        self.core.mark_closed();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::sinks::SinkHandle;
    use crate::sinks::test_support::SharedBuf;

    #[test]
    fn stream_sink_writes_formatted_line() {
        let buf = SharedBuf::default();
        let handle = SinkHandle::new(StreamSink::new(Box::new(buf.clone())));
        handle.emit(&LogRecord::new("core", Level::Info, "hello")).unwrap();

        let output = buf.contents();
        assert!(output.ends_with("core - INFO - hello\n"), "got: {output}");
    }

    #[test]
    fn stream_sink_respects_threshold() {
        let buf = SharedBuf::default();
        let handle = SinkHandle::new(StreamSink::new(Box::new(buf.clone())));
        handle.set_level(Level::Warning);

        handle.emit(&LogRecord::new("core", Level::Info, "dropped")).unwrap();
        handle.emit(&LogRecord::new("core", Level::Error, "kept")).unwrap();

        let output = buf.contents();
        assert!(!output.contains("dropped"));
        assert!(output.contains("kept"));
    }

    #[test]
    fn null_sink_discards_everything() {
        let handle = SinkHandle::new(NullSink::new());
        handle.emit(&LogRecord::new("core", Level::Critical, "gone")).unwrap();
        assert_eq!(handle.kind(), SinkKind::Null);
    }
}
