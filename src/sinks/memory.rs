//! Buffering sinks: in-memory batching and a bounded queue.

use std::io;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::warn;

use super::{Sink, SinkCore, SinkHandle, SinkKind, sink_core_delegates};
use crate::level::Level;
use crate::record::LogRecord;

/// Sink buffering records until the buffer fills or a severe record arrives.
///
/// On flush, buffered records are forwarded to the optional `target` sink
/// (which applies its own threshold); without a target, flushing discards
/// the buffer. The buffer is always flushed on close.
pub struct MemorySink {
    core: SinkCore,
    capacity: usize,
    flush_level: Level,
    buffer: Vec<LogRecord>,
    target: Option<SinkHandle>,
}

impl MemorySink {
    pub fn new(capacity: usize, flush_level: Level, target: Option<SinkHandle>) -> Self {
        Self {
            core: SinkCore::new(),
            capacity: capacity.max(1),
            flush_level,
            buffer: Vec::new(),
            target,
        }
    }

    /// Replace the flush target, forwarding any already-buffered records on
    /// the next flush.
    pub fn set_target(&mut self, target: SinkHandle) {
        self.target = Some(target);
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn flush_buffer(&mut self) {
        match &self.target {
            Some(target) => {
                for record in self.buffer.drain(..) {
                    if let Err(err) = target.emit(&record) {
                        warn!("lognata: memory sink target failed: {err}");
                    }
                }
            }
            None => self.buffer.clear(),
        }
    }
}

impl Sink for MemorySink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Memory
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        self.buffer.push(record.clone());
        if self.buffer.len() >= self.capacity || record.level >= self.flush_level {
            self.flush_buffer();
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.flush_buffer();
        self.core.mark_closed();
        Ok(())
    }
}

/// Sink pushing formatted lines into a bounded channel.
///
/// Sends never block: when the queue is full the record is dropped and a
/// rate-limited consumer is expected to drain the paired [`Receiver`].
pub struct QueueSink {
    core: SinkCore,
    tx: Sender<String>,
    // Keeps declaratively-built queues alive until a consumer fetches the
    // receiver through `SinkHandle::with_sink`.
    rx: Receiver<String>,
}

impl QueueSink {
    /// Create a queue sink together with the consuming end of its channel.
    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = bounded(capacity.max(1));
        (
            Self {
                core: SinkCore::new(),
                tx,
                rx: rx.clone(),
            },
            rx,
        )
    }

    /// The consuming end of the queue. Clones share the channel, so lines
    /// already queued before the call are still delivered.
    pub fn receiver(&self) -> Receiver<String> {
        self.rx.clone()
    }
}

impl Sink for QueueSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Queue
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = self.core.format(record);
        match self.tx.try_send(line) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("lognata: queue sink full, record dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.core.mark_closed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::stream::StreamSink;
    use crate::sinks::test_support::SharedBuf;

    fn record(level: Level, message: &str) -> LogRecord {
        LogRecord::new("core", level, message)
    }

    #[test]
    fn memory_sink_flushes_to_target_when_full() {
        let buf = SharedBuf::default();
        let target = SinkHandle::new(StreamSink::new(Box::new(buf.clone())));
        let handle = SinkHandle::new(MemorySink::new(2, Level::Critical, Some(target)));

        handle.emit(&record(Level::Info, "one")).unwrap();
        assert!(buf.contents().is_empty());
        handle.emit(&record(Level::Info, "two")).unwrap();

        let output = buf.contents();
        assert!(output.contains("one"));
        assert!(output.contains("two"));
    }

    #[test]
    fn memory_sink_flushes_on_severe_record() {
        let buf = SharedBuf::default();
        let target = SinkHandle::new(StreamSink::new(Box::new(buf.clone())));
        let handle = SinkHandle::new(MemorySink::new(100, Level::Error, Some(target)));

        handle.emit(&record(Level::Info, "context")).unwrap();
        handle.emit(&record(Level::Error, "failure")).unwrap();

        let output = buf.contents();
        assert!(output.contains("context"));
        assert!(output.contains("failure"));
    }

    #[test]
    fn memory_sink_without_target_discards_on_flush() {
        let handle = SinkHandle::new(MemorySink::new(1, Level::Critical, None));
        handle.emit(&record(Level::Info, "gone")).unwrap();
        handle.close().unwrap();
    }

    #[test]
    fn queue_sink_delivers_formatted_lines() {
        let (sink, rx) = QueueSink::bounded(8);
        let handle = SinkHandle::new(sink);

        handle.emit(&record(Level::Info, "queued")).unwrap();
        let line = rx.try_recv().expect("line queued");
        assert!(line.ends_with("core - INFO - queued"), "got: {line}");
    }

    #[test]
    fn queue_receiver_reachable_on_declaratively_built_sink() {
        let handle = crate::sinks::build_sink(
            crate::sinks::SinkKind::Queue,
            &crate::config::SinkParams::new(),
        )
        .unwrap();

        handle.emit(&record(Level::Info, "early")).unwrap();
        let rx = handle
            .with_sink(|sink: &mut QueueSink| sink.receiver())
            .expect("queue sink behind the handle");
        assert!(rx.try_recv().expect("queued line").contains("early"));
    }

    #[test]
    fn memory_target_settable_through_handle() {
        let buf = SharedBuf::default();
        let target = SinkHandle::new(StreamSink::new(Box::new(buf.clone())));
        let handle = crate::sinks::build_sink(
            crate::sinks::SinkKind::Memory,
            &crate::config::SinkParams::new().with("capacity", 1i64),
        )
        .unwrap();

        handle
            .with_sink(|sink: &mut MemorySink| sink.set_target(target))
            .expect("memory sink behind the handle");
        handle.emit(&record(Level::Info, "forwarded")).unwrap();

        assert!(buf.contents().contains("forwarded"));
    }

    #[test]
    fn with_sink_rejects_mismatched_type() {
        let (sink, _rx) = QueueSink::bounded(1);
        let handle = SinkHandle::new(sink);
        assert!(handle.with_sink(|_: &mut MemorySink| ()).is_none());
    }

    #[test]
    fn queue_sink_drops_when_full_without_blocking() {
        let (sink, rx) = QueueSink::bounded(1);
        let handle = SinkHandle::new(sink);

        handle.emit(&record(Level::Info, "kept")).unwrap();
        handle.emit(&record(Level::Info, "dropped")).unwrap();

        assert!(rx.try_recv().expect("first line").contains("kept"));
        assert!(rx.try_recv().is_err());
    }
}
