//! Plain and rotation-aware file sinks.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{Sink, SinkCore, SinkKind, sink_core_delegates};
use crate::record::LogRecord;

pub(crate) fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
}

/// Sink appending formatted lines to a file, flushed per record.
pub struct FileSink {
    core: SinkCore,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let writer = open_append(&path)?;
        Ok(Self {
            core: SinkCore::new(),
            path,
            writer: Some(writer),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::File
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = self.core.format(record);
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writeln!(writer, "{line}")?;
        writer.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        let result = match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        };
        self.core.mark_closed();
        result
    }
}

/// Identity of the file a path currently points at.
///
/// On Unix this is `(dev, ino)`; elsewhere only existence is tracked, so a
/// deleted-and-recreated file is still detected while an in-place rename is
/// not.
#[derive(Clone, Copy, PartialEq, Eq)]
struct FileId(u64, u64);

fn stat_file(path: &Path) -> Option<FileId> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        std::fs::metadata(path)
            .ok()
            .map(|m| FileId(m.dev(), m.ino()))
    }
    #[cfg(not(unix))]
    {
        std::fs::metadata(path).ok().map(|_| FileId(0, 0))
    }
}

/// File sink that notices when the path it writes to has been rotated away
/// underneath it (log rotation via rename or delete) and re-opens the path
/// before the next write.
pub struct WatchedFileSink {
    core: SinkCore,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    file_id: Option<FileId>,
}

impl WatchedFileSink {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let writer = open_append(&path)?;
        let file_id = stat_file(&path);
        Ok(Self {
            core: SinkCore::new(),
            path,
            writer: Some(writer),
            file_id,
        })
    }

    fn reopen_if_moved(&mut self) -> io::Result<()> {
        let current = stat_file(&self.path);
        if current == self.file_id && current.is_some() {
            return Ok(());
        }
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
        self.writer = Some(open_append(&self.path)?);
        self.file_id = stat_file(&self.path);
        Ok(())
    }
}

impl Sink for WatchedFileSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::WatchedFile
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        self.reopen_if_moved()?;
        let line = self.core.format(record);
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writeln!(writer, "{line}")?;
        writer.flush()
    }

    fn close(&mut self) -> io::Result<()> {
        let result = match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        };
        self.core.mark_closed();
        result
    }
}
