//! Size-based and interval-based rotating file sinks.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Duration as ChronoDuration, Local};

use super::file::open_append;
use super::{Sink, SinkCore, SinkKind, sink_core_delegates};
use crate::error::ConfigError;
use crate::record::LogRecord;

/// File sink rolling over once the file would exceed `max_bytes`.
///
/// Backups shuffle through `path.1` … `path.N` with the oldest dropped;
/// `max_bytes == 0` disables rotation entirely.
pub struct RotatingFileSink {
    core: SinkCore,
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    writer: Option<BufWriter<File>>,
    size: u64,
}

impl RotatingFileSink {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        let path = path.into();
        let writer = open_append(&path)?;
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            core: SinkCore::new(),
            path,
            max_bytes,
            backup_count,
            writer: Some(writer),
            size,
        })
    }

    fn should_rollover(&self, incoming: u64) -> bool {
        self.max_bytes > 0 && self.size > 0 && self.size + incoming > self.max_bytes
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rollover(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        if self.backup_count > 0 {
            let oldest = self.backup_path(self.backup_count);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        } else {
            fs::remove_file(&self.path)?;
        }
        self.writer = Some(open_append(&self.path)?);
        self.size = 0;
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::RotatingFile
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        let line = self.core.format(record);
        let incoming = line.len() as u64 + 1;
        if self.should_rollover(incoming) {
            self.rollover()?;
        }
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writeln!(writer, "{line}")?;
        writer.flush()?;
        self.size += incoming;
        Ok(())
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

/// Rollover interval unit for [`TimedRotatingFileSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationInterval {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl RotationInterval {
    const fn seconds(self) -> i64 {
        match self {
            RotationInterval::Seconds => 1,
            RotationInterval::Minutes => 60,
            RotationInterval::Hours => 3600,
            RotationInterval::Days => 86_400,
        }
    }
}

impl FromStr for RotationInterval {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "seconds" => Ok(Self::Seconds),
            "m" | "minutes" => Ok(Self::Minutes),
            "h" | "hours" => Ok(Self::Hours),
            "d" | "days" => Ok(Self::Days),
            other => Err(ConfigError::InvalidConfiguration(format!(
                "unknown rotation interval: {other}"
            ))),
        }
    }
}

/// File sink rolling over on a wall-clock schedule.
///
/// On rollover the current file is renamed to `path.YYYY-MM-DD_HH-MM-SS` and
/// backups beyond `backup_count` are pruned (oldest first); `backup_count ==
/// 0` keeps every backup.
pub struct TimedRotatingFileSink {
    core: SinkCore,
    path: PathBuf,
    interval: ChronoDuration,
    backup_count: usize,
    writer: Option<BufWriter<File>>,
    next_rollover: DateTime<Local>,
}

impl TimedRotatingFileSink {
    pub fn open(
        path: impl Into<PathBuf>,
        when: RotationInterval,
        interval: u64,
        backup_count: usize,
    ) -> Result<Self, ConfigError> {
        if interval == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "rotation interval must be greater than zero".to_string(),
            ));
        }
        let path = path.into();
        let writer = open_append(&path)?;
        let interval = ChronoDuration::seconds(when.seconds() * interval as i64);
        Ok(Self {
            core: SinkCore::new(),
            path,
            interval,
            backup_count,
            writer: Some(writer),
            next_rollover: Local::now() + interval,
        })
    }

    #[cfg(test)]
    pub(crate) fn force_due(&mut self) {
        self.next_rollover = Local::now() - ChronoDuration::seconds(1);
    }

    fn prune_backups(&self) -> io::Result<()> {
        if self.backup_count == 0 {
            return Ok(());
        }
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        let mut prefix = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        prefix.push('.');

        let mut backups: Vec<PathBuf> = fs::read_dir(parent)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            })
            .collect();
        backups.sort();
        while backups.len() > self.backup_count {
            fs::remove_file(backups.remove(0))?;
        }
        Ok(())
    }

    fn rollover(&mut self, now: DateTime<Local>) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        let mut rotated = self.path.as_os_str().to_owned();
        rotated.push(format!(".{}", now.format("%Y-%m-%d_%H-%M-%S")));
        fs::rename(&self.path, PathBuf::from(rotated))?;
        self.prune_backups()?;
        self.writer = Some(open_append(&self.path)?);
        while self.next_rollover <= now {
            self.next_rollover += self.interval;
        }
        Ok(())
    }
}

impl Sink for TimedRotatingFileSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::TimedRotatingFile
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        if self.writer.is_none() {
            return Ok(());
        }
        let now = Local::now();
        if now >= self.next_rollover {
            self.rollover(now)?;
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::sinks::{Sink, SinkHandle};

    fn record(message: &str) -> LogRecord {
        LogRecord::new("core", Level::Info, message)
    }

    #[test]
    fn rotation_disabled_when_max_bytes_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");

        let handle = SinkHandle::new(RotatingFileSink::open(&path, 0, 3).unwrap());
        for i in 0..50 {
            handle.emit(&record(&format!("line {i}"))).unwrap();
        }
        handle.close().unwrap();

        assert!(!path.with_extension("log.1").exists());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap().lines().count(),
            50
        );
    }

    #[test]
    fn rollover_shuffles_backups() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");

        // Every formatted line is well over 16 bytes, so each emit after the
        // first forces a rollover.
        let handle = SinkHandle::new(RotatingFileSink::open(&path, 16, 2).unwrap());
        handle.emit(&record("one")).unwrap();
        handle.emit(&record("two")).unwrap();
        handle.emit(&record("three")).unwrap();
        handle.emit(&record("four")).unwrap();
        handle.close().unwrap();

        let backup1 = dir.path().join("app.log.1");
        let backup2 = dir.path().join("app.log.2");
        assert!(std::fs::read_to_string(&path).unwrap().contains("four"));
        assert!(std::fs::read_to_string(&backup1).unwrap().contains("three"));
        assert!(std::fs::read_to_string(&backup2).unwrap().contains("two"));
        // the oldest backup was dropped
        assert!(!dir.path().join("app.log.3").exists());
    }

    #[test]
    fn timed_sink_rolls_over_when_due() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");

        let mut sink =
            TimedRotatingFileSink::open(&path, RotationInterval::Hours, 1, 0).unwrap();
        sink.emit(&record("before")).unwrap();
        sink.force_due();
        sink.emit(&record("after")).unwrap();
        sink.close().unwrap();

        let rotated: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with("app.log."))
            .collect();
        assert_eq!(rotated.len(), 1);
        assert!(std::fs::read_to_string(&rotated[0]).unwrap().contains("before"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("after"));
    }

    #[test]
    fn timed_sink_rejects_zero_interval() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = TimedRotatingFileSink::open(
            dir.path().join("app.log"),
            RotationInterval::Seconds,
            0,
            0,
        );
        assert!(matches!(
            result.err(),
            Some(ConfigError::InvalidConfiguration(_))
        ));
    }
}
