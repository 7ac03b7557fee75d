//! Network sinks: TCP stream, UDP datagram, and syslog.

use std::io::{self, Write};
use std::net::{Shutdown, TcpStream, UdpSocket};

use super::{Sink, SinkCore, SinkKind, sink_core_delegates};
use crate::level::Level;
use crate::record::LogRecord;

/// Sink streaming newline-delimited formatted lines over TCP.
///
/// The connection is established lazily on first emit. A failed write drops
/// the connection so the next emit reconnects.
pub struct SocketSink {
    core: SinkCore,
    addr: String,
    stream: Option<TcpStream>,
}

impl SocketSink {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            core: SinkCore::new(),
            addr: format!("{host}:{port}"),
            stream: None,
        }
    }

    fn connection(&mut self) -> io::Result<&mut TcpStream> {
        match &mut self.stream {
            Some(stream) => Ok(stream),
            slot => Ok(slot.insert(TcpStream::connect(&self.addr)?)),
        }
    }
}

impl Sink for SocketSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Socket
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = self.core.format(record);
        let stream = self.connection()?;
        if let Err(err) = stream.write_all(format!("{line}\n").as_bytes()) {
            self.stream = None;
            return Err(err);
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.core.mark_closed();
        Ok(())
    }
}

/// Sink sending one UDP datagram per record.
pub struct DatagramSink {
    core: SinkCore,
    addr: String,
    socket: Option<UdpSocket>,
}

impl DatagramSink {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            core: SinkCore::new(),
            addr: format!("{host}:{port}"),
            socket: None,
        }
    }

    fn socket(&mut self) -> io::Result<&UdpSocket> {
        match &mut self.socket {
            Some(socket) => Ok(socket),
            slot => Ok(slot.insert(UdpSocket::bind(("0.0.0.0", 0))?)),
        }
    }
}

impl Sink for DatagramSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Datagram
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let line = self.core.format(record);
        let addr = self.addr.clone();
        self.socket()?.send_to(line.as_bytes(), addr.as_str())?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.socket = None;
        self.core.mark_closed();
        Ok(())
    }
}

/// Map a record severity onto a syslog severity code.
fn syslog_severity(level: Level) -> u8 {
    match level {
        Level::Critical => 2,
        Level::Error => 3,
        Level::Warning => 4,
        Level::Debug => 7,
        Level::Info | Level::Notset => 6,
    }
}

/// Sink sending RFC 3164-style `<PRI>` datagrams to a syslog collector.
pub struct SyslogSink {
    core: SinkCore,
    addr: String,
    facility: u8,
    socket: Option<UdpSocket>,
}

impl SyslogSink {
    pub fn new(host: &str, port: u16, facility: u8) -> Self {
        Self {
            core: SinkCore::new(),
            addr: format!("{host}:{port}"),
            facility,
            socket: None,
        }
    }

    fn socket(&mut self) -> io::Result<&UdpSocket> {
        match &mut self.socket {
            Some(socket) => Ok(socket),
            slot => Ok(slot.insert(UdpSocket::bind(("0.0.0.0", 0))?)),
        }
    }
}

impl Sink for SyslogSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Syslog
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let priority = self.facility * 8 + syslog_severity(record.level);
        let payload = format!("<{priority}>{}", self.core.format(record));
        let addr = self.addr.clone();
        self.socket()?.send_to(payload.as_bytes(), addr.as_str())?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.socket = None;
        self.core.mark_closed();
        Ok(())
    }
}
