//! SMTP sink sending one mail message per record.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use super::{Sink, SinkCore, SinkKind, sink_core_delegates};
use crate::record::LogRecord;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Sink speaking a minimal synchronous SMTP exchange per record.
///
/// Each emit opens a fresh connection, runs
/// `HELO`/`MAIL FROM`/`RCPT TO`/`DATA`/`QUIT`, and closes it again. Mail
/// sinks are meant for rare, high-severity records; pair them with an
/// ERROR-or-above threshold.
pub struct MailSink {
    core: SinkCore,
    addr: String,
    from_addr: String,
    to_addrs: Vec<String>,
    subject: String,
}

impl MailSink {
    pub fn new(
        mailhost: &str,
        port: u16,
        from_addr: &str,
        to_addrs: Vec<String>,
        subject: &str,
    ) -> Self {
        Self {
            core: SinkCore::new(),
            addr: format!("{mailhost}:{port}"),
            from_addr: from_addr.to_string(),
            to_addrs,
            subject: subject.to_string(),
        }
    }

    fn send_message(&self, body: &str) -> io::Result<()> {
        let stream = TcpStream::connect(&self.addr)?;
        stream.set_read_timeout(Some(SMTP_TIMEOUT))?;
        stream.set_write_timeout(Some(SMTP_TIMEOUT))?;
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = stream;

        expect_reply(&mut reader, "220")?;
        command(&mut writer, &mut reader, "HELO lognata", "250")?;
        command(
            &mut writer,
            &mut reader,
            &format!("MAIL FROM:<{}>", self.from_addr),
            "250",
        )?;
        for recipient in &self.to_addrs {
            command(
                &mut writer,
                &mut reader,
                &format!("RCPT TO:<{recipient}>"),
                "25",
            )?;
        }
        command(&mut writer, &mut reader, "DATA", "354")?;

        let headers = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n",
            self.from_addr,
            self.to_addrs.join(", "),
            self.subject
        );
        writer.write_all(headers.as_bytes())?;
        writer.write_all(body.as_bytes())?;
        writer.write_all(b"\r\n.\r\n")?;
        writer.flush()?;
        expect_reply(&mut reader, "250")?;

        writer.write_all(b"QUIT\r\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Send one SMTP command and check the reply code prefix.
fn command(
    writer: &mut TcpStream,
    reader: &mut BufReader<TcpStream>,
    line: &str,
    expected: &str,
) -> io::Result<()> {
    writer.write_all(format!("{line}\r\n").as_bytes())?;
    writer.flush()?;
    expect_reply(reader, expected)
}

/// Read one (possibly multi-line) SMTP reply and require the given code
/// prefix.
fn expect_reply(reader: &mut BufReader<TcpStream>, expected: &str) -> io::Result<()> {
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "smtp server closed the connection",
            ));
        }
        // continuation lines look like "250-..."
        if line.as_bytes().get(3) == Some(&b'-') {
            continue;
        }
        if line.starts_with(expected) {
            return Ok(());
        }
        return Err(io::Error::other(format!(
            "unexpected smtp reply: {}",
            line.trim_end()
        )));
    }
}

impl Sink for MailSink {
    sink_core_delegates!();

    fn kind(&self) -> SinkKind {
        SinkKind::Smtp
    }

    fn emit(&mut self, record: &LogRecord) -> io::Result<()> {
        let body = self.core.format(record);
        self.send_message(&body)
    }

    fn close(&mut self) -> io::Result<()> {
        self.core.mark_closed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use super::*;
    use crate::level::Level;
    use crate::sinks::SinkHandle;

    /// Minimal SMTP responder capturing everything the client sends.
    fn fake_smtp_server(listener: TcpListener, tx: mpsc::Sender<String>, greeting: &str) {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut writer = stream;
        let mut transcript = String::new();

        writer.write_all(greeting.as_bytes()).expect("greet");
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read") == 0 {
                break;
            }
            transcript.push_str(&line);
            let upper = line.to_ascii_uppercase();
            if upper.starts_with("DATA") {
                writer.write_all(b"354 go ahead\r\n").expect("reply");
                loop {
                    let mut data = String::new();
                    reader.read_line(&mut data).expect("read data");
                    transcript.push_str(&data);
                    if data == ".\r\n" {
                        break;
                    }
                }
                writer.write_all(b"250 queued\r\n").expect("reply");
            } else if upper.starts_with("QUIT") {
                writer.write_all(b"221 bye\r\n").expect("reply");
                break;
            } else {
                writer.write_all(b"250 ok\r\n").expect("reply");
            }
        }
        tx.send(transcript).expect("send transcript");
    }

    #[test]
    fn mail_sink_sends_one_message_per_record() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        let server = thread::spawn(move || fake_smtp_server(listener, tx, "220 fake ESMTP\r\n"));

        let handle = SinkHandle::new(MailSink::new(
            "127.0.0.1",
            port,
            "alerts@example.com",
            vec!["ops@example.com".to_string()],
            "Log record",
        ));
        handle
            .emit(&LogRecord::new("core", Level::Critical, "service down"))
            .unwrap();
        handle.close().unwrap();

        let transcript = rx.recv().expect("transcript");
        assert!(transcript.contains("MAIL FROM:<alerts@example.com>"));
        assert!(transcript.contains("RCPT TO:<ops@example.com>"));
        assert!(transcript.contains("Subject: Log record"));
        assert!(transcript.contains("service down"));
        server.join().expect("server thread");
    }

    #[test]
    fn mail_sink_tolerates_odd_reply_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        // multi-line greeting with a multibyte character at the code
        // boundary of the final line
        let server = thread::spawn(move || {
            fake_smtp_server(listener, tx, "220-wélcome\r\n220é ready\r\n")
        });

        let handle = SinkHandle::new(MailSink::new(
            "127.0.0.1",
            port,
            "alerts@example.com",
            vec!["ops@example.com".to_string()],
            "Log record",
        ));
        handle
            .emit(&LogRecord::new("core", Level::Critical, "odd greeting"))
            .unwrap();
        handle.close().unwrap();

        let transcript = rx.recv().expect("transcript");
        assert!(transcript.contains("odd greeting"));
        server.join().expect("server thread");
    }

    #[test]
    fn mail_sink_reports_unreachable_server() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let handle = SinkHandle::new(MailSink::new(
            "127.0.0.1",
            port,
            "alerts@example.com",
            vec!["ops@example.com".to_string()],
            "Log record",
        ));
        handle
            .emit(&LogRecord::new("core", Level::Critical, "unreachable"))
            .expect_err("connect must fail");
    }
}
