//! Device Connection
//!
//! Owns the single TCP stream to the device and serializes request/response
//! exchanges over it.

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{HeosError, Result};
use crate::protocol::{Attributes, Command, Response, LINE_TERMINATOR};

/// Attribute whose values never reach the logs
const PASSWORD_KEY: &str = "pw";
const REDACTED: &str = "***";

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Terminal
    Closed,
}

/// An open stream to the device
struct Transport {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl Transport {
    fn open(config: &Config) -> io::Result<Self> {
        let stream = connect_stream(config)?;

        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm, every command is a single small line
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(config.read_timeout()))?;
        stream.set_write_timeout(Config::timeout(config.write_timeout_ms))?;

        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        })
    }

    /// Write one line, then read one line
    fn exchange(&mut self, line: &str) -> io::Result<String> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(LINE_TERMINATOR.as_bytes())?;
        self.writer.flush()?;

        let mut reply = String::new();
        if self.reader.read_line(&mut reply)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by device",
            ));
        }

        let trimmed = reply.trim_end_matches(['\r', '\n']).len();
        reply.truncate(trimmed);
        Ok(reply)
    }

    /// Best-effort shutdown, errors are ignored
    fn shutdown(self) {
        let _ = self.writer.get_ref().shutdown(std::net::Shutdown::Both);
    }
}

fn connect_stream(config: &Config) -> io::Result<TcpStream> {
    let timeout = Config::timeout(config.connect_timeout_ms);
    let mut last_err = None;

    for addr in config.address().to_socket_addrs()? {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{} did not resolve to any address", config.address()),
        )
    }))
}

struct Inner {
    state: ConnectionState,
    transport: Option<Transport>,
}

/// The shared connection to a device
///
/// ## Concurrency
/// `send_and_receive` holds one mutex across the whole write+read pair. The
/// protocol has no request ids, so letting another thread write before the
/// previous reply was read would hand that reply to the wrong caller.
pub struct Connection {
    config: Config,
    inner: Mutex<Inner>,
}

impl Connection {
    /// Create a disconnected connection; no I/O happens until `connect`
    pub fn new(config: Config) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                transport: None,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Open the transport. No-op when already connected.
    pub fn connect(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            ConnectionState::Connected => Ok(()),
            ConnectionState::Closed => Err(closed_error()),
            ConnectionState::Disconnected => self.open(&mut inner),
        }
    }

    /// Send one command line and read its reply line
    ///
    /// Fails fast when not connected. Any I/O failure drops the transport and
    /// moves the connection to `Disconnected`.
    pub fn send_and_receive(&self, line: &str) -> Result<String> {
        let mut guard = self.inner.lock();
        Self::exchange_locked(&mut guard, line)
    }

    /// Send a command and decode its reply
    ///
    /// A `fail` reply becomes [`HeosError::CommandFailure`]. A reply echoing
    /// a different command means the stream is out of step: the transport is
    /// dropped before the guard is released and a `Transport` error is
    /// returned, so the next exchange starts on a fresh stream.
    pub fn execute(&self, command: &Command, attrs: &Attributes) -> Result<Response> {
        let mut guard = self.inner.lock();
        let reply = Self::exchange_locked(&mut guard, &command.to_wire(attrs))?;
        let response = Response::parse(&reply)?;

        if response.command != *command {
            tracing::warn!(
                "Reply for {} received while waiting for {}, dropping connection",
                response.command,
                command
            );
            Self::reset(&mut guard);
            return Err(HeosError::transport(
                io::ErrorKind::InvalidData,
                format!(
                    "reply for {} received while waiting for {}",
                    response.command, command
                ),
            ));
        }
        drop(guard);

        response.into_result()
    }

    /// Replace the transport with a freshly opened one
    ///
    /// Not allowed after `close`.
    pub fn reconnect(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.state == ConnectionState::Closed {
            return Err(closed_error());
        }

        if let Some(old) = inner.transport.take() {
            old.shutdown();
        }
        inner.state = ConnectionState::Disconnected;

        tracing::debug!("Reconnecting to {}", self.config.address());
        self.open(&mut inner)
    }

    /// Release the transport. Idempotent; the connection cannot be reused.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if let Some(transport) = inner.transport.take() {
            tracing::debug!("Closing connection to {}", transport.peer_addr);
            transport.shutdown();
        }
        inner.state = ConnectionState::Closed;
    }

    fn exchange_locked(inner: &mut Inner, line: &str) -> Result<String> {
        let transport = match (inner.state, inner.transport.as_mut()) {
            (ConnectionState::Connected, Some(transport)) => transport,
            (ConnectionState::Closed, _) => return Err(closed_error()),
            _ => {
                return Err(HeosError::transport(
                    io::ErrorKind::NotConnected,
                    "not connected",
                ))
            }
        };

        tracing::trace!("{} >> {}", transport.peer_addr, redact(line));
        match transport.exchange(line) {
            Ok(reply) => {
                tracing::trace!("{} << {}", transport.peer_addr, reply);
                Ok(reply)
            }
            Err(e) => {
                tracing::debug!("I/O failure on {}: {}", transport.peer_addr, e);
                Self::reset(inner);
                Err(e.into())
            }
        }
    }

    /// Drop the transport and fall back to `Disconnected`
    fn reset(inner: &mut Inner) {
        if let Some(transport) = inner.transport.take() {
            transport.shutdown();
        }
        inner.state = ConnectionState::Disconnected;
    }

    fn open(&self, inner: &mut Inner) -> Result<()> {
        let transport = Transport::open(&self.config)?;
        tracing::debug!("Connected to {}", transport.peer_addr);
        inner.transport = Some(transport);
        inner.state = ConnectionState::Connected;
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(transport) = self.inner.get_mut().transport.take() {
            transport.shutdown();
        }
    }
}

fn closed_error() -> HeosError {
    HeosError::transport(io::ErrorKind::NotConnected, "connection closed")
}

/// Mask password values in an outgoing line before it is logged
fn redact(line: &str) -> Cow<'_, str> {
    let Some((head, query)) = line.split_once('?') else {
        return Cow::Borrowed(line);
    };
    let attrs = Attributes::decode(query);
    if !attrs.contains(PASSWORD_KEY) {
        return Cow::Borrowed(line);
    }

    let masked = attrs
        .iter()
        .fold(Attributes::builder(), |builder, (key, values)| {
            if values.is_empty() {
                builder.flag(key)
            } else if key == PASSWORD_KEY {
                builder.values(key, values.iter().map(|_| REDACTED))
            } else {
                builder.values(key, values)
            }
        })
        .build();
    Cow::Owned(format!("{head}?{masked}"))
}
