//! Broker connection factory and live connection.
//!
//! The [`Connector`] owns the connection parameters (broker address and
//! worker identity) and produces a fresh, independent [`Connection`] on
//! every `spawn()` call - connections are never reused or pooled. The
//! event loop replaces its primary connection wholesale on reconnect.
//!
//! Identity is announced as a one-frame preamble message written right
//! after connect, before any application traffic, so the broker can
//! route to this worker from the first request on.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Result, WorkerError};
use crate::protocol::{Message, MessageBuffer};

/// Read buffer size for socket reads.
const READ_BUF_SIZE: usize = 64 * 1024;

/// Factory for outbound broker connections.
#[derive(Debug, Clone)]
pub struct Connector {
    /// Broker address (`host:port`).
    address: String,
    /// Worker identity name; empty means anonymous.
    identity: String,
    /// Upper bound on how long a connect attempt may take.
    connect_timeout: Duration,
}

impl Connector {
    /// Create a factory for the given broker address and identity.
    pub fn new(address: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            identity: identity.into(),
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The broker address this factory dials.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Create a new identified, non-lingering outbound connection.
    ///
    /// Each call produces an independent connection: connect, disable
    /// Nagle and linger, then announce identity (if one is configured)
    /// before any other traffic.
    pub async fn spawn(&self) -> Result<Connection> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| WorkerError::ConnectTimeout)??;

        stream.set_nodelay(true)?;
        // Close must never block waiting for in-flight data.
        stream.set_linger(Some(Duration::ZERO))?;

        let mut conn = Connection::new(stream);
        if !self.identity.is_empty() {
            let mut preamble = Message::new();
            preamble.append(bytes::Bytes::copy_from_slice(self.identity.as_bytes()));
            conn.send(&preamble).await?;
        }
        Ok(conn)
    }
}

/// A single live transport endpoint, owned exclusively by its creator.
pub struct Connection {
    stream: TcpStream,
    buffer: MessageBuffer,
    read_buf: Vec<u8>,
}

impl Connection {
    /// Wrap an already-connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            buffer: MessageBuffer::new(),
            read_buf: vec![0u8; READ_BUF_SIZE],
        }
    }

    /// Transmit all frames of a message in order as one multipart unit.
    ///
    /// An empty frame stack goes out as a single empty frame.
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        let bytes = message.to_bytes();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Receive one complete multipart message.
    ///
    /// Blocks until a full message is assembled; partial receives are
    /// never exposed. Cancel-safe: the only suspension point is the
    /// socket read, and bytes already read live in the internal buffer,
    /// so a cancelled `recv` resumes where it left off next call.
    pub async fn recv(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.buffer.try_extract_one()? {
                return Ok(message);
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(WorkerError::ConnectionClosed);
            }
            // Raw bytes only; extraction happens at the top of the loop,
            // one message per call, the rest stay buffered.
            self.buffer.feed(&self.read_buf[..n]);
        }
    }
}
