//! Transport capability
//!
//! Non-blocking byte-stream connections and the listening endpoints that
//! hand them out. The engine never blocks on these; it polls them once per
//! tick.

pub mod tcp;

use std::io;
use std::net::SocketAddr;

pub use tcp::{TcpConnection, TcpEndpoint};

/// A bidirectional, non-blocking byte stream
pub trait Connection {
    /// Whether the peer is still attached.
    fn is_connected(&self) -> bool;

    /// Number of bytes that can be read without waiting.
    fn available(&self) -> usize;

    /// Reads one byte if one is available.
    fn read_byte(&mut self) -> Option<u8>;

    /// Reads up to `buf.len()` bytes that are available right now.
    /// Returns `Ok(0)` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes what the connection accepts right now. `Ok(0)` means the
    /// send buffer is full.
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.write_all(data).map(|()| data.len())
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Writes `text` followed by CRLF.
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let mut line = Vec::with_capacity(text.len() + 2);
        line.extend_from_slice(text.as_bytes());
        line.extend_from_slice(b"\r\n");
        self.write_all(&line)
    }

    fn close(&mut self);
}

/// A listening endpoint that yields connections
pub trait Listener {
    type Conn: Connection;

    /// Starts listening.
    fn listen(&mut self) -> io::Result<()>;

    fn has_pending_client(&mut self) -> bool;

    /// Takes the next pending connection, if any.
    fn accept_client(&mut self) -> Option<Self::Conn>;

    /// Address the endpoint is bound to, once listening.
    fn local_addr(&self) -> Option<SocketAddr>;
}
