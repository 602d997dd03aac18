//! TCP transport
//!
//! `std::net` sockets in non-blocking mode.

use crate::transport::{Connection, Listener};
use log::{debug, error, warn};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

const WRITE_RETRY_SLEEP: Duration = Duration::from_millis(1);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
const PEEK_SIZE: usize = 4096;

/// Listening TCP endpoint
pub struct TcpEndpoint {
    addr: SocketAddr,
    listener: Option<TcpListener>,
    pending: Option<TcpStream>,
}

impl TcpEndpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            listener: None,
            pending: None,
        }
    }

    /// Moves one waiting connection from the OS backlog into the stash.
    fn poll_accept(&mut self) {
        if self.pending.is_some() {
            return;
        }
        let Some(listener) = self.listener.as_ref() else {
            return;
        };
        match listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nonblocking(true) {
                    error!("Failed to set stream from {} non-blocking: {}", peer, e);
                    return;
                }
                let _ = stream.set_nodelay(true);
                debug!("Accepted connection from {} on {}", peer, self.addr);
                self.pending = Some(stream);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => warn!("Accept failed on {}: {}", self.addr, e),
        }
    }
}

impl Listener for TcpEndpoint {
    type Conn = TcpConnection;

    fn listen(&mut self) -> io::Result<()> {
        let listener = TcpListener::bind(self.addr)?;
        listener.set_nonblocking(true)?;
        self.addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(())
    }

    fn has_pending_client(&mut self) -> bool {
        self.poll_accept();
        self.pending.is_some()
    }

    fn accept_client(&mut self) -> Option<TcpConnection> {
        self.poll_accept();
        self.pending.take().map(TcpConnection::new)
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(|_| self.addr)
    }
}

/// Non-blocking TCP stream
pub struct TcpConnection {
    stream: Option<TcpStream>,
}

impl TcpConnection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }
}

impl Connection for TcpConnection {
    fn is_connected(&self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };
        let mut peek_buf = [0u8; 1];
        match stream.peek(&mut peek_buf) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => e.kind() == ErrorKind::WouldBlock,
        }
    }

    fn available(&self) -> usize {
        let Some(stream) = self.stream.as_ref() else {
            return 0;
        };
        let mut peek_buf = [0u8; PEEK_SIZE];
        stream.peek(&mut peek_buf).unwrap_or(0)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };
        match stream.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::from(ErrorKind::NotConnected));
        };
        match stream.write(data) {
            Ok(0) if !data.is_empty() => Err(io::Error::from(ErrorKind::WriteZero)),
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Blocks for at most five seconds while the send buffer is full.
    fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::from(ErrorKind::NotConnected));
        };
        let started = Instant::now();
        while !data.is_empty() {
            match stream.write(data) {
                Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero)),
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if started.elapsed() > WRITE_TIMEOUT {
                        return Err(io::Error::from(ErrorKind::TimedOut));
                    }
                    thread::sleep(WRITE_RETRY_SLEEP);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
