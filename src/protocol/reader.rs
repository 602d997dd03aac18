//! Control-line reader
//!
//! Accumulates bytes from the control connection into one command line.
//! CR is dropped, LF ends the line, `\` becomes `/`. Bytes are kept as
//! received and the finished line is decoded as UTF-8.

use crate::error::ProtocolError;
use crate::transport::Connection;

/// Outcome of polling the control connection for a line
#[derive(Debug, PartialEq, Eq)]
pub enum ReadEvent {
    /// A complete, non-empty line.
    Line(String),
    /// The line overflowed or was not UTF-8. An overflowing line is
    /// discarded up to its LF.
    Invalid(ProtocolError),
    /// No complete line yet.
    Pending,
}

#[derive(Debug)]
pub struct LineReader {
    buffer: Vec<u8>,
    max_len: usize,
    discarding: bool,
}

impl LineReader {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_len),
            max_len,
            discarding: false,
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }

    /// Consumes available bytes until a line completes or the connection
    /// has nothing more to give this tick. Empty lines are skipped.
    /// `max_len` counts raw bytes.
    pub fn poll<C: Connection + ?Sized>(&mut self, conn: &mut C) -> ReadEvent {
        while let Some(byte) = conn.read_byte() {
            match byte {
                b'\r' => {}
                b'\n' => {
                    if self.discarding {
                        self.discarding = false;
                        continue;
                    }
                    if self.buffer.is_empty() {
                        continue;
                    }
                    let raw = std::mem::take(&mut self.buffer);
                    return match String::from_utf8(raw) {
                        Ok(line) => ReadEvent::Line(line),
                        Err(_) => ReadEvent::Invalid(ProtocolError::InvalidEncoding),
                    };
                }
                _ if self.discarding => {}
                _ => {
                    if self.buffer.len() >= self.max_len {
                        self.buffer.clear();
                        self.discarding = true;
                        return ReadEvent::Invalid(ProtocolError::LineTooLong(self.max_len));
                    }
                    self.buffer.push(if byte == b'\\' { b'/' } else { byte });
                }
            }
        }
        ReadEvent::Pending
    }
}
