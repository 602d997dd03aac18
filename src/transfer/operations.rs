//! Transfer operations
//!
//! The transfer state carried between ticks and the chunked copy steps for
//! RETR and STOR. Each step moves at most one chunk.

use std::io::{Read, Write};
use std::time::Instant;

use crate::error::TransferError;
use crate::navigate::FtpPath;
use crate::storage::FileHandle;
use crate::transfer::listing::ListFormat;
use crate::transfer::results::TransferSummary;
use crate::transport::Connection;

/// Work waiting for a data connection.
pub enum DataRequest {
    List { format: ListFormat, dir: FtpPath },
    /// The file is already open for reading.
    Retrieve { file: Box<dyn FileHandle>, path: FtpPath },
    /// The file is opened once the data connection exists.
    Store { path: FtpPath },
}

impl DataRequest {
    pub fn describe(&self) -> String {
        match self {
            DataRequest::List { format, dir } => format!("{:?} {}", format, dir),
            DataRequest::Retrieve { path, .. } => format!("RETR {}", path),
            DataRequest::Store { path } => format!("STOR {}", path),
        }
    }
}

/// An open file being copied over the data connection.
pub struct TransferJob {
    file: Box<dyn FileHandle>,
    path: FtpPath,
    bytes: u64,
    started: Instant,
    /// Read from the file but not yet accepted by the data connection.
    pending: Vec<u8>,
}

impl TransferJob {
    pub fn new(file: Box<dyn FileHandle>, path: FtpPath, started: Instant) -> Self {
        Self {
            file,
            path,
            bytes: 0,
            started,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &FtpPath {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn file_size(&self) -> u64 {
        self.file.size()
    }

    /// Closes the file and reports what was moved.
    pub fn finish(self, now: Instant) -> TransferSummary {
        TransferSummary {
            bytes: self.bytes,
            elapsed: now.saturating_duration_since(self.started),
        }
    }
}

/// Transfer state of the session.
#[derive(Default)]
pub enum Transfer {
    #[default]
    Idle,
    Connecting {
        request: DataRequest,
        deadline: Instant,
    },
    Retrieving(TransferJob),
    Storing(TransferJob),
}

impl Transfer {
    pub fn is_idle(&self) -> bool {
        matches!(self, Transfer::Idle)
    }

    /// Whether bytes are being moved.
    pub fn is_active(&self) -> bool {
        matches!(self, Transfer::Retrieving(_) | Transfer::Storing(_))
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, Transfer::Connecting { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Pending,
    Done,
}

/// Sends one chunk of the file without waiting on the data connection.
/// Bytes it does not take are kept and offered again on the next step
/// before more of the file is read. `Done` once the file is exhausted.
pub fn retrieve_step<C: Connection + ?Sized>(
    job: &mut TransferJob,
    data: &mut C,
    buf: &mut [u8],
) -> Result<StepOutcome, TransferError> {
    if job.pending.is_empty() {
        let n = job.file.read(buf).map_err(TransferError::File)?;
        if n == 0 {
            return Ok(StepOutcome::Done);
        }
        job.pending.extend_from_slice(&buf[..n]);
    }
    let sent = data
        .write(&job.pending)
        .map_err(TransferError::DataConnectionLost)?;
    job.pending.drain(..sent);
    job.bytes += sent as u64;
    Ok(StepOutcome::Pending)
}

/// Stores the bytes currently available on the data connection. `Done`
/// once the client has closed it.
pub fn store_step<C: Connection + ?Sized>(
    job: &mut TransferJob,
    data: &mut C,
    buf: &mut [u8],
) -> Result<StepOutcome, TransferError> {
    if !data.is_connected() {
        job.file.flush().map_err(TransferError::File)?;
        return Ok(StepOutcome::Done);
    }

    let want = data.available().min(buf.len());
    if want == 0 {
        return Ok(StepOutcome::Pending);
    }

    let n = data
        .read(&mut buf[..want])
        .map_err(TransferError::DataConnectionLost)?;
    if n > 0 {
        job.file
            .write_all(&buf[..n])
            .map_err(TransferError::File)?;
        job.bytes += n as u64;
    }
    Ok(StepOutcome::Pending)
}
