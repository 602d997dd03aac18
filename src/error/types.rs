//! Error types
//!
//! Defines domain-specific error types for each module of the FTP engine.

use std::io;
use thiserror::Error;

/// Path resolution errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path of {len} bytes does not fit in {capacity} bytes")]
    TooLong { len: usize, capacity: usize },
}

/// Control-line syntax errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("command line longer than {0} bytes")]
    LineTooLong(usize),
    #[error("command verb longer than 4 characters: {0}")]
    VerbTooLong(String),
    #[error("command line is not valid UTF-8")]
    InvalidEncoding,
}

/// Authentication module errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("expected {expected}, got {received}")]
    UnexpectedCommand {
        expected: &'static str,
        received: String,
    },
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("invalid password")]
    InvalidPassword,
}

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Navigate module errors
#[derive(Debug, Error)]
pub enum NavigateError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),
}

/// Transfer module errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("malformed PORT argument: {0}")]
    InvalidPortArgument(String),
    #[error("data connection lost: {0}")]
    DataConnectionLost(io::Error),
    #[error("file I/O failed: {0}")]
    File(io::Error),
}

/// Errors returned while starting the engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("username and password must not be empty")]
    EmptyCredentials,
    #[error("failed to start {endpoint} listener: {source}")]
    Listen {
        endpoint: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Any error raised while serving a session
#[derive(Debug, Error)]
pub enum FtpServerError {
    #[error("path error: {0}")]
    Path(#[from] PathError),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("navigation error: {0}")]
    Navigate(#[from] NavigateError),
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
}
