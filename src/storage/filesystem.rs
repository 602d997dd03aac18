//! Filesystem capability
//!
//! The engine reaches the backing file store only through these traits.
//! Every method is keyed by a normalized `FtpPath`.

use crate::error::StorageError;
use crate::navigate::FtpPath;
use crate::storage::results::DirEntry;
use std::io::{Read, Write};

/// An open file. Dropping the handle closes it.
pub trait FileHandle: Read + Write {
    /// Size of the file in bytes.
    fn size(&self) -> u64;
}

/// Hierarchical file store backing the FTP session
pub trait FileStore {
    fn exists(&self, path: &FtpPath) -> bool;

    /// Opens an existing file for reading.
    fn open_read(&self, path: &FtpPath) -> Result<Box<dyn FileHandle>, StorageError>;

    /// Creates or truncates a file for writing.
    fn open_write(&self, path: &FtpPath) -> Result<Box<dyn FileHandle>, StorageError>;

    fn remove(&self, path: &FtpPath) -> Result<(), StorageError>;

    fn rename(&self, from: &FtpPath, to: &FtpPath) -> Result<(), StorageError>;

    fn mkdir(&self, path: &FtpPath) -> Result<(), StorageError>;

    fn rmdir(&self, path: &FtpPath) -> Result<(), StorageError>;

    /// Entries of the directory at `path`, in store order.
    fn list_dir(&self, path: &FtpPath) -> Result<Vec<DirEntry>, StorageError>;
}
