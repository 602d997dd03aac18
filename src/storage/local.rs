//! Local disk file store
//!
//! Maps virtual paths onto a host directory. Normalized paths never carry
//! `..` segments, so every mapped path stays under the root.

use crate::error::StorageError;
use crate::navigate::FtpPath;
use crate::storage::filesystem::{FileHandle, FileStore};
use crate::storage::results::DirEntry;
use log::debug;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// `FileStore` backed by a directory on the host filesystem
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Converts a virtual path to a real host path.
    pub fn real_path(&self, path: &FtpPath) -> PathBuf {
        self.root.join(path.as_str().trim_start_matches('/'))
    }
}

struct LocalFile {
    file: File,
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl FileHandle for LocalFile {
    fn size(&self) -> u64 {
        self.file.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

fn not_found(path: &FtpPath, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(path.to_string())
    } else {
        StorageError::Io(err)
    }
}

impl FileStore for LocalFileStore {
    fn exists(&self, path: &FtpPath) -> bool {
        self.real_path(path).exists()
    }

    fn open_read(&self, path: &FtpPath) -> Result<Box<dyn FileHandle>, StorageError> {
        let real = self.real_path(path);
        if real.is_dir() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let file = File::open(&real).map_err(|e| not_found(path, e))?;
        debug!("Opened {} for reading", real.display());
        Ok(Box::new(LocalFile { file }))
    }

    fn open_write(&self, path: &FtpPath) -> Result<Box<dyn FileHandle>, StorageError> {
        let real = self.real_path(path);
        let file = File::create(&real)?;
        debug!("Opened {} for writing", real.display());
        Ok(Box::new(LocalFile { file }))
    }

    fn remove(&self, path: &FtpPath) -> Result<(), StorageError> {
        fs::remove_file(self.real_path(path)).map_err(|e| not_found(path, e))
    }

    fn rename(&self, from: &FtpPath, to: &FtpPath) -> Result<(), StorageError> {
        if self.exists(to) {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        fs::rename(self.real_path(from), self.real_path(to)).map_err(|e| not_found(from, e))
    }

    fn mkdir(&self, path: &FtpPath) -> Result<(), StorageError> {
        let real = self.real_path(path);
        if real.exists() {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        fs::create_dir(real)?;
        Ok(())
    }

    fn rmdir(&self, path: &FtpPath) -> Result<(), StorageError> {
        if path.is_root() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove root",
            )));
        }
        fs::remove_dir(self.real_path(path)).map_err(|e| not_found(path, e))
    }

    fn list_dir(&self, path: &FtpPath) -> Result<Vec<DirEntry>, StorageError> {
        let real = self.real_path(path);
        if !real.is_dir() {
            return Err(StorageError::NotADirectory(path.to_string()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&real)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if metadata.is_dir() {
                entries.push(DirEntry::dir(name));
            } else {
                entries.push(DirEntry::file(name, metadata.len()));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
