//! File system storage management
//!
//! Defines the file store capability consumed by the engine and a
//! host-directory implementation of it.

pub mod filesystem;
pub mod local;
pub mod results;

pub use filesystem::{FileHandle, FileStore};
pub use local::LocalFileStore;
pub use results::DirEntry;
