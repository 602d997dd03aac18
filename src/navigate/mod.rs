//! Navigate module
//!
//! Resolves client-supplied paths against the working directory and
//! handles directory changes.

mod operations;
pub mod path;

// Re-export public types and functions
pub use operations::{change_directory, change_to_parent};
pub use path::{FtpPath, PATH_CAPACITY, resolve};
