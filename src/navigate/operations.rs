//! Navigation operations implementation

use crate::error::NavigateError;
use crate::navigate::path::{FtpPath, resolve};
use crate::storage::FileStore;

/// Resolves `target` against `cwd` and returns it if the store knows it.
pub fn change_directory<S: FileStore + ?Sized>(
    store: &S,
    cwd: &FtpPath,
    target: &str,
) -> Result<FtpPath, NavigateError> {
    let new_path = resolve(cwd, target)?;

    if !store.exists(&new_path) {
        return Err(NavigateError::DirectoryNotFound(new_path.to_string()));
    }

    Ok(new_path)
}

/// Drops the trailing segment of `cwd`. No-op at the root.
pub fn change_to_parent(cwd: &FtpPath) -> FtpPath {
    cwd.parent()
}
