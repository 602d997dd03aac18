//! Virtual path resolution
//!
//! Every filesystem operation receives an `FtpPath`: absolute, `/`-rooted,
//! normalized, no trailing slash except for the root itself, and shorter
//! than the path buffer capacity.

use crate::error::PathError;
use std::fmt;

/// Capacity of the working-directory buffer, terminator included.
pub const PATH_CAPACITY: usize = 263;

/// Normalized absolute virtual path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FtpPath(String);

impl FtpPath {
    pub fn root() -> Self {
        FtpPath("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Parent directory. The root is its own parent.
    pub fn parent(&self) -> FtpPath {
        match self.0.rfind('/') {
            Some(0) | None => FtpPath::root(),
            Some(idx) => FtpPath(self.0[..idx].to_string()),
        }
    }

    /// Joins `name` under this directory by plain concatenation, the way
    /// MKD and RMD address their target.
    pub fn child(&self, name: &str) -> Result<FtpPath, PathError> {
        let joined = if self.is_root() {
            format!("/{}", name)
        } else {
            format!("{}/{}", self.0, name)
        };
        check_capacity(&joined)?;
        Ok(FtpPath(normalize(&joined)))
    }
}

impl Default for FtpPath {
    fn default() -> Self {
        FtpPath::root()
    }
}

impl fmt::Display for FtpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FtpPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves a command parameter against the working directory.
///
/// An empty parameter or `/` yields the root. Relative parameters are
/// appended to `cwd`, absolute ones replace it. The joined text must fit
/// the path buffer before it is normalized.
pub fn resolve(cwd: &FtpPath, param: &str) -> Result<FtpPath, PathError> {
    if param.is_empty() || param == "/" {
        return Ok(FtpPath::root());
    }

    let joined = if param.starts_with('/') {
        param.to_string()
    } else if cwd.is_root() {
        format!("/{}", param)
    } else {
        format!("{}/{}", cwd.as_str(), param)
    };

    check_capacity(&joined)?;
    Ok(FtpPath(normalize(&joined)))
}

fn check_capacity(joined: &str) -> Result<(), PathError> {
    if joined.len() >= PATH_CAPACITY {
        return Err(PathError::TooLong {
            len: joined.len(),
            capacity: PATH_CAPACITY,
        });
    }
    Ok(())
}

/// Collapses repeated separators, drops `.` and applies `..` (clamped at
/// the root).
fn normalize(raw: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut out = String::with_capacity(raw.len());
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> FtpPath {
        resolve(&FtpPath::root(), s).unwrap()
    }

    #[test]
    fn test_resolve_root_and_empty() {
        let cwd = path("/music");
        assert_eq!(resolve(&cwd, "").unwrap(), FtpPath::root());
        assert_eq!(resolve(&cwd, "/").unwrap(), FtpPath::root());
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let cwd = path("/music");
        assert_eq!(resolve(&cwd, "song.mp3").unwrap().as_str(), "/music/song.mp3");
        assert_eq!(resolve(&cwd, "/docs/a.txt").unwrap().as_str(), "/docs/a.txt");
        assert_eq!(resolve(&FtpPath::root(), "a").unwrap().as_str(), "/a");
    }

    #[test]
    fn test_resolve_normalizes() {
        let cwd = path("/a/b");
        assert_eq!(resolve(&cwd, "../c/").unwrap().as_str(), "/a/c");
        assert_eq!(resolve(&cwd, "./x//y").unwrap().as_str(), "/a/b/x/y");
        assert_eq!(resolve(&cwd, "../../../..").unwrap().as_str(), "/");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let cwd = path("/elsewhere");
        for p in ["/", "/a", "/a/b/c"] {
            assert_eq!(resolve(&cwd, p).unwrap().as_str(), p);
        }
        assert_eq!(resolve(&cwd, "/a/b/").unwrap().as_str(), "/a/b");
    }

    #[test]
    fn test_resolve_rejects_overflow() {
        let long = "x".repeat(PATH_CAPACITY);
        let err = resolve(&FtpPath::root(), &long).unwrap_err();
        assert!(matches!(err, PathError::TooLong { .. }));

        let fits = "y".repeat(PATH_CAPACITY - 2);
        assert!(resolve(&FtpPath::root(), &fits).is_ok());
    }

    #[test]
    fn test_parent() {
        assert_eq!(path("/a/b").parent().as_str(), "/a");
        assert_eq!(path("/a").parent(), FtpPath::root());
        assert_eq!(FtpPath::root().parent(), FtpPath::root());
    }

    #[test]
    fn test_child_concatenates() {
        assert_eq!(FtpPath::root().child("new").unwrap().as_str(), "/new");
        assert_eq!(path("/a").child("new").unwrap().as_str(), "/a/new");
        assert_eq!(path("/a").child("/new").unwrap().as_str(), "/a/new");
    }
}
