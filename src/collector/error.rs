//! Error type for reading one raw data source.

use std::io;
use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::ParseError;

/// Failure to read or parse a single data source.
///
/// A `ReadFailure` never escapes the read that produced it: callers resolve
/// it to "no update" for the affected metric and carry on with the cycle.
#[derive(Debug)]
pub enum ReadFailure {
    /// The source does not exist (or vanished, e.g. the process exited).
    Missing(PathBuf),
    /// The source exists but is not readable by this user.
    PermissionDenied(PathBuf),
    /// The source was read but its content could not be parsed.
    Malformed { path: PathBuf, message: String },
    /// Any other I/O error.
    Io { path: PathBuf, source: io::Error },
}

impl ReadFailure {
    /// Classifies an I/O error raised while reading `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ReadFailure::Missing(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => ReadFailure::PermissionDenied(path.to_path_buf()),
            _ => ReadFailure::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Wraps a parser failure for content read from `path`.
    pub fn malformed(path: &Path, err: ParseError) -> Self {
        ReadFailure::Malformed {
            path: path.to_path_buf(),
            message: err.message,
        }
    }

    /// Returns true when the source disappeared between listing and reading.
    pub fn is_vanished(&self) -> bool {
        matches!(self, ReadFailure::Missing(_))
    }

    /// Path of the source that failed.
    pub fn path(&self) -> &Path {
        match self {
            ReadFailure::Missing(p) | ReadFailure::PermissionDenied(p) => p,
            ReadFailure::Malformed { path, .. } | ReadFailure::Io { path, .. } => path,
        }
    }
}

impl std::fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadFailure::Missing(p) => write!(f, "{} is missing", p.display()),
            ReadFailure::PermissionDenied(p) => write!(f, "permission denied: {}", p.display()),
            ReadFailure::Malformed { path, message } => {
                write!(f, "malformed {}: {}", path.display(), message)
            }
            ReadFailure::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ReadFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadFailure::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
