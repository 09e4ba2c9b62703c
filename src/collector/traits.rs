//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the readers to work with both the real
//! `/proc` and `/sys` trees on Linux and mock implementations for testing.
//! Every operation is asynchronous so that one event loop can multiplex
//! all reads of a sampling cycle.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Block counts reported by `statvfs(3)` for one mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsStats {
    /// Fragment size in bytes (`f_frsize`), the unit of the block counts.
    pub fragment_size: u64,
    /// Total data blocks (`f_blocks`).
    pub blocks: u64,
    /// Free blocks (`f_bfree`).
    pub blocks_free: u64,
    /// Free blocks available to unprivileged users (`f_bavail`).
    pub blocks_available: u64,
}

/// Abstraction for filesystem operations.
///
/// This trait allows readers to use the real filesystem or a mock
/// implementation for testing purposes.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// # Arguments
    /// * `path` - Path to the file to read
    ///
    /// # Returns
    /// The file contents as a string, or an I/O error if the file cannot be read.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    async fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Queries block and free counts of the filesystem mounted at `path`.
    async fn statvfs(&self, path: &Path) -> io::Result<FsStats>;
}

/// Shared handle to a filesystem implementation, cloned into every reader.
pub type SharedFs = Arc<dyn FileSystem>;

/// Real filesystem implementation backed by `tokio::fs`.
///
/// Use this in production to read from the actual `/proc` and `/sys` trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }

    /// Creates a new `RealFs` wrapped as a [`SharedFs`].
    pub fn shared() -> SharedFs {
        Arc::new(Self)
    }
}

#[async_trait]
impl FileSystem for RealFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            paths.push(entry.path());
        }
        Ok(paths)
    }

    async fn statvfs(&self, path: &Path) -> io::Result<FsStats> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || statvfs_blocking(&path))
            .await
            .map_err(io::Error::other)?
    }
}

#[cfg(unix)]
fn statvfs_blocking(path: &Path) -> io::Result<FsStats> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: `c_path` is a valid NUL-terminated string and `stat` is a
    // properly sized, writable statvfs struct for the duration of the call.
    let stat = unsafe {
        let mut stat: libc::statvfs = std::mem::zeroed();
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(io::Error::last_os_error());
        }
        stat
    };

    #[allow(clippy::unnecessary_cast)]
    Ok(FsStats {
        fragment_size: stat.f_frsize as u64,
        blocks: stat.f_blocks as u64,
        blocks_free: stat.f_bfree as u64,
        blocks_available: stat.f_bavail as u64,
    })
}

#[cfg(not(unix))]
fn statvfs_blocking(_path: &Path) -> io::Result<FsStats> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "statvfs is only available on unix",
    ))
}
