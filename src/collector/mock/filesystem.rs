//! In-memory mock filesystem for testing readers without real `/proc`.
//!
//! This module provides `MockFs` which simulates a filesystem in memory,
//! allowing tests to run on any platform and in CI environments without Linux.
//! Clones share the same contents, so a test can keep a handle and change
//! counters between sampling cycles of a running engine.

use crate::collector::traits::{FileSystem, FsStats, SharedFs};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct MockFsInner {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Paths whose reads fail with `PermissionDenied`.
    denied: HashSet<PathBuf>,
    /// statvfs results by mount point.
    mounts: HashMap<PathBuf, FsStats>,
}

impl MockFsInner {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory, allowing tests to simulate
/// various `/proc` and `/sys` states without needing actual Linux access.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    inner: Arc<RwLock<MockFsInner>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a [`SharedFs`] handle that observes later changes to `self`.
    pub fn shared(&self) -> SharedFs {
        Arc::new(self.clone())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MockFsInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MockFsInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds (or replaces) a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut inner = self.write();
        inner.add_parents(&path);
        inner.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut inner = self.write();
        inner.add_parents(&path);
        inner.directories.insert(path);
    }

    /// Removes a file or a directory together with everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut inner = self.write();
        inner.files.retain(|p, _| !p.starts_with(path));
        inner.directories.retain(|p| !p.starts_with(path));
    }

    /// Makes reads of `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.write().denied.insert(path.as_ref().to_path_buf());
    }

    /// Registers statvfs results for a mount point.
    pub fn add_mount_stats(&self, mount_point: impl AsRef<Path>, stats: FsStats) {
        self.write()
            .mounts
            .insert(mount_point.as_ref().to_path_buf(), stats);
    }

    /// Adds a process with its typical `/proc/[pid]/` files.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `stat` - Content of `/proc/[pid]/stat`
    /// * `cmdline` - Content of `/proc/[pid]/cmdline`
    /// * `smaps_rollup` - Content of `/proc/[pid]/smaps_rollup` (skipped if empty)
    /// * `io` - Content of `/proc/[pid]/io` (skipped if empty, as for other users' processes)
    pub fn add_process(&self, pid: u32, stat: &str, cmdline: &str, smaps_rollup: &str, io: &str) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat);
        self.add_file(base.join("cmdline"), cmdline);
        if !smaps_rollup.is_empty() {
            self.add_file(base.join("smaps_rollup"), smaps_rollup);
        }
        if !io.is_empty() {
            self.add_file(base.join("io"), io);
        }
    }
}

#[async_trait]
impl FileSystem for MockFs {
    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let inner = self.read();
        if inner.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {:?}", path),
            ));
        }
        inner.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        let inner = self.read();
        inner.files.contains_key(path) || inner.directories.contains(path)
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let inner = self.read();
        if !inner.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in inner.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &inner.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    async fn statvfs(&self, path: &Path) -> io::Result<FsStats> {
        self.read().mounts.get(path).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no filesystem mounted at {:?}", path),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fs_add_file() {
        let fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 16384 kB\n");

        assert!(fs.exists(Path::new("/proc/meminfo")).await);
        assert!(fs.exists(Path::new("/proc")).await);

        let content = fs.read_to_string(Path::new("/proc/meminfo")).await.unwrap();
        assert_eq!(content, "MemTotal: 16384 kB\n");
    }

    #[tokio::test]
    async fn test_mock_fs_read_dir() {
        let fs = MockFs::new();
        fs.add_file("/proc/1/stat", "stat content");
        fs.add_file("/proc/1/cmdline", "init");
        fs.add_file("/proc/2/stat", "stat content 2");

        let proc_entries = fs.read_dir(Path::new("/proc")).await.unwrap();
        assert_eq!(proc_entries.len(), 2); // /proc/1 and /proc/2

        let proc1_entries = fs.read_dir(Path::new("/proc/1")).await.unwrap();
        assert_eq!(proc1_entries.len(), 2); // stat and cmdline
    }

    #[tokio::test]
    async fn test_mock_fs_clones_share_contents() {
        let fs = MockFs::new();
        let handle = fs.shared();
        fs.add_file("/proc/uptime", "1.00 2.00\n");

        let content = handle.read_to_string(Path::new("/proc/uptime")).await.unwrap();
        assert_eq!(content, "1.00 2.00\n");

        fs.remove("/proc/uptime");
        assert!(!handle.exists(Path::new("/proc/uptime")).await);
    }

    #[tokio::test]
    async fn test_mock_fs_remove_directory_tree() {
        let fs = MockFs::new();
        fs.add_file("/proc/7/stat", "x");
        fs.add_file("/proc/7/io", "y");

        fs.remove("/proc/7");
        assert!(!fs.exists(Path::new("/proc/7")).await);
        assert!(!fs.exists(Path::new("/proc/7/io")).await);
        assert!(fs.exists(Path::new("/proc")).await);
    }

    #[tokio::test]
    async fn test_mock_fs_denied() {
        let fs = MockFs::new();
        fs.add_file("/proc/1/io", "rchar: 1\n");
        fs.deny("/proc/1/io");

        let err = fs.read_to_string(Path::new("/proc/1/io")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[tokio::test]
    async fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent")).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(fs.statvfs(Path::new("/")).await.is_err());
    }
}
