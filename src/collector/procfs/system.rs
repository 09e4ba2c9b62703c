//! System reader for global counters under `/proc/`.

use crate::collector::error::ReadFailure;
use crate::collector::procfs::parser::{
    CpuInfo, CpuStat, DiskStats, MemInfo, MountEntry, NetDevStats, parse_cpu_stat,
    parse_cpuinfo, parse_diskstats, parse_meminfo, parse_mounts, parse_net_dev, parse_uptime,
};
use crate::collector::read_source;
use crate::collector::traits::{FsStats, SharedFs};
use std::path::{Path, PathBuf};

/// Reads system-wide counters from `/proc/`.
///
/// Holds no state between reads: every call re-reads its source.
#[derive(Clone)]
pub struct SystemReader {
    fs: SharedFs,
    proc_path: PathBuf,
}

impl SystemReader {
    /// Creates a new system reader.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: SharedFs, proc_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.proc_path.join(name)
    }

    /// Reads `/proc/stat`. The first element is the aggregate, the rest are per-core.
    pub async fn read_cpu(&self) -> Result<Vec<CpuStat>, ReadFailure> {
        let path = self.path("stat");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_cpu_stat(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads `/proc/meminfo`.
    pub async fn read_meminfo(&self) -> Result<MemInfo, ReadFailure> {
        let path = self.path("meminfo");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_meminfo(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads per-interface counters from `/proc/net/dev`.
    pub async fn read_net_dev(&self) -> Result<Vec<NetDevStats>, ReadFailure> {
        let path = self.path("net/dev");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_net_dev(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads per-device counters from `/proc/diskstats`.
    pub async fn read_diskstats(&self) -> Result<Vec<DiskStats>, ReadFailure> {
        let path = self.path("diskstats");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_diskstats(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads seconds since boot from `/proc/uptime`.
    pub async fn read_uptime(&self) -> Result<f64, ReadFailure> {
        let path = self.path("uptime");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_uptime(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads `/proc/cpuinfo`.
    pub async fn read_cpuinfo(&self) -> Result<CpuInfo, ReadFailure> {
        let path = self.path("cpuinfo");
        let content = read_source(self.fs.as_ref(), &path).await?;
        Ok(parse_cpuinfo(&content))
    }

    /// Reads the mount table from `/proc/mounts`.
    pub async fn read_mounts(&self) -> Result<Vec<MountEntry>, ReadFailure> {
        let path = self.path("mounts");
        let content = read_source(self.fs.as_ref(), &path).await?;
        Ok(parse_mounts(&content))
    }

    /// Queries block counts of the filesystem mounted at `mount_point`.
    pub async fn read_fs_stats(&self, mount_point: &Path) -> Result<FsStats, ReadFailure> {
        self.fs
            .statvfs(mount_point)
            .await
            .map_err(|e| ReadFailure::from_io(mount_point, e))
    }

    /// Returns true when the primary counter source (`/proc/stat`) exists.
    pub async fn is_available(&self) -> bool {
        self.fs.exists(&self.path("stat")).await
    }

    /// Path of the primary counter source.
    pub fn stat_path(&self) -> PathBuf {
        self.path("stat")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[tokio::test]
    async fn test_read_cpu() {
        let fs = MockFs::typical_system();
        let reader = SystemReader::new(fs.shared(), "/proc");

        let cpus = reader.read_cpu().await.unwrap();
        assert_eq!(cpus.len(), 5); // aggregate + 4 cores
        assert_eq!(cpus[0].cpu_id, None);
        assert_eq!(cpus[4].cpu_id, Some(3));
    }

    #[tokio::test]
    async fn test_read_meminfo() {
        let fs = MockFs::typical_system();
        let reader = SystemReader::new(fs.shared(), "/proc");

        let info = reader.read_meminfo().await.unwrap();
        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_available, 12288000);
    }

    #[tokio::test]
    async fn test_read_missing_source() {
        let fs = MockFs::new();
        let reader = SystemReader::new(fs.shared(), "/proc");

        let err = reader.read_meminfo().await.unwrap_err();
        assert!(err.is_vanished());
        assert!(!reader.is_available().await);
    }

    #[tokio::test]
    async fn test_read_malformed_source() {
        let fs = MockFs::new();
        fs.add_file("/proc/stat", "garbage\n");
        let reader = SystemReader::new(fs.shared(), "/proc");

        let err = reader.read_cpu().await.unwrap_err();
        assert!(matches!(err, ReadFailure::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_read_uptime_and_cpuinfo() {
        let fs = MockFs::typical_system();
        let reader = SystemReader::new(fs.shared(), "/proc");

        assert!((reader.read_uptime().await.unwrap() - 12345.67).abs() < 1e-9);
        let info = reader.read_cpuinfo().await.unwrap();
        assert_eq!(info.processors, 4);
        assert!(info.model_name.is_some());
    }

    #[tokio::test]
    async fn test_read_fs_stats() {
        let fs = MockFs::typical_system();
        let reader = SystemReader::new(fs.shared(), "/proc");

        let stats = reader.read_fs_stats(Path::new("/")).await.unwrap();
        assert_eq!(stats.fragment_size, 4096);
        assert!(reader.read_fs_stats(Path::new("/nope")).await.is_err());
    }
}
