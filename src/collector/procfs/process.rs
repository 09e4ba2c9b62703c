//! Process reader for per-process counters from `/proc/[pid]/`.

use crate::collector::error::ReadFailure;
use crate::collector::procfs::parser::{
    ProcIo, ProcStat, parse_proc_io, parse_proc_stat, parse_smaps_rollup_pss,
};
use crate::collector::read_source;
use crate::collector::traits::SharedFs;
use std::path::PathBuf;

/// Which optional per-process files to read in one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleRequest {
    /// Read `cmdline` to resolve the command name.
    pub command: bool,
    /// Read `smaps_rollup` for the proportional set size.
    pub memory: bool,
    /// Read `io` for cumulative disk bytes.
    pub io: bool,
}

/// Everything read for one process in one cycle.
///
/// Each field is independent: a file that vanished or was unreadable leaves
/// its field `None` without affecting the others.
#[derive(Debug, Clone, Default)]
pub struct ProcessSample {
    pub pid: u32,
    pub stat: Option<ProcStat>,
    pub command: Option<String>,
    pub pss_bytes: Option<u64>,
    pub io: Option<ProcIo>,
}

/// Reads process information from `/proc/[pid]/` files.
#[derive(Clone)]
pub struct ProcessReader {
    fs: SharedFs,
    proc_path: PathBuf,
}

impl ProcessReader {
    /// Creates a new process reader.
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

    fn pid_path(&self, pid: u32, name: &str) -> PathBuf {
        self.proc_path.join(pid.to_string()).join(name)
    }

    /// Lists live process ids, ascending.
    pub async fn list_pids(&self) -> Result<Vec<u32>, ReadFailure> {
        let entries = self
            .fs
            .read_dir(&self.proc_path)
            .await
            .map_err(|e| ReadFailure::from_io(&self.proc_path, e))?;

        let mut pids: Vec<u32> = entries
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Reads `/proc/[pid]/stat`.
    pub async fn read_stat(&self, pid: u32) -> Result<ProcStat, ReadFailure> {
        let path = self.pid_path(pid, "stat");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_proc_stat(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Resolves the command name from `/proc/[pid]/cmdline`.
    ///
    /// Returns the basename of the first argument, or `None` for kernel
    /// threads whose command line is empty.
    pub async fn read_command(&self, pid: u32) -> Result<Option<String>, ReadFailure> {
        let path = self.pid_path(pid, "cmdline");
        let content = read_source(self.fs.as_ref(), &path).await?;
        let argv0 = content.split('\0').next().unwrap_or_default().trim();
        if argv0.is_empty() {
            return Ok(None);
        }
        let name = argv0.rsplit('/').next().unwrap_or(argv0);
        Ok(Some(name.to_string()))
    }

    /// Reads the proportional set size from `/proc/[pid]/smaps_rollup`.
    pub async fn read_pss(&self, pid: u32) -> Result<u64, ReadFailure> {
        let path = self.pid_path(pid, "smaps_rollup");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_smaps_rollup_pss(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads cumulative I/O counters from `/proc/[pid]/io`.
    pub async fn read_io(&self, pid: u32) -> Result<ProcIo, ReadFailure> {
        let path = self.pid_path(pid, "io");
        let content = read_source(self.fs.as_ref(), &path).await?;
        parse_proc_io(&content).map_err(|e| ReadFailure::malformed(&path, e))
    }

    /// Reads `stat` plus the requested optional files for one process.
    ///
    /// Never fails: processes exit between listing and reading, so every
    /// file is allowed to vanish independently.
    pub async fn sample(&self, pid: u32, request: SampleRequest) -> ProcessSample {
        let stat = match self.read_stat(pid).await {
            Ok(stat) => stat,
            Err(e) => {
                if !e.is_vanished() {
                    tracing::debug!(pid, error = %e, "process stat unreadable");
                }
                return ProcessSample {
                    pid,
                    ..Default::default()
                };
            }
        };

        let command = if request.command {
            self.read_command(pid).await.ok().flatten()
        } else {
            None
        };
        let pss_bytes = if request.memory {
            self.read_pss(pid).await.ok()
        } else {
            None
        };
        let io = if request.io {
            self.read_io(pid).await.ok()
        } else {
            None
        };

        ProcessSample {
            pid,
            stat: Some(stat),
            command,
            pss_bytes,
            io,
        }
    }
}
