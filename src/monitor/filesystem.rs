use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;

use super::{Monitor, RefreshContext, round_fraction};
use crate::collector::procfs::parser::MountEntry;
use crate::collector::{ReadFailure, SystemReader};
use crate::history::fingerprint;
use crate::settings::Settings;
use crate::vitals::state::{FilesystemUsage, Property, Value};

/// Filesystem types without backing storage.
const VIRTUAL_FS_TYPES: &[&str] = &[
    "proc",
    "sysfs",
    "devtmpfs",
    "tmpfs",
    "cgroup",
    "cgroup2",
    "pstore",
    "mqueue",
    "hugetlbfs",
    "debugfs",
    "tracefs",
    "securityfs",
    "configfs",
    "fusectl",
    "binfmt_misc",
    "devpts",
    "autofs",
    "overlay",
    "squashfs",
    "nsfs",
    "rpc_pipefs",
    "nfsd",
    "fuse.lxcfs",
];

/// Mount point prefixes of pseudo and runtime trees.
const PSEUDO_PATHS: &[&str] = &["/proc", "/sys", "/dev/", "/run", "/snap"];

/// Returns true for mounts backed by real storage.
pub fn is_real_mount(entry: &MountEntry) -> bool {
    !VIRTUAL_FS_TYPES.contains(&entry.fs_type.as_str())
        && !PSEUDO_PATHS
            .iter()
            .any(|prefix| entry.mount_point.starts_with(prefix))
}

/// Size and free space of mounted filesystems from `/proc/mounts` and
/// `statvfs(3)`.
pub struct FilesystemMonitor {
    reader: SystemReader,
}

impl FilesystemMonitor {
    pub fn new(reader: SystemReader) -> Self {
        Self { reader }
    }

    async fn usage(&self, entry: &MountEntry) -> Option<FilesystemUsage> {
        let stats = match self
            .reader
            .read_fs_stats(Path::new(&entry.mount_point))
            .await
        {
            Ok(stats) => stats,
            Err(e) => {
                tracing::debug!(mount = %entry.mount_point, error = %e, "statvfs failed");
                return None;
            }
        };
        Some(FilesystemUsage {
            mount_point: entry.mount_point.clone(),
            source: entry.source.clone(),
            fs_type: entry.fs_type.clone(),
            total: stats.blocks.saturating_mul(stats.fragment_size),
            free: stats.blocks_available.saturating_mul(stats.fragment_size),
        })
    }
}

#[async_trait]
impl Monitor for FilesystemMonitor {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_fs
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let mounts = self.reader.read_mounts().await?;
        let target = ctx.settings.mount.as_str();

        let mut seen_sources = HashSet::new();
        let mut filesystems = Vec::new();
        let mut target_usage = None;

        for entry in mounts.iter().filter(|e| is_real_mount(e)) {
            // Bind mounts repeat the source device; list it once.
            let listed = seen_sources.contains(entry.source.as_str());
            if listed && entry.mount_point != target {
                continue;
            }
            let Some(usage) = self.usage(entry).await else {
                continue;
            };
            if entry.mount_point == target {
                target_usage = Some(usage.clone());
            }
            if seen_sources.insert(entry.source.as_str()) {
                filesystems.push(usage);
            }
        }

        ctx.publish(|state| {
            match &target_usage {
                Some(usage) => {
                    state.set(Property::FsUsage, Value::Float(round_fraction(usage.usage())));
                    state.set(Property::FsSize, Value::Count(usage.total));
                    state.set(Property::FsFree, Value::Count(usage.free));
                }
                None => {
                    state.set(Property::FsUsage, Value::NotApplicable);
                    state.set(Property::FsSize, Value::NotApplicable);
                    state.set(Property::FsFree, Value::NotApplicable);
                }
            }
            state.set(Property::FsList, Value::Fingerprint(fingerprint(&filesystems)));
            state.filesystems = filesystems;
        });
        Ok(())
    }

    fn destroy(&mut self) {}
}
