use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Monitor, RefreshContext};
use crate::collector::{ReadFailure, SystemReader};
use crate::rates::RateState;
use crate::settings::Settings;
use crate::vitals::state::{DiskSample, Property, Value};

/// Bytes per `/proc/diskstats` sector, independent of the device.
const SECTOR_SIZE: u64 = 512;

/// Whole-disk name patterns: NVMe namespaces, SCSI/IDE/virtio/Xen disks, eMMC.
const WHOLE_DISK_PATTERNS: &[&str] = &[r"^nvme\d+n\d+$", r"^(sd|hd|vd|xvd)[a-z]+$", r"^mmcblk\d+$"];

static WHOLE_DISK: Lazy<Vec<Regex>> = Lazy::new(|| {
    WHOLE_DISK_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Returns true for whole physical disks. Partitions, loop, ram, zram and
/// device-mapper devices would count the same I/O twice.
pub fn is_whole_disk(name: &str) -> bool {
    WHOLE_DISK.iter().any(|re| re.is_match(name))
}

/// Read and write throughput from `/proc/diskstats`.
pub struct DiskMonitor {
    reader: SystemReader,
    read: RateState,
    write: RateState,
}

impl DiskMonitor {
    pub fn new(reader: SystemReader) -> Self {
        Self {
            reader,
            read: RateState::new(0),
            write: RateState::new(0),
        }
    }
}

#[async_trait]
impl Monitor for DiskMonitor {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_disk
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let disks = self.reader.read_diskstats().await?;

        let (read, written) = disks
            .iter()
            .filter(|d| is_whole_disk(&d.device))
            .fold((0u64, 0u64), |(r, w), d| {
                (
                    r.saturating_add(d.read_sectors.saturating_mul(SECTOR_SIZE)),
                    w.saturating_add(d.write_sectors.saturating_mul(SECTOR_SIZE)),
                )
            });

        self.read.update(read, ctx.now);
        self.write.update(written, ctx.now);
        let sample = DiskSample {
            read: self.read.rate().max(0.0),
            write: self.write.rate().max(0.0),
        };

        ctx.publish(|state| {
            state.set(Property::DiskRead, Value::Float(sample.read));
            state.set(Property::DiskWrite, Value::Float(sample.write));
            state.disk_history.push(sample);
            state.set(
                Property::DiskHistory,
                Value::Fingerprint(state.disk_history.fingerprint()),
            );
        });
        Ok(())
    }

    fn destroy(&mut self) {
        self.read.reset();
        self.write.reset();
    }
}
