//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/sys` states
//! for testing various system conditions.

use super::filesystem::MockFs;
use crate::collector::traits::FsStats;

/// Builds a `/proc/[pid]/stat` line with the given scheduler ticks.
pub fn stat_line(pid: u32, comm: &str, utime: u64, stime: u64) -> String {
    format!(
        "{pid} ({comm}) S 1 {pid} {pid} 0 -1 4194304 100 0 0 0 {utime} {stime} 0 0 20 0 1 0 100 5000000 500 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0"
    )
}

/// Builds a `/proc/[pid]/io` body with the given cumulative byte counts.
pub fn io_body(read_bytes: u64, write_bytes: u64) -> String {
    format!(
        "rchar: {r}\nwchar: {w}\nsyscr: 10\nsyscw: 10\nread_bytes: {read_bytes}\nwrite_bytes: {write_bytes}\ncancelled_write_bytes: 0\n",
        r = read_bytes * 2,
        w = write_bytes * 2,
    )
}

/// Builds a `/proc/[pid]/smaps_rollup` body with the given PSS in kB.
pub fn smaps_body(pss_kb: u64) -> String {
    format!(
        "00400000-7ffd5e9f1000 ---p 00000000 00:00 0 [rollup]\nRss: {rss} kB\nPss: {pss_kb} kB\n",
        rss = pss_kb * 2
    )
}

/// Builds `/proc/net/dev` content from `(interface, rx_bytes, tx_bytes)` rows.
pub fn net_dev_body(rows: &[(&str, u64, u64)]) -> String {
    let mut out = String::from(
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n",
    );
    for (name, rx, tx) in rows {
        out.push_str(&format!(
            "{name:>6}: {rx} 100 0 0 0 0 0 0 {tx} 100 0 0 0 0 0 0\n"
        ));
    }
    out
}

/// Builds `/proc/diskstats` content from `(device, read_sectors, write_sectors)` rows.
pub fn diskstats_body(rows: &[(&str, u64, u64)]) -> String {
    rows.iter()
        .map(|(name, read, write)| {
            format!("   8       0 {name} 100 0 {read} 10 100 0 {write} 10 0 20 20 0 0 0 0\n")
        })
        .collect()
}

impl MockFs {
    /// Creates a typical laptop with a few processes, a battery and a CPU
    /// temperature sensor.
    ///
    /// Includes: init (PID 1), a bash shell (PID 1000) and a kernel worker
    /// (PID 1001) whose cmdline is empty and whose io/smaps are unreadable.
    pub fn typical_system() -> Self {
        let fs = Self::desktop_system();

        // Battery without POWER_NOW: power is derived from voltage and current.
        fs.add_file("/sys/class/power_supply/BAT0/type", "Battery\n");
        fs.add_file(
            "/sys/class/power_supply/BAT0/uevent",
            "\
POWER_SUPPLY_NAME=BAT0
POWER_SUPPLY_STATUS=Discharging
POWER_SUPPLY_PRESENT=1
POWER_SUPPLY_VOLTAGE_MIN_DESIGN=11400000
POWER_SUPPLY_VOLTAGE_NOW=12000000
POWER_SUPPLY_CURRENT_NOW=1000000
POWER_SUPPLY_CHARGE_FULL=4000000
POWER_SUPPLY_CHARGE_NOW=2000000
POWER_SUPPLY_CAPACITY=50
",
        );

        fs.add_file("/sys/class/hwmon/hwmon1/name", "coretemp\n");
        fs.add_file("/sys/class/hwmon/hwmon1/temp1_input", "45000\n");

        fs
    }

    /// Creates a desktop without battery or CPU temperature sensor.
    pub fn desktop_system() -> Self {
        let fs = Self::new();

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12288000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        3072000 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 1800.000

processor\t: 1
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 2000.000

processor\t: 2
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 2200.000

processor\t: 3
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
cpu MHz\t\t: 2400.000
",
        );

        fs.add_file(
            "/proc/diskstats",
            "\
   7       0 loop0 500 0 1000 10 0 0 0 0 0 10 10 0 0 0 0
   8       0 sda 12345 100 987654 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 800000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500000 8000 5 15000 18000 0 0 0 0
 259       1 nvme0n1p1 40000 100 1800000 9000 20000 100 1400000 7000 0 14000 17000 0 0 0 0
 253       0 dm-0 1000 0 5000 100 1000 0 5000 100 0 100 100 0 0 0 0
",
        );

        fs.add_file(
            "/proc/net/dev",
            net_dev_body(&[
                ("lo", 12345678, 12345678),
                ("eth0", 987654321, 123456789),
                ("docker0", 5000, 6000),
                ("wlan0", 1000000, 2000000),
            ]),
        );

        fs.add_file(
            "/proc/mounts",
            "\
/dev/nvme0n1p2 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
/dev/nvme0n1p1 /boot/efi vfat rw,relatime 0 0
/dev/sda1 /home ext4 rw,relatime 0 0
/dev/sda1 /srv ext4 rw,relatime 0 0
",
        );
        fs.add_mount_stats(
            "/",
            FsStats {
                fragment_size: 4096,
                blocks: 1_000_000,
                blocks_free: 400_000,
                blocks_available: 350_000,
            },
        );
        fs.add_mount_stats(
            "/boot/efi",
            FsStats {
                fragment_size: 4096,
                blocks: 130_000,
                blocks_free: 120_000,
                blocks_available: 120_000,
            },
        );
        fs.add_mount_stats(
            "/home",
            FsStats {
                fragment_size: 4096,
                blocks: 5_000_000,
                blocks_free: 1_000_000,
                blocks_available: 750_000,
            },
        );

        fs.add_file("/sys/class/power_supply/AC/type", "Mains\n");
        fs.add_file("/sys/class/hwmon/hwmon0/name", "nvme\n");
        fs.add_file("/sys/class/hwmon/hwmon0/temp1_input", "38000\n");

        // PID 1 - init/systemd
        fs.add_process(
            1,
            &stat_line(1, "systemd", 1000, 500),
            "/sbin/init\0splash\0",
            &smaps_body(12000),
            &io_body(10_000_000, 5_000_000),
        );

        // PID 1000 - bash shell
        fs.add_process(
            1000,
            &stat_line(1000, "bash", 100, 50),
            "/bin/bash\0--login\0",
            &smaps_body(4000),
            &io_body(4096, 2048),
        );

        // PID 1001 - kernel worker
        fs.add_process(1001, &stat_line(1001, "kworker/0:1", 0, 30), "", "", "");

        fs
    }
}
