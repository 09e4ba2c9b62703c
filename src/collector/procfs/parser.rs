//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.
//! Lines that do not match the expected format are skipped, not reported.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/[pid]/stat`.
#[derive(Debug, Clone, Default)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    /// User-mode scheduler ticks.
    pub utime: u64,
    /// Kernel-mode scheduler ticks.
    pub stime: u64,
}

impl ProcStat {
    /// Total CPU ticks consumed by the process.
    pub fn ticks(&self) -> u64 {
        self.utime + self.stime
    }
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    // Find the comm field boundaries (enclosed in parentheses)
    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    // Field offsets are counted from the first field after ')', i.e. `state` is 0.
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 13 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 13+, got {}",
            fields.len()
        )));
    }

    let parse_field = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStat {
        pid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        utime: parse_field(11, "utime")?,
        stime: parse_field(12, "stime")?,
    })
}

/// Parsed data from `/proc/[pid]/io`.
#[derive(Debug, Clone, Default)]
pub struct ProcIo {
    pub rchar: u64,
    pub wchar: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Parses `/proc/[pid]/io` content.
///
/// Format is key: value pairs, one per line.
pub fn parse_proc_io(content: &str) -> Result<ProcIo, ParseError> {
    let mut io = ProcIo::default();
    let mut matched = false;

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let Ok(value) = value.trim().parse::<u64>() else {
                continue;
            };
            match key.trim() {
                "rchar" => io.rchar = value,
                "wchar" => io.wchar = value,
                "read_bytes" => io.read_bytes = value,
                "write_bytes" => io.write_bytes = value,
                _ => continue,
            }
            matched = true;
        }
    }

    if !matched {
        return Err(ParseError::new("no io counters found"));
    }
    Ok(io)
}

/// Parses `/proc/[pid]/smaps_rollup` content and returns the proportional
/// set size in bytes.
///
/// Format: `Pss:                1234 kB`
pub fn parse_smaps_rollup_pss(content: &str) -> Result<u64, ParseError> {
    content
        .lines()
        .find_map(|line| {
            let rest = line.strip_prefix("Pss:")?;
            rest.split_whitespace().next()?.parse::<u64>().ok()
        })
        .map(|kb| kb * 1024)
        .ok_or_else(|| ParseError::new("missing Pss in smaps_rollup"))
}

/// Parsed data from `/proc/meminfo`. All values in kilobytes.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut has_total = false;

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
            has_total = true;
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line);
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line);
        } else if line.starts_with("SwapTotal:") {
            info.swap_total = parse_kb(line);
        } else if line.starts_with("SwapFree:") {
            info.swap_free = parse_kb(line);
        }
    }

    if !has_total {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }
    Ok(info)
}

/// Single CPU line from `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuStat {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Ticks spent doing work: user + nice + system.
    pub fn used(&self) -> u64 {
        self.user + self.nice + self.system
    }

    /// Ticks spent idle.
    pub fn idle_time(&self) -> u64 {
        self.idle
    }

    /// Ticks counted towards usage percentages: used + idle.
    pub fn total(&self) -> u64 {
        self.used() + self.idle_time()
    }
}

/// Parses the `cpu` lines of `/proc/stat`.
///
/// The first element is the aggregate line, the rest are per-core lines in
/// the order the kernel lists them.
pub fn parse_cpu_stat(content: &str) -> Result<Vec<CpuStat>, ParseError> {
    let mut cpus = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(name) = parts.first() else {
            continue;
        };
        let Some(suffix) = name.strip_prefix("cpu") else {
            continue;
        };
        if parts.len() < 5 {
            continue;
        }

        let cpu_id = if suffix.is_empty() {
            None
        } else {
            match suffix.parse() {
                Ok(id) => Some(id),
                Err(_) => continue,
            }
        };

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        cpus.push(CpuStat {
            cpu_id,
            user: get_val(1),
            nice: get_val(2),
            system: get_val(3),
            idle: get_val(4),
            iowait: get_val(5),
            irq: get_val(6),
            softirq: get_val(7),
            steal: get_val(8),
        });
    }

    match cpus.first() {
        Some(first) if first.cpu_id.is_none() => Ok(cpus),
        _ => Err(ParseError::new("missing aggregate cpu line in stat")),
    }
}

/// Parses `/proc/uptime` content and returns seconds since boot.
///
/// Format: `12345.67 98765.43`
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    content
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::new("invalid uptime"))
}

/// Parsed data from `/proc/cpuinfo`.
#[derive(Debug, Clone, Default)]
pub struct CpuInfo {
    pub model_name: Option<String>,
    /// `cpu MHz` of every logical core that reports one.
    pub mhz: Vec<f64>,
    /// Number of `processor` entries.
    pub processors: usize,
}

impl CpuInfo {
    /// Mean frequency across cores in MHz, if any core reports it.
    pub fn average_mhz(&self) -> Option<f64> {
        if self.mhz.is_empty() {
            return None;
        }
        Some(self.mhz.iter().sum::<f64>() / self.mhz.len() as f64)
    }
}

/// Parses `/proc/cpuinfo` content.
///
/// Format is `key\t: value` lines, one block per logical processor.
pub fn parse_cpuinfo(content: &str) -> CpuInfo {
    let mut info = CpuInfo::default();

    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "processor" => info.processors += 1,
            "model name" if info.model_name.is_none() => {
                info.model_name = Some(value.to_string());
            }
            "cpu MHz" => {
                if let Ok(mhz) = value.parse() {
                    info.mhz.push(mhz);
                }
            }
            _ => {}
        }
    }

    info
}

// ============ Disk Stats Parser ============

/// Parsed data from `/proc/diskstats`.
#[derive(Debug, Clone, Default)]
pub struct DiskStats {
    /// Block device major number.
    pub major: u32,
    /// Block device minor number.
    pub minor: u32,
    /// Device name (sda, nvme0n1, etc.)
    pub device: String,
    /// Number of sectors read
    pub read_sectors: u64,
    /// Number of sectors written
    pub write_sectors: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStats>, ParseError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue; // Skip malformed lines
        }

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        disks.push(DiskStats {
            major: parts[0].parse().unwrap_or(0),
            minor: parts[1].parse().unwrap_or(0),
            device: parts[2].to_string(),
            read_sectors: get_val(5),
            write_sectors: get_val(9),
        });
    }

    Ok(disks)
}

// ============ Network Device Stats Parser ============

/// Parsed data from `/proc/net/dev`.
#[derive(Debug, Clone, Default)]
pub struct NetDevStats {
    /// Interface name (eth0, lo, etc.)
    pub interface: String,
    /// Bytes received
    pub rx_bytes: u64,
    /// Packets received
    pub rx_packets: u64,
    /// Bytes transmitted
    pub tx_bytes: u64,
    /// Packets transmitted
    pub tx_packets: u64,
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevStats>, ParseError> {
    let mut devices = Vec::new();

    for line in content.lines() {
        // Skip header lines
        if line.contains('|') || line.trim().is_empty() {
            continue;
        }

        let Some((interface, counters)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 16 {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { values.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        devices.push(NetDevStats {
            interface: interface.trim().to_string(),
            rx_bytes: get_val(0),
            rx_packets: get_val(1),
            tx_bytes: get_val(8),
            tx_packets: get_val(9),
        });
    }

    Ok(devices)
}

// ============ Mounts Parser ============

/// One line of `/proc/mounts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// Parses `/proc/mounts` content.
///
/// Format: `source mount_point fs_type options dump pass`. Spaces and other
/// special characters inside paths are escaped as three-digit octal (`\040`).
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let source = parts.next()?;
            let mount_point = parts.next()?;
            let fs_type = parts.next()?;
            Some(MountEntry {
                source: unescape_octal(source),
                mount_point: unescape_octal(mount_point),
                fs_type: fs_type.to_string(),
            })
        })
        .collect()
}

/// Decodes three octal digits, or `None` if they are not a byte value.
fn octal_byte(digits: &[u8]) -> Option<u8> {
    if !digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
        return None;
    }
    let code = digits
        .iter()
        .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
    u8::try_from(code).ok()
}

fn unescape_octal(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'\\' && i + 3 < bytes.len())
            .then(|| octal_byte(&bytes[i + 1..i + 4]))
            .flatten();
        if let Some(byte) = escaped {
            out.push(byte);
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat_basic() {
        let content = "1234 (bash) S 1233 1234 1234 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.utime, 100);
        assert_eq!(stat.stime, 50);
        assert_eq!(stat.ticks(), 150);
    }

    #[test]
    fn test_parse_proc_stat_with_spaces_in_comm() {
        let content = "5000 (Web Content) S 4999 5000 4999 0 -1 4194304 100000 0 500 0 5000 1000 0 0 20 0 20 0 500000 2000000000 50000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 5000);
        assert_eq!(stat.comm, "Web Content");
        assert_eq!(stat.utime, 5000);
        assert_eq!(stat.stime, 1000);
    }

    #[test]
    fn test_parse_proc_stat_with_parentheses_in_comm() {
        let content = "5001 (test) (1)) S 1 5001 5001 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.pid, 5001);
        assert_eq!(stat.comm, "test) (1)");
        assert_eq!(stat.utime, 10);
        assert_eq!(stat.stime, 5);
    }

    #[test]
    fn test_parse_proc_stat_truncated() {
        // A process that exited mid-read can leave a short line behind.
        let result = parse_proc_stat("4000 (defunct) Z 1000 4000");
        assert!(result.is_err());
        assert!(parse_proc_stat("").is_err());
    }

    #[test]
    fn test_parse_proc_io() {
        let content = "\
rchar: 1000000
wchar: 500000
syscr: 5000
syscw: 2500
read_bytes: 100000
write_bytes: 50000
cancelled_write_bytes: 1000
";
        let io = parse_proc_io(content).unwrap();

        assert_eq!(io.rchar, 1000000);
        assert_eq!(io.wchar, 500000);
        assert_eq!(io.read_bytes, 100000);
        assert_eq!(io.write_bytes, 50000);
    }

    #[test]
    fn test_parse_proc_io_empty_is_error() {
        assert!(parse_proc_io("").is_err());
    }

    #[test]
    fn test_parse_smaps_rollup_pss() {
        let content = "\
55d4c0a00000-7ffd5e9f1000 ---p 00000000 00:00 0                          [rollup]
Rss:                8000 kB
Pss:                5120 kB
Pss_Anon:           3000 kB
Shared_Clean:       2000 kB
";
        assert_eq!(parse_smaps_rollup_pss(content).unwrap(), 5120 * 1024);
        assert!(parse_smaps_rollup_pss("Rss: 10 kB\n").is_err());
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
";
        let info = parse_meminfo(content).unwrap();

        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_free, 8192000);
        assert_eq!(info.mem_available, 12000000);
        assert_eq!(info.cached, 2048000);
        assert_eq!(info.swap_total, 4096000);
        assert_eq!(info.swap_free, 4096000);
    }

    #[test]
    fn test_parse_meminfo_without_total() {
        assert!(parse_meminfo("MemFree: 10 kB\n").is_err());
    }

    #[test]
    fn test_parse_cpu_stat() {
        let content = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0
ctxt 500000
btime 1700000000
";
        let cpus = parse_cpu_stat(content).unwrap();

        assert_eq!(cpus.len(), 3); // cpu + cpu0 + cpu1
        assert_eq!(cpus[0].cpu_id, None);
        assert_eq!(cpus[0].used(), 13500);
        assert_eq!(cpus[0].idle_time(), 80000);
        assert_eq!(cpus[0].total(), 93500);
        assert_eq!(cpus[1].cpu_id, Some(0));
        assert_eq!(cpus[2].cpu_id, Some(1));
    }

    #[test]
    fn test_parse_cpu_stat_requires_aggregate() {
        assert!(parse_cpu_stat("cpu0 1 2 3 4\n").is_err());
        assert!(parse_cpu_stat("ctxt 5\n").is_err());
    }

    #[test]
    fn test_parse_uptime() {
        assert!((parse_uptime("12345.67 98765.43\n").unwrap() - 12345.67).abs() < 1e-9);
        assert!(parse_uptime("").is_err());
    }

    #[test]
    fn test_parse_cpuinfo() {
        let content = "\
processor\t: 0
model name\t: AMD Ryzen 7 5800X 8-Core Processor
cpu MHz\t\t: 3800.000

processor\t: 1
model name\t: AMD Ryzen 7 5800X 8-Core Processor
cpu MHz\t\t: 2200.000
";
        let info = parse_cpuinfo(content);

        assert_eq!(info.processors, 2);
        assert_eq!(
            info.model_name.as_deref(),
            Some("AMD Ryzen 7 5800X 8-Core Processor")
        );
        assert_eq!(info.average_mhz(), Some(3000.0));
        assert_eq!(parse_cpuinfo("").average_mhz(), None);
    }

    #[test]
    fn test_parse_diskstats() {
        let content = "\
   8       0 sda 1234 0 56789 100 5678 0 98765 200 0 150 300 0 0 0 0
   8       1 sda1 1000 0 50000 80 5000 0 90000 180 0 130 260 0 0 0 0
 259       0 nvme0n1 9999 0 123456 500 8888 0 654321 400 5 1000 2000 0 0 0 0
   7       0 loop0 12
";
        let disks = parse_diskstats(content).unwrap();

        assert_eq!(disks.len(), 3);
        assert_eq!(disks[0].device, "sda");
        assert_eq!(disks[0].read_sectors, 56789);
        assert_eq!(disks[0].write_sectors, 98765);
        assert_eq!(disks[2].major, 259);
        assert_eq!(disks[2].device, "nvme0n1");
        assert_eq!(disks[2].read_sectors, 123456);
    }

    #[test]
    fn test_parse_net_dev() {
        let content = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
  eth0: 9876543     5678    1    2    0     0          0        10 87654321     4321    3    4    0     0       0          0
";
        let devices = parse_net_dev(content).unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].interface, "lo");
        assert_eq!(devices[1].interface, "eth0");
        assert_eq!(devices[1].rx_bytes, 9876543);
        assert_eq!(devices[1].rx_packets, 5678);
        assert_eq!(devices[1].tx_bytes, 87654321);
        assert_eq!(devices[1].tx_packets, 4321);
    }

    #[test]
    fn test_parse_mounts() {
        let content = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sdb1 /media/My\\040Disk vfat rw 0 0
";
        let mounts = parse_mounts(content);

        assert_eq!(mounts.len(), 3);
        assert_eq!(mounts[0].mount_point, "/");
        assert_eq!(mounts[0].fs_type, "ext4");
        assert_eq!(mounts[1].fs_type, "proc");
        assert_eq!(mounts[2].mount_point, "/media/My Disk");
    }

    #[test]
    fn test_unescape_octal_out_of_range_kept_literal() {
        assert_eq!(unescape_octal("/mnt/a\\011b"), "/mnt/a\tb");
        assert_eq!(unescape_octal("/mnt/x\\777y"), "/mnt/x\\777y");
        assert_eq!(unescape_octal("/mnt/x\\400"), "/mnt/x\\400");
        assert_eq!(unescape_octal("/mnt/tail\\04"), "/mnt/tail\\04");
    }
}
