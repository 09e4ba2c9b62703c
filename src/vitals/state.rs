//! Published values, histories and process lists.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::history::History;
use crate::process_table::ProcessTable;
use crate::vitals::VitalsError;

/// A named value consumers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    CpuUsage,
    CpuCores,
    CpuHistory,
    CpuModel,
    CpuCount,
    CpuFrequency,
    CpuTemperature,
    CpuTopProcs,
    Uptime,
    MemUsage,
    MemSize,
    SwapUsage,
    SwapSize,
    MemHistory,
    MemTopProcs,
    NetRecv,
    NetSent,
    NetHistory,
    DiskRead,
    DiskWrite,
    DiskHistory,
    DiskTopProcs,
    FsUsage,
    FsSize,
    FsFree,
    FsList,
    BatteryPower,
    BatteryCapacity,
    BatteryStatus,
    BatteryEnergyFull,
}

impl Property {
    pub const ALL: &'static [Property] = &[
        Property::CpuUsage,
        Property::CpuCores,
        Property::CpuHistory,
        Property::CpuModel,
        Property::CpuCount,
        Property::CpuFrequency,
        Property::CpuTemperature,
        Property::CpuTopProcs,
        Property::Uptime,
        Property::MemUsage,
        Property::MemSize,
        Property::SwapUsage,
        Property::SwapSize,
        Property::MemHistory,
        Property::MemTopProcs,
        Property::NetRecv,
        Property::NetSent,
        Property::NetHistory,
        Property::DiskRead,
        Property::DiskWrite,
        Property::DiskHistory,
        Property::DiskTopProcs,
        Property::FsUsage,
        Property::FsSize,
        Property::FsFree,
        Property::FsList,
        Property::BatteryPower,
        Property::BatteryCapacity,
        Property::BatteryStatus,
        Property::BatteryEnergyFull,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Property::CpuUsage => "cpu-usage",
            Property::CpuCores => "cpu-cores",
            Property::CpuHistory => "cpu-history",
            Property::CpuModel => "cpu-model",
            Property::CpuCount => "cpu-count",
            Property::CpuFrequency => "cpu-frequency",
            Property::CpuTemperature => "cpu-temperature",
            Property::CpuTopProcs => "cpu-top-procs",
            Property::Uptime => "uptime",
            Property::MemUsage => "mem-usage",
            Property::MemSize => "mem-size",
            Property::SwapUsage => "swap-usage",
            Property::SwapSize => "swap-size",
            Property::MemHistory => "mem-history",
            Property::MemTopProcs => "mem-top-procs",
            Property::NetRecv => "net-recv",
            Property::NetSent => "net-sent",
            Property::NetHistory => "net-history",
            Property::DiskRead => "disk-read",
            Property::DiskWrite => "disk-write",
            Property::DiskHistory => "disk-history",
            Property::DiskTopProcs => "disk-top-procs",
            Property::FsUsage => "fs-usage",
            Property::FsSize => "fs-size",
            Property::FsFree => "fs-free",
            Property::FsList => "fs-list",
            Property::BatteryPower => "battery-power",
            Property::BatteryCapacity => "battery-capacity",
            Property::BatteryStatus => "battery-status",
            Property::BatteryEnergyFull => "battery-energy-full",
        }
    }

    /// Value held before the first refresh.
    fn initial(self) -> Value {
        match self {
            Property::CpuModel | Property::BatteryStatus => Value::Text(String::new()),
            Property::CpuCount
            | Property::Uptime
            | Property::MemSize
            | Property::SwapSize
            | Property::FsSize
            | Property::FsFree => Value::Count(0),
            Property::CpuCores
            | Property::CpuHistory
            | Property::CpuTopProcs
            | Property::MemHistory
            | Property::MemTopProcs
            | Property::NetHistory
            | Property::DiskHistory
            | Property::DiskTopProcs
            | Property::FsList => Value::Fingerprint(0),
            _ => Value::Float(0.0),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Property::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| VitalsError::UnknownProperty(s.to_string()))
    }
}

/// Current value of a [`Property`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Count(u64),
    Text(String),
    /// Content hash of a history or list; only equality is meaningful.
    Fingerprint(u64),
    /// The hardware behind this property is absent.
    NotApplicable,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Count(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Count(v) | Value::Fingerprint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        !matches!(self, Value::NotApplicable)
    }
}

/// RAM and swap usage fractions at one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemSample {
    pub ram: f64,
    pub swap: f64,
}

/// Network receive/transmit rates in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NetSample {
    pub recv: f64,
    pub sent: f64,
}

/// Disk read/write rates in bytes per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DiskSample {
    pub read: f64,
    pub write: f64,
}

/// Size and free space of one mounted filesystem, in bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilesystemUsage {
    pub mount_point: String,
    pub source: String,
    pub fs_type: String,
    pub total: u64,
    pub free: u64,
}

impl FilesystemUsage {
    /// Used fraction in `[0, 1]`; 0 for an empty filesystem.
    pub fn usage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.total.saturating_sub(self.free) as f64 / self.total as f64
    }
}

/// Everything the engine publishes.
///
/// Only monitors write here, always inside one synchronous critical section
/// per refresh. Writes go through [`VitalsState::set`], which records the
/// property for notification only if its value changed.
#[derive(Debug)]
pub struct VitalsState {
    values: HashMap<Property, Value>,
    pending: Vec<Property>,
    pub cpu_history: History<f64>,
    pub cpu_cores: Vec<f64>,
    pub mem_history: History<MemSample>,
    pub net_history: History<NetSample>,
    pub disk_history: History<DiskSample>,
    pub processes: ProcessTable,
    pub filesystems: Vec<FilesystemUsage>,
}

impl Default for VitalsState {
    fn default() -> Self {
        Self::new()
    }
}

impl VitalsState {
    pub fn new() -> Self {
        Self {
            values: Property::ALL.iter().map(|&p| (p, p.initial())).collect(),
            pending: Vec::new(),
            cpu_history: History::default(),
            cpu_cores: Vec::new(),
            mem_history: History::default(),
            net_history: History::default(),
            disk_history: History::default(),
            processes: ProcessTable::new(),
            filesystems: Vec::new(),
        }
    }

    pub fn get(&self, property: Property) -> Value {
        self.values
            .get(&property)
            .cloned()
            .unwrap_or_else(|| property.initial())
    }

    /// Stores `value`; returns true and queues a notification if it differs
    /// from the stored one.
    pub fn set(&mut self, property: Property, value: Value) -> bool {
        if self.values.get(&property) == Some(&value) {
            return false;
        }
        self.values.insert(property, value);
        if !self.pending.contains(&property) {
            self.pending.push(property);
        }
        true
    }

    /// Properties changed since the last call, in order of first change.
    pub fn take_pending(&mut self) -> Vec<Property> {
        std::mem::take(&mut self.pending)
    }
}
