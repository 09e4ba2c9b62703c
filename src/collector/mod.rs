//! Counter readers for Linux `/proc` and `/sys`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        monitors (cpu, memory, net, ...)      │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!        ┌───────────────┼────────────────┐
//!        ▼               ▼                ▼
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ SystemReader │ │ProcessReader │ │ sysfs readers│
//! │  /proc/stat  │ │ /proc/[pid]/ │ │ power_supply │
//! │  meminfo ... │ │ stat io ...  │ │ hwmon        │
//! └──────┬───────┘ └──────┬───────┘ └──────┬───────┘
//!        └────────────────┼────────────────┘
//!                         ▼
//!               ┌───────────────────┐
//!               │ FileSystem trait  │
//!               │  RealFs | MockFs  │
//!               └───────────────────┘
//! ```
//!
//! Readers are stateless: every call re-reads its source and either returns
//! a parsed record or a [`ReadFailure`]. Rates and history live above this
//! layer.

pub mod error;
pub mod mock;
pub mod procfs;
pub mod sysfs;
pub mod traits;

use std::path::Path;

pub use error::ReadFailure;
pub use mock::MockFs;
pub use procfs::{ParseError, ProcessReader, ProcessSample, SampleRequest, SystemReader};
pub use sysfs::{BatteryReader, BatteryReading, TemperatureReader};
pub use traits::{FileSystem, FsStats, RealFs, SharedFs};

/// Reads one data source to a string, classifying any I/O error.
pub(crate) async fn read_source(fs: &dyn FileSystem, path: &Path) -> Result<String, ReadFailure> {
    fs.read_to_string(path)
        .await
        .map_err(|e| ReadFailure::from_io(path, e))
}
