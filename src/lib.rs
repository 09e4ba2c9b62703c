//! vitals - telemetry sampling and derived-metrics engine.
//!
//! Polls cumulative counters from `/proc` and `/sys` on three periodic loops,
//! turns them into rates, keeps short rolling histories and top-N process
//! lists, and notifies subscribers when a published value changes.
//!
//! A host embeds [`Vitals`]:
//!
//! ```no_run
//! # async fn run() -> Result<(), vitals::VitalsError> {
//! use vitals::{Property, Settings, Vitals};
//!
//! let vitals = Vitals::with_real_fs(Settings::from_env()).await?;
//! vitals.connect(Property::CpuUsage, || println!("cpu usage changed"));
//! vitals.start()?;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod history;
pub mod logging;
pub mod monitor;
pub mod process_table;
pub mod rates;
pub mod scheduler;
pub mod settings;
pub mod vitals;

pub use history::{DEFAULT_CAPACITY, History};
pub use process_table::{DEFAULT_TOP_N, RankBy, TopProcess};
pub use scheduler::LoopKind;
pub use settings::{ConfigError, RefreshRate, Settings};
pub use vitals::{
    DiskSample, FilesystemUsage, MemSample, NetSample, Property, SubscriptionId, Value, Vitals,
    VitalsError,
};
