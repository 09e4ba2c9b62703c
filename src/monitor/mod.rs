//! Resource monitors driven by the sampling loops.
//!
//! Each monitor owns its readers and rate trackers, reads its sources with
//! `await`, then publishes everything it derived in one synchronous
//! [`RefreshContext::publish`] call. No lock on the published state is held
//! across an await point.

mod battery;
mod cpu;
mod disk;
mod filesystem;
mod memory;
mod network;
mod processes;
mod sensors;

pub use battery::BatteryMonitor;
pub(crate) use battery::BATTERY_PROPERTIES;
pub use cpu::CpuMonitor;
pub use disk::{DiskMonitor, is_whole_disk};
pub use filesystem::{FilesystemMonitor, is_real_mount};
pub use memory::MemoryMonitor;
pub use network::{NetworkMonitor, is_physical_interface};
pub use processes::ProcessMonitor;
pub use sensors::SensorsMonitor;

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::collector::ReadFailure;
use crate::settings::Settings;
use crate::vitals::state::VitalsState;

/// Inputs shared by every monitor in one cycle.
pub struct RefreshContext<'a> {
    /// Settings snapshot taken at the start of the cycle.
    pub settings: &'a Settings,
    /// Timestamp applied to every counter sample of the cycle.
    pub now: DateTime<Utc>,
    pub state: &'a Mutex<VitalsState>,
}

impl RefreshContext<'_> {
    /// Runs `f` with exclusive access to the published state.
    pub fn publish<R>(&self, f: impl FnOnce(&mut VitalsState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

/// One resource family sampled by a loop.
#[async_trait]
pub trait Monitor: Send {
    fn name(&self) -> &'static str;

    /// Disabled monitors are skipped and reset every cycle.
    fn enabled(&self, settings: &Settings) -> bool;

    /// Reads sources and publishes derived values. An error means nothing
    /// (or only part) was published this cycle; previous values stay.
    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure>;

    /// Forgets rate tracker state so the next refresh starts fresh.
    fn destroy(&mut self);

    /// Called while the monitor is disabled, with the published state.
    /// Values left in place stay readable at their last refreshed value.
    fn withdraw(&self, _state: &mut VitalsState) {}
}

/// Rounds a `[0, 1]` fraction to 0.1% steps.
pub(crate) fn round_fraction(value: f64) -> f64 {
    crate::rates::round_to(value, 3)
}
