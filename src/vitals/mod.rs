//! The facade hosts embed: lifecycle, settings, values and subscriptions.
//!
//! ```text
//!  Scheduler ──► Engine::run_cycle ──► monitors ──► VitalsState
//!                                                      │
//!                    host ◄── callbacks ◄── Notifier ◄─┘
//! ```

mod engine;
mod error;
pub mod notify;
pub mod state;

pub use error::VitalsError;
pub use notify::SubscriptionId;
pub use state::{DiskSample, FilesystemUsage, MemSample, NetSample, Property, Value};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::collector::{
    BatteryReader, ProcessReader, RealFs, SharedFs, SystemReader, TemperatureReader,
};
use crate::monitor::{
    BATTERY_PROPERTIES, BatteryMonitor, CpuMonitor, DiskMonitor, FilesystemMonitor,
    MemoryMonitor, Monitor, NetworkMonitor, ProcessMonitor, SensorsMonitor,
};
use crate::process_table::{RankBy, TopProcess};
use crate::scheduler::{LoopKind, Scheduler};
use crate::settings::{DETAILS_INTERVAL, FILESYSTEM_INTERVAL, Settings};
use engine::Engine;
use state::VitalsState;

fn interval(kind: LoopKind, settings: &Settings) -> Duration {
    match kind {
        LoopKind::Summary => settings.summary_interval(),
        LoopKind::Details => DETAILS_INTERVAL,
        LoopKind::Filesystem => FILESYSTEM_INTERVAL,
    }
}

/// Sampling engine facade.
///
/// Values are read through typed getters or [`Vitals::value`]; subscribers
/// registered with [`Vitals::connect`] are called, without arguments, once
/// per cycle in which their property changed.
pub struct Vitals {
    engine: Arc<Engine>,
    scheduler: Mutex<Scheduler>,
}

impl Vitals {
    /// Detects hardware and builds the monitors.
    ///
    /// Fails with [`VitalsError::SourceMissing`] when `<proc>/stat` does not
    /// exist. A missing battery or temperature sensor is not an error: their
    /// properties read [`Value::NotApplicable`] for the engine's lifetime.
    pub async fn new(fs: SharedFs, settings: Settings) -> Result<Self, VitalsError> {
        let system = SystemReader::new(fs.clone(), settings.proc_path.clone());
        if !system.is_available().await {
            return Err(VitalsError::SourceMissing(system.stat_path()));
        }

        let battery = BatteryReader::discover(fs.clone(), settings.sys_path.clone()).await;
        let temperature =
            TemperatureReader::discover(fs.clone(), settings.sys_path.clone()).await;

        let mut state = VitalsState::new();
        let cpuinfo = system.read_cpuinfo().await.unwrap_or_default();
        let cpu_count = match cpuinfo.processors {
            0 => system
                .read_cpu()
                .await
                .map_or(0, |lines| lines.len().saturating_sub(1)),
            n => n,
        };
        if let Some(model) = &cpuinfo.model_name {
            state.set(Property::CpuModel, Value::Text(model.clone()));
        }
        state.set(Property::CpuCount, Value::Count(cpu_count as u64));
        if battery.is_none() {
            for property in BATTERY_PROPERTIES {
                state.set(property, Value::NotApplicable);
            }
        }
        if temperature.is_none() {
            state.set(Property::CpuTemperature, Value::NotApplicable);
        }
        state.take_pending();

        info!(
            cpu_count,
            battery = battery.is_some(),
            temperature_sensor = temperature.is_some(),
            "vitals initialized"
        );

        let mut summary: Vec<Box<dyn Monitor>> = vec![
            Box::new(CpuMonitor::new(system.clone())),
            Box::new(MemoryMonitor::new(system.clone())),
            Box::new(NetworkMonitor::new(system.clone())),
            Box::new(DiskMonitor::new(system.clone())),
        ];
        if let Some(reader) = battery {
            summary.push(Box::new(BatteryMonitor::new(reader)));
        }
        let details: Vec<Box<dyn Monitor>> = vec![
            Box::new(ProcessMonitor::new(
                ProcessReader::new(fs, settings.proc_path.clone()),
                system.clone(),
            )),
            Box::new(SensorsMonitor::new(system.clone(), temperature)),
        ];
        let filesystem: Vec<Box<dyn Monitor>> = vec![Box::new(FilesystemMonitor::new(system))];

        Ok(Self {
            engine: Arc::new(Engine::new(settings, state, summary, details, filesystem)),
            scheduler: Mutex::new(Scheduler::new()),
        })
    }

    /// [`Vitals::new`] on the real `/proc` and `/sys`.
    pub async fn with_real_fs(settings: Settings) -> Result<Self, VitalsError> {
        Self::new(RealFs::shared(), settings).await
    }

    fn scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_loop(&self, scheduler: &mut Scheduler, kind: LoopKind, every: Duration) -> bool {
        let engine = Arc::clone(&self.engine);
        scheduler.start(kind, every, move || {
            let engine = Arc::clone(&engine);
            async move { engine.run_cycle(kind, Utc::now()).await }
        })
    }

    // ============================================================
    // Lifecycle
    // ============================================================

    /// Starts the three sampling loops on the current tokio runtime. Loops
    /// that are already running are left alone.
    pub fn start(&self) -> Result<(), VitalsError> {
        tokio::runtime::Handle::try_current().map_err(|_| VitalsError::NoRuntime)?;

        let settings = self.engine.settings();
        let mut scheduler = self.scheduler();
        for kind in LoopKind::ALL {
            self.start_loop(&mut scheduler, kind, interval(kind, &settings));
        }
        Ok(())
    }

    /// Stops every loop. The next start begins with fresh rate trackers.
    pub fn stop(&self) {
        self.scheduler().stop_all();
        self.engine.request_reset();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler().any_running()
    }

    /// Runs one cycle of `kind` now, outside the schedule.
    pub async fn refresh(&self, kind: LoopKind) {
        self.engine.run_cycle(kind, Utc::now()).await;
    }

    // ============================================================
    // Settings
    // ============================================================

    pub fn settings(&self) -> Settings {
        self.engine.settings()
    }

    /// Replaces the settings. Takes effect on the next cycle of each loop; a
    /// refresh-rate change restarts a running summary loop immediately.
    pub fn apply_settings(&self, settings: Settings) {
        let summary_interval = settings.summary_interval();
        let previous = self.engine.replace_settings(settings.clone());

        if previous.proc_path != settings.proc_path || previous.sys_path != settings.sys_path {
            warn!("data source paths only apply to a newly created engine");
        }

        if previous.refresh_rate != settings.refresh_rate {
            let mut scheduler = self.scheduler();
            if scheduler.stop(LoopKind::Summary) {
                self.start_loop(&mut scheduler, LoopKind::Summary, summary_interval);
                info!(
                    refresh_rate = settings.refresh_rate.as_str(),
                    "summary loop restarted"
                );
            }
        }
    }

    /// Sets one setting by its kebab-case key, e.g. `("show-net", "false")`.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), VitalsError> {
        let mut settings = self.settings();
        settings.set_named(key, value)?;
        self.apply_settings(settings);
        Ok(())
    }

    // ============================================================
    // Notifications
    // ============================================================

    pub fn connect(
        &self,
        property: Property,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.engine.notifier().connect(property, callback)
    }

    /// [`Vitals::connect`] by property name, e.g. `"cpu-usage"`.
    pub fn connect_named(
        &self,
        name: &str,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Result<SubscriptionId, VitalsError> {
        Ok(self.connect(name.parse()?, callback))
    }

    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        self.engine.notifier().disconnect(id)
    }

    // ============================================================
    // Values
    // ============================================================

    pub fn value(&self, property: Property) -> Value {
        self.engine.state().get(property)
    }

    fn float(&self, property: Property) -> f64 {
        self.value(property).as_f64().unwrap_or(0.0)
    }

    fn optional_float(&self, property: Property) -> Option<f64> {
        self.value(property).as_f64()
    }

    fn optional_count(&self, property: Property) -> Option<u64> {
        match self.value(property) {
            Value::Count(v) => Some(v),
            _ => None,
        }
    }

    /// Busy fraction of all cores in `[0, 1]`.
    pub fn cpu_usage(&self) -> f64 {
        self.float(Property::CpuUsage)
    }

    /// Busy fraction per core.
    pub fn cpu_cores(&self) -> Vec<f64> {
        self.engine.state().cpu_cores.clone()
    }

    pub fn cpu_model(&self) -> Option<String> {
        self.value(Property::CpuModel)
            .as_str()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn cpu_count(&self) -> u64 {
        self.optional_count(Property::CpuCount).unwrap_or(0)
    }

    /// Average core frequency in MHz.
    pub fn cpu_frequency(&self) -> Option<f64> {
        self.optional_float(Property::CpuFrequency)
    }

    /// Degrees Celsius; `None` without a CPU sensor.
    pub fn cpu_temperature(&self) -> Option<f64> {
        self.optional_float(Property::CpuTemperature)
    }

    /// Seconds since boot.
    pub fn uptime(&self) -> u64 {
        self.optional_count(Property::Uptime).unwrap_or(0)
    }

    pub fn mem_usage(&self) -> f64 {
        self.float(Property::MemUsage)
    }

    /// Total RAM in bytes.
    pub fn mem_size(&self) -> u64 {
        self.optional_count(Property::MemSize).unwrap_or(0)
    }

    pub fn swap_usage(&self) -> f64 {
        self.float(Property::SwapUsage)
    }

    pub fn swap_size(&self) -> u64 {
        self.optional_count(Property::SwapSize).unwrap_or(0)
    }

    /// Bytes received per second.
    pub fn net_recv(&self) -> f64 {
        self.float(Property::NetRecv)
    }

    /// Bytes sent per second.
    pub fn net_sent(&self) -> f64 {
        self.float(Property::NetSent)
    }

    pub fn disk_read(&self) -> f64 {
        self.float(Property::DiskRead)
    }

    pub fn disk_write(&self) -> f64 {
        self.float(Property::DiskWrite)
    }

    /// Used fraction of the configured mount; `None` if it is not mounted.
    pub fn fs_usage(&self) -> Option<f64> {
        self.optional_float(Property::FsUsage)
    }

    pub fn fs_size(&self) -> Option<u64> {
        self.optional_count(Property::FsSize)
    }

    pub fn fs_free(&self) -> Option<u64> {
        self.optional_count(Property::FsFree)
    }

    pub fn filesystems(&self) -> Vec<FilesystemUsage> {
        self.engine.state().filesystems.clone()
    }

    /// Watts drawn from (or charged into) the battery.
    pub fn battery_power(&self) -> Option<f64> {
        self.optional_float(Property::BatteryPower)
    }

    /// Charge level in percent.
    pub fn battery_capacity(&self) -> Option<f64> {
        self.optional_float(Property::BatteryCapacity)
    }

    pub fn battery_status(&self) -> Option<String> {
        self.value(Property::BatteryStatus)
            .as_str()
            .map(str::to_string)
    }

    /// Watt-hours when fully charged.
    pub fn battery_energy_full(&self) -> Option<f64> {
        self.optional_float(Property::BatteryEnergyFull)
    }

    // ============================================================
    // Histories and top lists
    // ============================================================

    /// CPU usage samples, oldest first.
    pub fn cpu_history(&self) -> Vec<f64> {
        self.engine.state().cpu_history.to_vec()
    }

    pub fn mem_history(&self) -> Vec<MemSample> {
        self.engine.state().mem_history.to_vec()
    }

    pub fn net_history(&self) -> Vec<NetSample> {
        self.engine.state().net_history.to_vec()
    }

    pub fn disk_history(&self) -> Vec<DiskSample> {
        self.engine.state().disk_history.to_vec()
    }

    /// The `n` processes using most CPU; `value` is percent of all cores.
    pub fn top_cpu_procs(&self, n: usize) -> Vec<TopProcess> {
        self.engine.state().processes.top_n(RankBy::Cpu, n)
    }

    /// The `n` processes with the largest PSS; `value` is bytes.
    pub fn top_mem_procs(&self, n: usize) -> Vec<TopProcess> {
        self.engine.state().processes.top_n(RankBy::Memory, n)
    }

    /// The `n` processes with most disk I/O; `value` is bytes per second.
    pub fn top_disk_procs(&self, n: usize) -> Vec<TopProcess> {
        self.engine.state().processes.top_n(RankBy::Disk, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::mock::scenarios::{io_body, net_dev_body, stat_line};
    use chrono::{DateTime, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn set_cpu(fs: &MockFs, used: u64, idle: u64) {
        fs.add_file(
            "/proc/stat",
            format!("cpu  {used} 0 0 {idle} 0 0 0 0 0 0\ncpu0 {used} 0 0 {idle} 0 0 0 0 0 0\n"),
        );
    }

    async fn vitals(fs: &MockFs) -> Vitals {
        Vitals::new(fs.shared(), Settings::default()).await.unwrap()
    }

    async fn cycle(vitals: &Vitals, kind: LoopKind, at: DateTime<Utc>) {
        vitals.engine.run_cycle(kind, at).await;
    }

    fn counter(vitals: &Vitals, property: Property) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        vitals.connect(property, move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[tokio::test]
    async fn test_missing_proc_is_fatal() {
        let result = Vitals::new(MockFs::new().shared(), Settings::default()).await;
        assert!(matches!(result, Err(VitalsError::SourceMissing(_))));
    }

    #[tokio::test]
    async fn test_initial_hardware_detection() {
        let laptop = vitals(&MockFs::typical_system()).await;
        assert_eq!(
            laptop.cpu_model().as_deref(),
            Some("Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz")
        );
        assert_eq!(laptop.cpu_count(), 4);
        assert!(laptop.value(Property::BatteryPower).is_applicable());

        let desktop = vitals(&MockFs::desktop_system()).await;
        assert_eq!(desktop.battery_power(), None);
        assert_eq!(desktop.battery_status(), None);
        assert_eq!(desktop.value(Property::BatteryStatus), Value::NotApplicable);
        assert_eq!(desktop.cpu_temperature(), None);
    }

    #[tokio::test]
    async fn test_summary_cycle() {
        let fs = MockFs::typical_system();
        set_cpu(&fs, 100, 900);
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Summary, t(0)).await;

        set_cpu(&fs, 150, 950);
        fs.add_file(
            "/proc/net/dev",
            net_dev_body(&[
                ("lo", 99_999_999, 99_999_999),
                ("eth0", 987_654_321 + 5000, 123_456_789 + 1000),
                ("docker0", 9_999_999, 9_999_999),
                ("wlan0", 1_000_000, 2_000_000),
            ]),
        );
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 12345 100 987664 5000 6789 50 456789 3000 0 4000 8000 0 0 0 0
   8       1 sda1 10000 80 900000 4000 5000 40 400000 2500 0 3500 6500 0 0 0 0
 259       0 nvme0n1 50000 200 2000000 10000 30000 150 1500004 8000 5 15000 18000 0 0 0 0
",
        );
        cycle(&vitals, LoopKind::Summary, t(1)).await;

        assert_eq!(vitals.cpu_usage(), 0.5);
        assert_eq!(vitals.cpu_cores(), vec![0.5]);
        assert_eq!(vitals.cpu_history(), vec![0.0, 0.5]);

        assert_eq!(vitals.net_recv(), 5000.0);
        assert_eq!(vitals.net_sent(), 1000.0);
        assert_eq!(vitals.disk_read(), 10.0 * 512.0);
        assert_eq!(vitals.disk_write(), 4.0 * 512.0);

        assert_eq!(vitals.mem_usage(), 0.25);
        assert_eq!(vitals.swap_usage(), 0.25);
        assert_eq!(vitals.mem_size(), 16384000 * 1024);
        assert_eq!(vitals.mem_history().len(), 2);

        assert_eq!(vitals.battery_power(), Some(12.0));
        assert_eq!(vitals.battery_capacity(), Some(50.0));
        assert_eq!(vitals.battery_status().as_deref(), Some("Discharging"));
        assert_eq!(vitals.battery_energy_full(), Some(45.6));
    }

    #[tokio::test]
    async fn test_notifies_only_on_change() {
        let fs = MockFs::typical_system();
        set_cpu(&fs, 100, 900);
        let vitals = vitals(&fs).await;
        let usage = counter(&vitals, Property::CpuUsage);
        let history = counter(&vitals, Property::CpuHistory);

        // First sample: usage stays at its initial 0.
        cycle(&vitals, LoopKind::Summary, t(0)).await;
        assert_eq!(usage.load(Ordering::SeqCst), 0);

        set_cpu(&fs, 150, 950);
        cycle(&vitals, LoopKind::Summary, t(1)).await;
        assert_eq!(usage.load(Ordering::SeqCst), 1);

        // No ticks: back to 0.
        cycle(&vitals, LoopKind::Summary, t(2)).await;
        assert_eq!(usage.load(Ordering::SeqCst), 2);
        cycle(&vitals, LoopKind::Summary, t(3)).await;
        assert_eq!(usage.load(Ordering::SeqCst), 2);

        // Every push changes the history.
        assert_eq!(history.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_stale_cycle_keeps_values() {
        let fs = MockFs::typical_system();
        set_cpu(&fs, 100, 900);
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Summary, t(0)).await;
        set_cpu(&fs, 150, 950);
        cycle(&vitals, LoopKind::Summary, t(1)).await;

        set_cpu(&fs, 1000, 950);
        cycle(&vitals, LoopKind::Summary, t(1)).await;
        assert_eq!(vitals.cpu_usage(), 0.5);
    }

    #[tokio::test]
    async fn test_failed_read_keeps_previous_value() {
        let fs = MockFs::typical_system();
        set_cpu(&fs, 100, 900);
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Summary, t(0)).await;
        assert_eq!(vitals.mem_usage(), 0.25);
        let mem = counter(&vitals, Property::MemUsage);

        set_cpu(&fs, 150, 950);
        fs.deny("/proc/meminfo");
        cycle(&vitals, LoopKind::Summary, t(1)).await;

        assert_eq!(vitals.cpu_usage(), 0.5);
        assert_eq!(vitals.net_history().len(), 2);
        assert_eq!(vitals.mem_usage(), 0.25);
        assert_eq!(vitals.mem_history().len(), 1);
        assert_eq!(mem.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_sensor_read_keeps_others() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Details, t(0)).await;
        assert_eq!(vitals.cpu_temperature(), Some(45.0));

        fs.add_file("/proc/uptime", "12400.00 98800.00\n");
        fs.add_file("/sys/class/hwmon/hwmon1/temp1_input", "not a number\n");
        fs.deny("/proc/cpuinfo");
        cycle(&vitals, LoopKind::Details, t(5)).await;

        assert_eq!(vitals.uptime(), 12400);
        assert_eq!(vitals.cpu_temperature(), Some(45.0));
        assert_eq!(vitals.cpu_frequency(), Some(2100.0));
        assert_eq!(vitals.top_mem_procs(1)[0].pid, Some(1));
    }

    #[tokio::test]
    async fn test_disabled_battery_withdrawn() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Summary, t(0)).await;
        assert_eq!(vitals.battery_power(), Some(12.0));
        let power = counter(&vitals, Property::BatteryPower);

        vitals.set_setting("show-battery", "false").unwrap();
        cycle(&vitals, LoopKind::Summary, t(1)).await;
        assert_eq!(vitals.battery_power(), None);
        assert_eq!(vitals.battery_status(), None);
        assert_eq!(vitals.value(Property::BatteryCapacity), Value::NotApplicable);
        cycle(&vitals, LoopKind::Summary, t(2)).await;
        assert_eq!(power.load(Ordering::SeqCst), 1);

        vitals.set_setting("show-battery", "true").unwrap();
        cycle(&vitals, LoopKind::Summary, t(3)).await;
        assert_eq!(vitals.battery_power(), Some(12.0));
        assert_eq!(vitals.battery_status().as_deref(), Some("Discharging"));
        assert_eq!(power.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_details_cycle_ranks_processes() {
        let fs = MockFs::typical_system();
        set_cpu(&fs, 13500, 80000);
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Details, t(0)).await;

        set_cpu(&fs, 13600, 80100);
        fs.add_file("/proc/1/stat", stat_line(1, "systemd", 1050, 500));
        fs.add_file("/proc/1000/stat", stat_line(1000, "bash", 110, 50));
        fs.add_file("/proc/1000/io", io_body(4096 + 4096, 2048));
        cycle(&vitals, LoopKind::Details, t(1)).await;

        let cpu = vitals.top_cpu_procs(3);
        assert_eq!(cpu[0].command, "init");
        assert_eq!(cpu[0].value, 25.0);
        assert_eq!(cpu[1].command, "bash");
        assert_eq!(cpu[1].value, 5.0);
        assert!(cpu[2].is_placeholder());
        assert_eq!(vitals.top_cpu_procs(3), cpu);

        let mem = vitals.top_mem_procs(3);
        assert_eq!(mem[0].pid, Some(1));
        assert_eq!(mem[0].value, (12000 * 1024) as f64);
        assert_eq!(mem[2].command, "kworker/0:1");

        let disk = vitals.top_disk_procs(2);
        assert_eq!(disk[0].command, "bash");
        assert_eq!(disk[0].value, 4096.0);
        assert!(disk[1].is_placeholder());

        assert_eq!(vitals.uptime(), 12345);
        assert_eq!(vitals.cpu_frequency(), Some(2100.0));
        assert_eq!(vitals.cpu_temperature(), Some(45.0));
    }

    #[tokio::test]
    async fn test_exited_process_dropped() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Details, t(0)).await;
        assert_eq!(vitals.top_mem_procs(6).iter().filter(|p| !p.is_placeholder()).count(), 3);

        fs.remove("/proc/1000");
        cycle(&vitals, LoopKind::Details, t(5)).await;
        let mem = vitals.top_mem_procs(6);
        assert!(mem.iter().all(|p| p.pid != Some(1000)));
        assert_eq!(mem.len(), 6);
    }

    #[tokio::test]
    async fn test_filesystem_cycle() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Filesystem, t(0)).await;

        assert_eq!(vitals.fs_usage(), Some(0.65));
        assert_eq!(vitals.fs_size(), Some(4096 * 1_000_000));
        assert_eq!(vitals.fs_free(), Some(4096 * 350_000));

        let mounts: Vec<String> = vitals
            .filesystems()
            .into_iter()
            .map(|f| f.mount_point)
            .collect();
        assert_eq!(mounts, vec!["/", "/boot/efi", "/home"]);

        vitals.set_setting("mount", "/media/usb").unwrap();
        cycle(&vitals, LoopKind::Filesystem, t(60)).await;
        assert_eq!(vitals.fs_usage(), None);
        assert_eq!(vitals.value(Property::FsSize), Value::NotApplicable);
    }

    #[tokio::test]
    async fn test_disabled_monitor_is_reset() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        cycle(&vitals, LoopKind::Summary, t(0)).await;

        vitals.set_setting("show-net", "false").unwrap();
        fs.add_file("/proc/net/dev", net_dev_body(&[("eth0", 987_654_321 + 10_000, 0)]));
        cycle(&vitals, LoopKind::Summary, t(1)).await;
        assert_eq!(vitals.net_recv(), 0.0);
        assert_eq!(vitals.net_history().len(), 1);

        // Re-enabled: the first sample after the gap yields no rate.
        vitals.set_setting("show-net", "true").unwrap();
        cycle(&vitals, LoopKind::Summary, t(2)).await;
        assert_eq!(vitals.net_recv(), 0.0);
        assert_eq!(vitals.net_history().len(), 2);
    }

    #[tokio::test]
    async fn test_network_device_restriction() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        vitals.set_setting("network-device", "wlan0").unwrap();
        cycle(&vitals, LoopKind::Summary, t(0)).await;

        fs.add_file(
            "/proc/net/dev",
            net_dev_body(&[("eth0", 987_654_321 + 50_000, 0), ("wlan0", 1_000_000 + 300, 0)]),
        );
        cycle(&vitals, LoopKind::Summary, t(1)).await;
        assert_eq!(vitals.net_recv(), 300.0);
    }

    #[tokio::test]
    async fn test_unknown_names() {
        let vitals = vitals(&MockFs::typical_system()).await;
        assert!(matches!(
            vitals.connect_named("gpu-usage", || {}),
            Err(VitalsError::UnknownProperty(_))
        ));
        assert!(vitals.connect_named("cpu-usage", || {}).is_ok());
        assert!(matches!(
            vitals.set_setting("show-gpu", "true"),
            Err(VitalsError::Config(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stop() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        assert!(!vitals.is_running());

        vitals.start().unwrap();
        vitals.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(vitals.is_running());
        assert_eq!(vitals.cpu_history().len(), 1);
        assert_eq!(vitals.filesystems().len(), 3);

        vitals.stop();
        vitals.stop();
        assert!(!vitals.is_running());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(vitals.cpu_history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_rate_change_restarts_summary() {
        let fs = MockFs::typical_system();
        let vitals = vitals(&fs).await;
        vitals.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(vitals.cpu_history().len(), 1);

        vitals.set_setting("refresh-rate", "fast").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(vitals.cpu_history().len(), 2);

        // 1250 ms at the fast rate, well before the medium 2500 ms.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(vitals.cpu_history().len(), 3);
        vitals.stop();
    }

    #[test]
    fn test_start_requires_runtime() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let vitals = runtime.block_on(vitals(&MockFs::typical_system()));
        assert!(matches!(vitals.start(), Err(VitalsError::NoRuntime)));
    }
}
