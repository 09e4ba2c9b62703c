//! Engine settings and named access for the host's settings store.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base period of the summary loop at `medium` refresh rate.
pub const SUMMARY_BASE_INTERVAL: Duration = Duration::from_millis(2500);
/// Period of the details loop.
pub const DETAILS_INTERVAL: Duration = Duration::from_secs(5);
/// Period of the filesystem loop.
pub const FILESYSTEM_INTERVAL: Duration = Duration::from_secs(60);

/// Prefix of environment variables read by [`Settings::from_env`].
const ENV_PREFIX: &str = "VITALS_";

/// Setting keys accepted by [`Settings::set_named`] and [`Settings::get_named`].
pub const KEYS: &[&str] = &[
    "show-cpu",
    "show-mem",
    "show-net",
    "show-disk",
    "show-fs",
    "show-battery",
    "network-device",
    "mount",
    "refresh-rate",
    "proc-path",
    "sys-path",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownKey(String),
    InvalidValue { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownKey(key) => write!(f, "unknown setting: {}", key),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Multiplier applied to the summary loop period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshRate {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl RefreshRate {
    pub fn multiplier(self) -> f64 {
        match self {
            RefreshRate::Slow => 2.0,
            RefreshRate::Medium => 1.0,
            RefreshRate::Fast => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RefreshRate::Slow => "slow",
            RefreshRate::Medium => "medium",
            RefreshRate::Fast => "fast",
        }
    }
}

impl FromStr for RefreshRate {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(RefreshRate::Slow),
            "medium" => Ok(RefreshRate::Medium),
            "fast" => Ok(RefreshRate::Fast),
            _ => Err(()),
        }
    }
}

fn default_mount() -> String {
    "/".to_string()
}

fn default_proc_path() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_sys_path() -> PathBuf {
    PathBuf::from("/sys")
}

/// Everything the host can configure.
///
/// Changes take effect on the next cycle of the affected loop, except
/// `refresh-rate` which restarts the summary loop and the data-source roots
/// which are only read at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub show_cpu: bool,
    pub show_mem: bool,
    pub show_net: bool,
    pub show_disk: bool,
    pub show_fs: bool,
    pub show_battery: bool,
    /// Only count this interface; `None` sums all physical interfaces.
    pub network_device: Option<String>,
    pub mount: String,
    pub refresh_rate: RefreshRate,
    pub proc_path: PathBuf,
    pub sys_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_cpu: true,
            show_mem: true,
            show_net: true,
            show_disk: true,
            show_fs: true,
            show_battery: true,
            network_device: None,
            mount: default_mount(),
            refresh_rate: RefreshRate::Medium,
            proc_path: default_proc_path(),
            sys_path: default_sys_path(),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl Settings {
    /// Defaults overlaid with `VITALS_<KEY>` environment variables, e.g.
    /// `VITALS_REFRESH_RATE=fast`. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut settings = Self::default();
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = key.to_ascii_lowercase().replace('_', "-");
            if let Err(e) = settings.set_named(&key, &value) {
                tracing::warn!(variable = %name, error = %e, "ignoring environment setting");
            }
        }
        settings
    }

    /// Sets one value by its kebab-case key.
    ///
    /// An empty `network-device` clears the restriction.
    pub fn set_named(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "show-cpu" => self.show_cpu = parse_bool(key, value)?,
            "show-mem" => self.show_mem = parse_bool(key, value)?,
            "show-net" => self.show_net = parse_bool(key, value)?,
            "show-disk" => self.show_disk = parse_bool(key, value)?,
            "show-fs" => self.show_fs = parse_bool(key, value)?,
            "show-battery" => self.show_battery = parse_bool(key, value)?,
            "network-device" => {
                let device = value.trim();
                self.network_device = (!device.is_empty()).then(|| device.to_string());
            }
            "mount" => {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    });
                }
                self.mount = value.trim().to_string();
            }
            "refresh-rate" => {
                self.refresh_rate = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
            }
            "proc-path" => self.proc_path = PathBuf::from(value.trim()),
            "sys-path" => self.sys_path = PathBuf::from(value.trim()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Reads one value by its kebab-case key, formatted as a string.
    pub fn get_named(&self, key: &str) -> Result<String, ConfigError> {
        Ok(match key {
            "show-cpu" => self.show_cpu.to_string(),
            "show-mem" => self.show_mem.to_string(),
            "show-net" => self.show_net.to_string(),
            "show-disk" => self.show_disk.to_string(),
            "show-fs" => self.show_fs.to_string(),
            "show-battery" => self.show_battery.to_string(),
            "network-device" => self.network_device.clone().unwrap_or_default(),
            "mount" => self.mount.clone(),
            "refresh-rate" => self.refresh_rate.as_str().to_string(),
            "proc-path" => self.proc_path.display().to_string(),
            "sys-path" => self.sys_path.display().to_string(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        })
    }

    /// Summary loop period for the configured refresh rate.
    pub fn summary_interval(&self) -> Duration {
        SUMMARY_BASE_INTERVAL.mul_f64(self.refresh_rate.multiplier())
    }
}
