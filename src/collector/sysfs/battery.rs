//! Battery reader for `/sys/class/power_supply/*/uevent`.
//!
//! All quantities stay in the kernel's micro-units until published:
//! µV, µA, µW, µAh and µWh.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::collector::error::ReadFailure;
use crate::collector::procfs::parser::ParseError;
use crate::collector::read_source;
use crate::collector::traits::SharedFs;

const MICRO: u128 = 1_000_000;

/// Derived battery state from one `uevent` read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatteryReading {
    /// `Charging`, `Discharging`, `Full`, ...
    pub status: String,
    /// Power draw in µW.
    pub power_uw: Option<u64>,
    /// Energy when full in µWh.
    pub energy_full_uwh: Option<u64>,
    /// Current energy in µWh.
    pub energy_now_uwh: Option<u64>,
    /// Charge level in percent.
    pub capacity: Option<f64>,
}

impl BatteryReading {
    /// Power draw in watts.
    pub fn power_watts(&self) -> Option<f64> {
        self.power_uw.map(|uw| uw as f64 / 1e6)
    }

    /// Energy when full in watt-hours.
    pub fn energy_full_wh(&self) -> Option<f64> {
        self.energy_full_uwh.map(|uwh| uwh as f64 / 1e6)
    }
}

/// Splits `KEY=value` lines, dropping the `POWER_SUPPLY_` prefix from keys.
pub fn parse_uevent(content: &str) -> HashMap<&str, &str> {
    content
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            Some((
                key.strip_prefix("POWER_SUPPLY_").unwrap_or(key),
                value.trim(),
            ))
        })
        .collect()
}

/// Multiplies two micro-unit quantities, e.g. µV × µA → µW.
fn micro_product(a: u64, b: u64) -> u64 {
    let product = u128::from(a) * u128::from(b) / MICRO;
    u64::try_from(product).unwrap_or(u64::MAX)
}

/// Parses a battery `uevent` file.
///
/// Power is `POWER_NOW`, or `VOLTAGE_NOW × CURRENT_NOW` when absent.
/// Energy is `ENERGY_*`, or `CHARGE_* × voltage` when absent, where the
/// voltage is `VOLTAGE_MIN_DESIGN` if reported and `VOLTAGE_NOW` otherwise.
/// Some drivers report current and power as negative while discharging, so
/// magnitudes are used.
pub fn parse_battery_uevent(content: &str) -> Result<BatteryReading, ParseError> {
    let fields = parse_uevent(content);
    if fields.is_empty() {
        return Err(ParseError::new("empty battery uevent"));
    }

    let get = |key: &str| -> Option<u64> {
        fields
            .get(key)
            .and_then(|v| v.parse::<i64>().ok())
            .map(i64::unsigned_abs)
    };

    let voltage_now = get("VOLTAGE_NOW");
    let design_voltage = get("VOLTAGE_MIN_DESIGN").or(voltage_now);

    let power_uw = get("POWER_NOW").or_else(|| {
        let v = voltage_now?;
        let i = get("CURRENT_NOW")?;
        Some(micro_product(v, i))
    });

    let energy = |energy_key: &str, charge_key: &str| -> Option<u64> {
        get(energy_key).or_else(|| Some(micro_product(get(charge_key)?, design_voltage?)))
    };
    let energy_full_uwh = energy("ENERGY_FULL", "CHARGE_FULL");
    let energy_now_uwh = energy("ENERGY_NOW", "CHARGE_NOW");

    let capacity = get("CAPACITY").map(|c| c as f64).or_else(|| {
        let full = energy_full_uwh.filter(|&f| f > 0)?;
        Some(energy_now_uwh? as f64 / full as f64 * 100.0)
    });

    Ok(BatteryReading {
        status: fields
            .get("STATUS")
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        power_uw,
        energy_full_uwh,
        energy_now_uwh,
        capacity,
    })
}

/// Reads one battery's `uevent` file.
#[derive(Clone)]
pub struct BatteryReader {
    fs: SharedFs,
    uevent_path: PathBuf,
}

impl BatteryReader {
    /// Creates a reader for a known `uevent` path.
    pub fn new(fs: SharedFs, uevent_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            uevent_path: uevent_path.into(),
        }
    }

    /// Finds the first power supply whose `type` is `Battery`.
    ///
    /// Returns `None` when the machine has no battery; callers treat that as
    /// permanent for the lifetime of the engine.
    pub async fn discover(fs: SharedFs, sys_path: impl Into<PathBuf>) -> Option<Self> {
        let supplies = sys_path.into().join("class/power_supply");
        let mut entries = fs.read_dir(&supplies).await.ok()?;
        entries.sort();

        for entry in entries {
            let Ok(kind) = fs.read_to_string(&entry.join("type")).await else {
                continue;
            };
            if kind.trim() == "Battery" && fs.exists(&entry.join("uevent")).await {
                tracing::debug!(path = %entry.display(), "battery found");
                return Some(Self::new(fs, entry.join("uevent")));
            }
        }
        None
    }

    /// Reads and parses the `uevent` file.
    pub async fn read(&self) -> Result<BatteryReading, ReadFailure> {
        let content = read_source(self.fs.as_ref(), &self.uevent_path).await?;
        parse_battery_uevent(&content).map_err(|e| ReadFailure::malformed(&self.uevent_path, e))
    }
}
