//! CPU temperature from `/sys/class/hwmon/hwmon*/`.

use std::path::PathBuf;

use crate::collector::error::ReadFailure;
use crate::collector::procfs::parser::ParseError;
use crate::collector::read_source;
use crate::collector::traits::SharedFs;

/// hwmon driver names that report the CPU package temperature.
const CPU_SENSORS: &[&str] = &["coretemp", "k10temp", "zenpower", "cpu_thermal", "acpitz"];

/// Parses a `temp*_input` value (millidegrees Celsius) into degrees.
pub fn parse_millidegrees(content: &str) -> Result<f64, ParseError> {
    let raw: i64 = content
        .trim()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid temperature: {:?}", content.trim())))?;
    Ok(raw as f64 / 1000.0)
}

#[derive(Clone)]
pub struct TemperatureReader {
    fs: SharedFs,
    input_path: PathBuf,
}

impl TemperatureReader {
    pub fn new(fs: SharedFs, input_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            input_path: input_path.into(),
        }
    }

    /// Finds the first hwmon device whose `name` is a known CPU sensor.
    pub async fn discover(fs: SharedFs, sys_path: impl Into<PathBuf>) -> Option<Self> {
        let hwmon = sys_path.into().join("class/hwmon");
        let mut entries = fs.read_dir(&hwmon).await.ok()?;
        entries.sort();

        for entry in entries {
            let Ok(name) = fs.read_to_string(&entry.join("name")).await else {
                continue;
            };
            let input = entry.join("temp1_input");
            if CPU_SENSORS.contains(&name.trim()) && fs.exists(&input).await {
                tracing::debug!(sensor = name.trim(), path = %input.display(), "cpu sensor found");
                return Some(Self::new(fs, input));
            }
        }
        None
    }

    /// Reads the current temperature in degrees Celsius.
    pub async fn read(&self) -> Result<f64, ReadFailure> {
        let content = read_source(self.fs.as_ref(), &self.input_path).await?;
        parse_millidegrees(&content).map_err(|e| ReadFailure::malformed(&self.input_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("45000\n").unwrap(), 45.0);
        assert_eq!(parse_millidegrees("-5500").unwrap(), -5.5);
        assert!(parse_millidegrees("hot").is_err());
    }

    #[tokio::test]
    async fn test_discover_picks_cpu_sensor() {
        // hwmon0 is an nvme sensor and must be skipped.
        let fs = MockFs::typical_system();
        let reader = TemperatureReader::discover(fs.shared(), "/sys").await.unwrap();
        assert_eq!(reader.read().await.unwrap(), 45.0);
    }

    #[tokio::test]
    async fn test_discover_without_cpu_sensor() {
        let fs = MockFs::desktop_system();
        assert!(TemperatureReader::discover(fs.shared(), "/sys").await.is_none());
    }

    #[tokio::test]
    async fn test_read_after_sensor_vanished() {
        let fs = MockFs::typical_system();
        let reader = TemperatureReader::discover(fs.shared(), "/sys").await.unwrap();
        fs.remove("/sys/class/hwmon/hwmon1");

        assert!(reader.read().await.unwrap_err().is_vanished());
    }
}
