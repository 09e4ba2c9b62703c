//! Readers for optional hardware exposed under `/sys`.
//!
//! Both readers are discovered once; a machine without the hardware gets no
//! reader at all rather than a reader that fails every cycle.

pub mod battery;
pub mod hwmon;

pub use battery::{BatteryReader, BatteryReading};
pub use hwmon::TemperatureReader;
