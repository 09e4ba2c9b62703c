use async_trait::async_trait;

use super::{Monitor, RefreshContext};
use crate::collector::{BatteryReader, ReadFailure};
use crate::rates::round_to;
use crate::settings::Settings;
use crate::vitals::state::{Property, Value, VitalsState};

pub(crate) const BATTERY_PROPERTIES: [Property; 4] = [
    Property::BatteryPower,
    Property::BatteryCapacity,
    Property::BatteryStatus,
    Property::BatteryEnergyFull,
];

/// Power draw, charge and status of the battery found at startup.
///
/// Only created when a battery was discovered; otherwise the battery
/// properties are set to [`Value::NotApplicable`] once and never refreshed.
pub struct BatteryMonitor {
    reader: BatteryReader,
}

impl BatteryMonitor {
    pub fn new(reader: BatteryReader) -> Self {
        Self { reader }
    }
}

fn optional(value: Option<f64>, precision: u32) -> Value {
    value.map_or(Value::NotApplicable, |v| Value::Float(round_to(v, precision)))
}

#[async_trait]
impl Monitor for BatteryMonitor {
    fn name(&self) -> &'static str {
        "battery"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_battery
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let reading = self.reader.read().await?;

        ctx.publish(|state| {
            state.set(Property::BatteryPower, optional(reading.power_watts(), 2));
            state.set(Property::BatteryCapacity, optional(reading.capacity, 1));
            state.set(
                Property::BatteryEnergyFull,
                optional(reading.energy_full_wh(), 2),
            );
            state.set(Property::BatteryStatus, Value::Text(reading.status));
        });
        Ok(())
    }

    fn destroy(&mut self) {}

    fn withdraw(&self, state: &mut VitalsState) {
        for property in BATTERY_PROPERTIES {
            state.set(property, Value::NotApplicable);
        }
    }
}
