use async_trait::async_trait;

use super::{Monitor, RefreshContext};
use crate::collector::{ReadFailure, SystemReader, TemperatureReader};
use crate::rates::round_to;
use crate::settings::Settings;
use crate::vitals::state::{Property, Value};

/// Uptime, average CPU frequency and CPU temperature.
///
/// Each source is independent: a failed read leaves only its own property
/// untouched. The first failure is returned after publishing the rest.
pub struct SensorsMonitor {
    system: SystemReader,
    temperature: Option<TemperatureReader>,
}

impl SensorsMonitor {
    pub fn new(system: SystemReader, temperature: Option<TemperatureReader>) -> Self {
        Self {
            system,
            temperature,
        }
    }
}

#[async_trait]
impl Monitor for SensorsMonitor {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn enabled(&self, _settings: &Settings) -> bool {
        true
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let uptime = self.system.read_uptime().await;
        let cpuinfo = self.system.read_cpuinfo().await;
        let temperature = match &self.temperature {
            Some(reader) => Some(reader.read().await),
            None => None,
        };

        let mut first_error = None;
        let mut updates = Vec::with_capacity(3);

        match uptime {
            Ok(secs) => updates.push((Property::Uptime, Value::Count(secs as u64))),
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match cpuinfo {
            Ok(info) => {
                let frequency = info
                    .average_mhz()
                    .map_or(Value::NotApplicable, |mhz| Value::Float(round_to(mhz, 0)));
                updates.push((Property::CpuFrequency, frequency));
            }
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match temperature {
            Some(Ok(celsius)) => {
                updates.push((Property::CpuTemperature, Value::Float(round_to(celsius, 1))))
            }
            Some(Err(e)) => first_error = first_error.or(Some(e)),
            None => {}
        }

        ctx.publish(|state| {
            for (property, value) in updates {
                state.set(property, value);
            }
        });

        first_error.map_or(Ok(()), Err)
    }

    fn destroy(&mut self) {}
}
