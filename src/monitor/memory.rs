use async_trait::async_trait;

use super::{Monitor, RefreshContext, round_fraction};
use crate::collector::{ReadFailure, SystemReader};
use crate::settings::Settings;
use crate::vitals::state::{MemSample, Property, Value};

/// RAM and swap usage from `/proc/meminfo`. Stateless between cycles.
pub struct MemoryMonitor {
    reader: SystemReader,
}

impl MemoryMonitor {
    pub fn new(reader: SystemReader) -> Self {
        Self { reader }
    }
}

fn used_fraction(total: u64, free: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(free) as f64 / total as f64
}

#[async_trait]
impl Monitor for MemoryMonitor {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_mem
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let info = self.reader.read_meminfo().await?;

        let sample = MemSample {
            ram: round_fraction(used_fraction(info.mem_total, info.mem_available)),
            swap: round_fraction(used_fraction(info.swap_total, info.swap_free)),
        };

        ctx.publish(|state| {
            state.set(Property::MemUsage, Value::Float(sample.ram));
            state.set(Property::MemSize, Value::Count(info.mem_total * 1024));
            state.set(Property::SwapUsage, Value::Float(sample.swap));
            state.set(Property::SwapSize, Value::Count(info.swap_total * 1024));
            state.mem_history.push(sample);
            state.set(
                Property::MemHistory,
                Value::Fingerprint(state.mem_history.fingerprint()),
            );
        });
        Ok(())
    }

    fn destroy(&mut self) {}
}
