use async_trait::async_trait;

use super::{Monitor, RefreshContext, round_fraction};
use crate::collector::{ReadFailure, SystemReader};
use crate::history::fingerprint;
use crate::rates::CpuUsageTracker;
use crate::settings::Settings;
use crate::vitals::state::{Property, Value};

/// Aggregate and per-core CPU usage from `/proc/stat`.
pub struct CpuMonitor {
    reader: SystemReader,
    total: CpuUsageTracker,
    cores: Vec<CpuUsageTracker>,
}

impl CpuMonitor {
    pub fn new(reader: SystemReader) -> Self {
        Self {
            reader,
            total: CpuUsageTracker::new(),
            cores: Vec::new(),
        }
    }
}

#[async_trait]
impl Monitor for CpuMonitor {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_cpu
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let stats = self.reader.read_cpu().await?;
        let Some((aggregate, per_core)) = stats.split_first() else {
            return Ok(());
        };

        self.total
            .update(aggregate.used(), aggregate.idle_time(), ctx.now);
        // Cores can come online or go offline between cycles.
        self.cores
            .resize_with(per_core.len(), CpuUsageTracker::new);
        for (tracker, core) in self.cores.iter_mut().zip(per_core) {
            tracker.update(core.used(), core.idle_time(), ctx.now);
        }

        let usage = round_fraction(self.total.usage());
        let cores: Vec<f64> = self
            .cores
            .iter()
            .map(|c| round_fraction(c.usage()))
            .collect();

        ctx.publish(|state| {
            state.set(Property::CpuUsage, Value::Float(usage));
            state.cpu_history.push(usage);
            state.set(
                Property::CpuHistory,
                Value::Fingerprint(state.cpu_history.fingerprint()),
            );
            state.set(Property::CpuCores, Value::Fingerprint(fingerprint(&cores)));
            state.cpu_cores = cores;
        });
        Ok(())
    }

    fn destroy(&mut self) {
        self.total.reset();
        self.cores.clear();
    }
}
