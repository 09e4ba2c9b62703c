use std::collections::HashSet;

use async_trait::async_trait;
use futures_util::future::join_all;

use super::{Monitor, RefreshContext};
use crate::collector::{ProcessReader, ReadFailure, SampleRequest, SystemReader};
use crate::history::fingerprint;
use crate::process_table::{DEFAULT_TOP_N, RankBy};
use crate::rates::CpuUsageTracker;
use crate::settings::Settings;
use crate::vitals::state::{Property, Value};

/// Processes read concurrently before yielding to other loops.
const BATCH_SIZE: usize = 2;

/// Per-process CPU, memory and disk I/O, reduced to top-N lists.
pub struct ProcessMonitor {
    processes: ProcessReader,
    system: SystemReader,
    /// Aggregate ticks, the denominator of per-process CPU share.
    total: CpuUsageTracker,
    clear_table: bool,
}

impl ProcessMonitor {
    pub fn new(processes: ProcessReader, system: SystemReader) -> Self {
        Self {
            processes,
            system,
            total: CpuUsageTracker::new(),
            clear_table: false,
        }
    }
}

#[async_trait]
impl Monitor for ProcessMonitor {
    fn name(&self) -> &'static str {
        "processes"
    }

    fn enabled(&self, settings: &Settings) -> bool {
        settings.show_cpu || settings.show_mem || settings.show_disk
    }

    async fn refresh(&mut self, ctx: &RefreshContext<'_>) -> Result<(), ReadFailure> {
        let cpu = self.system.read_cpu().await?;
        if let Some(aggregate) = cpu.first() {
            self.total
                .update(aggregate.used(), aggregate.idle_time(), ctx.now);
        }
        let (used, idle) = self.total.tick_deltas();

        let pids = self.processes.list_pids().await?;

        let clear_table = std::mem::take(&mut self.clear_table);
        let known: HashSet<u32> = ctx.publish(|state| {
            if clear_table {
                state.processes.clear();
            }
            state.processes.iter().map(|p| p.pid).collect()
        });

        let request = SampleRequest {
            command: false,
            memory: ctx.settings.show_mem,
            io: ctx.settings.show_disk,
        };

        let mut samples = Vec::with_capacity(pids.len());
        for batch in pids.chunks(BATCH_SIZE) {
            let reads = batch.iter().map(|&pid| {
                let request = SampleRequest {
                    command: !known.contains(&pid),
                    ..request
                };
                self.processes.sample(pid, request)
            });
            samples.extend(join_all(reads).await);
            tokio::task::yield_now().await;
        }

        let settings = ctx.settings;
        ctx.publish(|state| {
            state
                .processes
                .reconcile(&samples, used + idle, ctx.now, request);

            let rankings = [
                (settings.show_cpu, RankBy::Cpu, Property::CpuTopProcs),
                (settings.show_mem, RankBy::Memory, Property::MemTopProcs),
                (settings.show_disk, RankBy::Disk, Property::DiskTopProcs),
            ];
            for (enabled, rank, property) in rankings {
                if enabled {
                    let top = state.processes.top_n(rank, DEFAULT_TOP_N);
                    state.set(property, Value::Fingerprint(fingerprint(&top)));
                }
            }
        });

        tracing::trace!(processes = samples.len(), "process table reconciled");
        Ok(())
    }

    fn destroy(&mut self) {
        self.total.reset();
        self.clear_table = true;
    }
}
