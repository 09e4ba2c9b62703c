//! Per-process tracking across details cycles and top-N ranking.
//!
//! The table is rebuilt every cycle from that cycle's samples: entries for
//! pids that were not enumerated again are dropped, so memory stays bounded
//! by the live process count. A pid seen in consecutive enumerations is
//! assumed to be the same process; a recycled pid briefly inherits the
//! previous owner's counters until its first full cycle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collector::{ProcessSample, SampleRequest};
use crate::rates::{RateState, round_to};

/// Entries returned by the top-N accessors unless asked otherwise.
pub const DEFAULT_TOP_N: usize = 6;

/// One OS process as tracked across cycles.
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: u32,
    /// Resolved once, when the pid first appears.
    pub command: String,
    cpu_ticks: RateState,
    disk_read: RateState,
    disk_write: RateState,
    cpu_fraction: f64,
    /// Total ticks of cycles in which `stat` could not be read; they belong
    /// to the span of the next tick delta.
    missed_ticks: u64,
    memory_bytes: u64,
    /// False when this cycle's `stat` read failed; such entries keep their
    /// previous values but are not ranked.
    fresh: bool,
}

impl Process {
    fn new(pid: u32, command: String) -> Self {
        Self {
            pid,
            command,
            cpu_ticks: RateState::new(0),
            disk_read: RateState::new(0),
            disk_write: RateState::new(0),
            cpu_fraction: 0.0,
            missed_ticks: 0,
            memory_bytes: 0,
            fresh: false,
        }
    }

    /// Share of all CPU ticks in the last interval, in `[0, 1]`.
    pub fn cpu_usage(&self) -> f64 {
        self.cpu_fraction
    }

    /// Proportional set size in bytes.
    pub fn memory(&self) -> u64 {
        self.memory_bytes
    }

    /// Bytes read per second; 0 after a counter reset.
    pub fn disk_read_rate(&self) -> f64 {
        self.disk_read.rate().max(0.0)
    }

    /// Bytes written per second; 0 after a counter reset.
    pub fn disk_write_rate(&self) -> f64 {
        self.disk_write.rate().max(0.0)
    }

    pub fn disk_rate(&self) -> f64 {
        self.disk_read_rate() + self.disk_write_rate()
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    fn metric(&self, rank: RankBy) -> f64 {
        match rank {
            RankBy::Cpu => self.cpu_usage(),
            RankBy::Memory => self.memory_bytes as f64,
            RankBy::Disk => self.disk_rate(),
        }
    }

    fn apply(
        &mut self,
        sample: &ProcessSample,
        ticks: u64,
        total_ticks: u64,
        at: DateTime<Utc>,
        request: SampleRequest,
    ) {
        self.fresh = true;

        let span = total_ticks.saturating_add(std::mem::take(&mut self.missed_ticks));
        self.cpu_ticks.update(ticks, at);
        self.cpu_fraction = match self.cpu_ticks.delta() {
            Some(delta) if span > 0 => (delta.max(0) as f64 / span as f64).min(1.0),
            _ => 0.0,
        };

        if request.memory
            && let Some(pss) = sample.pss_bytes
        {
            self.memory_bytes = pss;
        }

        if request.io
            && let Some(io) = &sample.io
        {
            self.disk_read.update(io.read_bytes, at);
            self.disk_write.update(io.write_bytes, at);
        }
    }
}

/// Ranking key for [`ProcessTable::top_n`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Cpu,
    Memory,
    Disk,
}

/// One row of a top-N list.
///
/// `value` is the ranking metric: CPU percent, bytes of memory or bytes per
/// second of disk I/O. Placeholder rows have no pid and an empty command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopProcess {
    pub pid: Option<u32>,
    pub command: String,
    pub value: f64,
}

impl TopProcess {
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn is_placeholder(&self) -> bool {
        self.pid.is_none()
    }
}

/// Processes seen in the latest enumeration, in ascending pid order.
#[derive(Debug, Default)]
pub struct ProcessTable {
    processes: Vec<Process>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Returns true when `pid` was tracked in the previous cycle.
    pub fn contains(&self, pid: u32) -> bool {
        self.get(pid).is_some()
    }

    pub fn get(&self, pid: u32) -> Option<&Process> {
        self.processes
            .binary_search_by_key(&pid, |p| p.pid)
            .ok()
            .map(|i| &self.processes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    /// Replaces the table with the processes sampled this cycle.
    ///
    /// `samples` must be in enumeration order. `total_ticks` is the number of
    /// CPU ticks (used + idle, all cores) that elapsed since the previous
    /// cycle. A process whose `stat` could not be read keeps its previous
    /// entry marked stale; a new pid without `stat` is not tracked.
    pub fn reconcile(
        &mut self,
        samples: &[ProcessSample],
        total_ticks: u64,
        at: DateTime<Utc>,
        request: SampleRequest,
    ) {
        let mut previous: HashMap<u32, Process> =
            self.processes.drain(..).map(|p| (p.pid, p)).collect();

        let mut next = Vec::with_capacity(samples.len());
        for sample in samples {
            let entry = previous.remove(&sample.pid);
            let Some(stat) = &sample.stat else {
                if let Some(mut process) = entry {
                    process.fresh = false;
                    process.missed_ticks = process.missed_ticks.saturating_add(total_ticks);
                    next.push(process);
                }
                continue;
            };

            let mut process = entry.unwrap_or_else(|| {
                let command = sample
                    .command
                    .clone()
                    .unwrap_or_else(|| stat.comm.clone());
                Process::new(sample.pid, command)
            });
            process.apply(sample, stat.ticks(), total_ticks, at, request);
            next.push(process);
        }

        next.sort_by_key(|p| p.pid);
        self.processes = next;
    }

    /// The `n` highest-ranked fresh processes, padded with placeholders.
    ///
    /// Sorting is stable, so ties keep enumeration order. CPU and disk
    /// rankings skip idle processes; memory ranking does not.
    pub fn top_n(&self, rank: RankBy, n: usize) -> Vec<TopProcess> {
        let mut ranked: Vec<(&Process, f64)> = self
            .processes
            .iter()
            .filter(|p| p.fresh)
            .map(|p| (p, p.metric(rank)))
            .filter(|(_, value)| rank == RankBy::Memory || *value > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut top: Vec<TopProcess> = ranked
            .into_iter()
            .take(n)
            .map(|(p, value)| TopProcess {
                pid: Some(p.pid),
                command: p.command.clone(),
                value: match rank {
                    RankBy::Cpu => round_to(value * 100.0, 1),
                    RankBy::Memory | RankBy::Disk => value,
                },
            })
            .collect();
        top.resize_with(n, TopProcess::placeholder);
        top
    }

    pub fn clear(&mut self) {
        self.processes.clear();
    }
}
