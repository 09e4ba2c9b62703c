//! Rate computation from cumulative OS counters.
//!
//! Every per-second value the engine publishes goes through [`RateState`]:
//! network and disk throughput, per-process disk I/O and CPU time.

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// A raw cumulative counter value and the wall-clock time it was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSample {
    pub value: u64,
    pub at: DateTime<Utc>,
}

/// Rounds `value` to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

// ---------------------------------------------------------------------------
// Rate state
// ---------------------------------------------------------------------------

/// Holds the two most recent samples of one cumulative counter.
///
/// Samples are accepted only with a strictly newer timestamp, so whenever
/// both slots are filled `current.at > previous.at` holds and the elapsed
/// time is never zero.
#[derive(Debug, Clone, Default)]
pub struct RateState {
    current: Option<CounterSample>,
    previous: Option<CounterSample>,
    precision: u32,
}

impl RateState {
    /// Creates an empty tracker whose rate is rounded to `precision` decimals.
    pub fn new(precision: u32) -> Self {
        Self {
            current: None,
            previous: None,
            precision,
        }
    }

    /// Records a new sample. Returns false (and leaves the tracker unchanged)
    /// when `at` is not newer than the last accepted sample.
    pub fn update(&mut self, value: u64, at: DateTime<Utc>) -> bool {
        if let Some(current) = self.current
            && at <= current.at
        {
            tracing::warn!(
                value,
                at = %at,
                last = %current.at,
                "dropping stale counter sample"
            );
            return false;
        }
        self.previous = self.current.replace(CounterSample { value, at });
        true
    }

    /// Difference between the two stored samples, negative on counter reset.
    pub fn delta(&self) -> Option<i64> {
        let (current, previous) = (self.current?, self.previous?);
        let delta = i128::from(current.value) - i128::from(previous.value);
        Some(delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }

    /// Seconds between the two stored samples.
    pub fn elapsed_secs(&self) -> Option<f64> {
        let (current, previous) = (self.current?, self.previous?);
        let micros = (current.at - previous.at).num_microseconds()?;
        Some(micros as f64 / 1e6)
    }

    /// Per-second rate, or 0 until two samples have been recorded.
    ///
    /// A counter reset yields a negative rate; callers decide how to treat it.
    pub fn rate(&self) -> f64 {
        match (self.delta(), self.elapsed_secs()) {
            (Some(delta), Some(elapsed)) if elapsed > 0.0 => {
                round_to(delta as f64 / elapsed, self.precision)
            }
            _ => 0.0,
        }
    }

    /// The most recently accepted sample.
    pub fn current(&self) -> Option<CounterSample> {
        self.current
    }

    /// Forgets both samples.
    pub fn reset(&mut self) {
        self.current = None;
        self.previous = None;
    }
}

// ---------------------------------------------------------------------------
// CPU usage
// ---------------------------------------------------------------------------

/// Converts cumulative used/idle tick counters into a busy fraction.
#[derive(Debug, Clone, Default)]
pub struct CpuUsageTracker {
    used: RateState,
    idle: RateState,
}

impl CpuUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one `/proc/stat` line's used and idle ticks.
    pub fn update(&mut self, used: u64, idle: u64, at: DateTime<Utc>) {
        if self.used.update(used, at) {
            self.idle.update(idle, at);
        }
    }

    /// Ticks elapsed between the last two samples, split into (used, idle).
    pub fn tick_deltas(&self) -> (u64, u64) {
        let clamp = |d: Option<i64>| d.map_or(0, |d| d.max(0) as u64);
        (clamp(self.used.delta()), clamp(self.idle.delta()))
    }

    /// Busy fraction in `[0, 1]`; 0 before the second sample or when no
    /// ticks elapsed.
    pub fn usage(&self) -> f64 {
        let (used, idle) = self.tick_deltas();
        let total = used + idle;
        if total == 0 {
            return 0.0;
        }
        used as f64 / total as f64
    }

    pub fn reset(&mut self) {
        self.used.reset();
        self.idle.reset();
    }
}
