//! Periodic sampling loops.
//!
//! Each loop is one tokio task that runs its tick, then sleeps for the
//! interval (fixed delay), so a tick never overlaps the previous tick of the
//! same loop. Loops are independent: a slow or panicking tick delays only its
//! own loop.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The three sampling loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    /// CPU, memory, network, disk and battery.
    Summary,
    /// Processes and sensors.
    Details,
    /// Mounted filesystems.
    Filesystem,
}

impl LoopKind {
    pub const ALL: [LoopKind; 3] = [LoopKind::Summary, LoopKind::Details, LoopKind::Filesystem];

    pub fn name(self) -> &'static str {
        match self {
            LoopKind::Summary => "summary",
            LoopKind::Details => "details",
            LoopKind::Filesystem => "filesystem",
        }
    }

    fn index(self) -> usize {
        match self {
            LoopKind::Summary => 0,
            LoopKind::Details => 1,
            LoopKind::Filesystem => 2,
        }
    }
}

// ============================================================
// Single loop
// ============================================================

/// A stoppable fixed-delay loop.
#[derive(Debug)]
pub struct PeriodicLoop {
    kind: LoopKind,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicLoop {
    pub fn new(kind: LoopKind) -> Self {
        Self { kind, handle: None }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawns the loop on the current tokio runtime. The first tick runs
    /// immediately. Returns false, doing nothing, if already running.
    pub fn start<F, Fut>(&mut self, interval: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return false;
        }

        let kind = self.kind;
        info!(
            loop_kind = kind.name(),
            interval_ms = interval.as_millis() as u64,
            "starting loop"
        );
        self.handle = Some(tokio::spawn(async move {
            loop {
                let t0 = Instant::now();
                if let Err(panic) = AssertUnwindSafe(tick()).catch_unwind().await {
                    error!(
                        loop_kind = kind.name(),
                        panic = panic_message(panic.as_ref()),
                        "tick panicked"
                    );
                }

                let elapsed = t0.elapsed();
                if elapsed > interval {
                    warn!(
                        loop_kind = kind.name(),
                        duration_ms = elapsed.as_millis() as u64,
                        interval_ms = interval.as_millis() as u64,
                        "tick exceeded interval"
                    );
                } else {
                    debug!(
                        loop_kind = kind.name(),
                        duration_ms = elapsed.as_millis() as u64,
                        "tick completed"
                    );
                }

                tokio::time::sleep(interval).await;
            }
        }));
        true
    }

    /// Cancels the pending sleep or the in-flight tick. Returns false if the
    /// loop was not running.
    pub fn stop(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        handle.abort();
        info!(loop_kind = self.kind.name(), "stopped loop");
        true
    }
}

impl Drop for PeriodicLoop {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

// ============================================================
// All loops
// ============================================================

/// Owns one [`PeriodicLoop`] per [`LoopKind`].
#[derive(Debug)]
pub struct Scheduler {
    loops: [PeriodicLoop; 3],
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            loops: LoopKind::ALL.map(PeriodicLoop::new),
        }
    }

    pub fn start<F, Fut>(&mut self, kind: LoopKind, interval: Duration, tick: F) -> bool
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.loops[kind.index()].start(interval, tick)
    }

    pub fn stop(&mut self, kind: LoopKind) -> bool {
        self.loops[kind.index()].stop()
    }

    pub fn stop_all(&mut self) {
        for l in &mut self.loops {
            l.stop();
        }
    }

    pub fn is_running(&self, kind: LoopKind) -> bool {
        self.loops[kind.index()].is_running()
    }

    pub fn any_running(&self) -> bool {
        self.loops.iter().any(PeriodicLoop::is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_tick(count: &Arc<AtomicUsize>) -> impl FnMut() -> futures_util::future::Ready<()> + Send + 'static {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            futures_util::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut l = PeriodicLoop::new(LoopKind::Summary);
        assert!(l.start(Duration::from_secs(1), counting_tick(&count)));

        // Ticks at 0s, 1s, 2s and 3s.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert!(l.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_noop() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut l = PeriodicLoop::new(LoopKind::Details);
        assert!(l.start(Duration::from_secs(5), counting_tick(&count)));
        assert!(!l.start(Duration::from_secs(5), counting_tick(&count)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_pending_tick() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut l = PeriodicLoop::new(LoopKind::Filesystem);
        l.start(Duration::from_secs(1), counting_tick(&count));
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(l.stop());
        assert!(!l.stop());
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!l.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_tick_keeps_loop_alive() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut l = PeriodicLoop::new(LoopKind::Summary);
        l.start(Duration::from_secs(1), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    panic!("first tick fails");
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(l.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_loops_are_independent() {
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));
        let mut scheduler = Scheduler::new();
        scheduler.start(LoopKind::Summary, Duration::from_secs(1), counting_tick(&fast));
        scheduler.start(LoopKind::Filesystem, Duration::from_secs(60), counting_tick(&slow));

        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(fast.load(Ordering::SeqCst), 5);
        assert_eq!(slow.load(Ordering::SeqCst), 1);

        scheduler.stop(LoopKind::Summary);
        assert!(!scheduler.is_running(LoopKind::Summary));
        assert!(scheduler.is_running(LoopKind::Filesystem));
        assert!(scheduler.any_running());

        scheduler.stop_all();
        assert!(!scheduler.any_running());
    }
}
