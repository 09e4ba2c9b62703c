//! Monitor groups and the cycle that drives them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::monitor::{Monitor, RefreshContext};
use crate::scheduler::LoopKind;
use crate::settings::Settings;
use crate::vitals::notify::Notifier;
use crate::vitals::state::VitalsState;

/// The monitors one loop refreshes, in refresh order.
struct MonitorGroup {
    monitors: tokio::sync::Mutex<Vec<Box<dyn Monitor>>>,
    /// Set by `stop`; the next cycle destroys every monitor first.
    reset: AtomicBool,
}

impl MonitorGroup {
    fn new(monitors: Vec<Box<dyn Monitor>>) -> Self {
        Self {
            monitors: tokio::sync::Mutex::new(monitors),
            reset: AtomicBool::new(false),
        }
    }
}

/// Shared by the facade and every loop task.
///
/// Monitor groups live here rather than in the loop tasks so that tracker
/// state survives a loop restart. The async group lock keeps a manual refresh
/// from overlapping a scheduled tick of the same loop.
pub(crate) struct Engine {
    settings: RwLock<Settings>,
    state: Mutex<VitalsState>,
    notifier: Notifier,
    groups: [MonitorGroup; 3],
}

impl Engine {
    pub(crate) fn new(
        settings: Settings,
        state: VitalsState,
        summary: Vec<Box<dyn Monitor>>,
        details: Vec<Box<dyn Monitor>>,
        filesystem: Vec<Box<dyn Monitor>>,
    ) -> Self {
        Self {
            settings: RwLock::new(settings),
            state: Mutex::new(state),
            notifier: Notifier::new(),
            groups: [
                MonitorGroup::new(summary),
                MonitorGroup::new(details),
                MonitorGroup::new(filesystem),
            ],
        }
    }

    fn group(&self, kind: LoopKind) -> &MonitorGroup {
        match kind {
            LoopKind::Summary => &self.groups[0],
            LoopKind::Details => &self.groups[1],
            LoopKind::Filesystem => &self.groups[2],
        }
    }

    pub(crate) fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores `settings`, returning the previous ones.
    pub(crate) fn replace_settings(&self, settings: Settings) -> Settings {
        let mut current = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, settings)
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, VitalsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Makes the next cycle of every loop start from empty trackers.
    pub(crate) fn request_reset(&self) {
        for group in &self.groups {
            group.reset.store(true, Ordering::SeqCst);
        }
    }

    /// Refreshes every enabled monitor of `kind`, then notifies subscribers
    /// of the properties that changed.
    ///
    /// A failing monitor is logged and skipped; the others still refresh.
    pub(crate) async fn run_cycle(&self, kind: LoopKind, now: DateTime<Utc>) {
        let group = self.group(kind);
        let mut monitors = group.monitors.lock().await;
        let settings = self.settings();

        if group.reset.swap(false, Ordering::SeqCst) {
            debug!(loop_kind = kind.name(), "resetting monitors");
            for monitor in monitors.iter_mut() {
                monitor.destroy();
            }
        }

        let ctx = RefreshContext {
            settings: &settings,
            now,
            state: &self.state,
        };
        for monitor in monitors.iter_mut() {
            if !monitor.enabled(&settings) {
                monitor.destroy();
                ctx.publish(|state| monitor.withdraw(state));
                continue;
            }
            if let Err(e) = monitor.refresh(&ctx).await {
                warn!(
                    loop_kind = kind.name(),
                    monitor = monitor.name(),
                    error = %e,
                    "refresh failed"
                );
            }
        }
        drop(monitors);

        let changed = self.state().take_pending();
        debug!(
            loop_kind = kind.name(),
            changed = changed.len(),
            "cycle completed"
        );
        self.notifier.notify(&changed);
    }
}
