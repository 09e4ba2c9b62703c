//! Per-property change subscriptions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::vitals::state::Property;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`Notifier::connect`], used to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    property: Property,
    callback: Callback,
}

/// Invokes subscriber callbacks, without arguments, when a property changes.
#[derive(Default)]
pub struct Notifier {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(
        &self,
        property: Property,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Subscription {
            id,
            property,
            callback: Arc::new(callback),
        });
        id
    }

    /// Returns false if `id` was not connected.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    pub fn subscriber_count(&self, property: Property) -> usize {
        self.lock().iter().filter(|s| s.property == property).count()
    }

    /// Calls every subscriber of each changed property once per property.
    ///
    /// Callbacks run after the subscription lock is released, so they may
    /// connect, disconnect or read values.
    pub fn notify(&self, changed: &[Property]) {
        if changed.is_empty() {
            return;
        }
        let callbacks: Vec<(Property, Callback)> = {
            let subscriptions = self.lock();
            changed
                .iter()
                .flat_map(|&property| {
                    subscriptions
                        .iter()
                        .filter(move |s| s.property == property)
                        .map(move |s| (property, Arc::clone(&s.callback)))
                })
                .collect()
        };

        for (property, callback) in callbacks {
            tracing::trace!(property = property.name(), "notify");
            callback();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter(notifier: &Notifier, property: Property) -> (Arc<AtomicUsize>, SubscriptionId) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = notifier.connect(property, move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, id)
    }

    #[test]
    fn test_notifies_only_changed_properties() {
        let notifier = Notifier::new();
        let (cpu, _) = counter(&notifier, Property::CpuUsage);
        let (mem, _) = counter(&notifier, Property::MemUsage);

        notifier.notify(&[Property::CpuUsage]);
        assert_eq!(cpu.load(Ordering::SeqCst), 1);
        assert_eq!(mem.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disconnect() {
        let notifier = Notifier::new();
        let (count, id) = counter(&notifier, Property::NetRecv);
        assert_eq!(notifier.subscriber_count(Property::NetRecv), 1);

        assert!(notifier.disconnect(id));
        assert!(!notifier.disconnect(id));
        notifier.notify(&[Property::NetRecv]);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_callback_may_disconnect_itself() {
        let notifier = Arc::new(Notifier::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let n = Arc::clone(&notifier);
        let s = Arc::clone(&slot);
        let id = notifier.connect(Property::Uptime, move || {
            if let Some(id) = *s.lock().unwrap() {
                n.disconnect(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        notifier.notify(&[Property::Uptime]);
        assert_eq!(notifier.subscriber_count(Property::Uptime), 0);
    }
}
