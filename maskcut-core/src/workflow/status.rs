//! Bounded, ordered status broadcast log
//!
//! A fixed-capacity ring retains the most recent lifecycle events for
//! snapshot consumers (health/status endpoints); registered listeners are
//! notified synchronously, in registration order, so every listener sees
//! event N before any listener sees event N+1.

use crate::models::MaskingStatusEvent;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Default number of retained status events.
pub const DEFAULT_STATUS_CAPACITY: usize = 50;

struct RingInner {
    events: VecDeque<MaskingStatusEvent>,
    evictions: u64,
}

/// Fixed-capacity ring of status events with oldest-first eviction.
/// Push and snapshot share one lock, so a snapshot taken concurrently with
/// a publish (a health endpoint polling while the worker runs) always sees
/// a consistent, publish-ordered window.
struct StatusRing {
    capacity: usize,
    inner: Mutex<RingInner>,
}

impl StatusRing {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(RingInner {
                events: VecDeque::with_capacity(capacity),
                evictions: 0,
            }),
        }
    }

    /// Append, evicting the oldest event once full.
    fn push(&self, event: MaskingStatusEvent) {
        let mut inner = self.inner.lock().expect("status ring poisoned");
        if inner.events.len() >= self.capacity && inner.events.pop_front().is_some() {
            inner.evictions += 1;
        }
        inner.events.push_back(event);
    }

    /// Ordered copy of the retained events.
    fn snapshot(&self) -> Vec<MaskingStatusEvent> {
        let inner = self.inner.lock().expect("status ring poisoned");
        inner.events.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.inner.lock().expect("status ring poisoned").events.len()
    }

    fn evictions(&self) -> u64 {
        self.inner.lock().expect("status ring poisoned").evictions
    }
}

type StatusListener = Arc<dyn Fn(&MaskingStatusEvent) + Send + Sync>;

/// Registry of status listeners preserving registration order.
#[derive(Default)]
pub(crate) struct StatusListeners {
    entries: Mutex<Vec<(u64, StatusListener)>>,
    next_id: AtomicU64,
}

impl StatusListeners {
    pub(crate) fn add(self: &Arc<Self>, listener: StatusListener) -> StatusSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .lock()
            .expect("listener registry poisoned")
            .push((id, listener));
        StatusSubscription {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Callbacks run outside the registry lock, so a listener may re-enter
    /// `on_status`, `unsubscribe`, or `publish` without deadlocking.
    /// Listeners added mid-notification first see the next event.
    pub(crate) fn notify(&self, event: &MaskingStatusEvent) {
        let snapshot: Vec<StatusListener> = {
            let entries = self.entries.lock().expect("listener registry poisoned");
            entries.iter().map(|(_, listener)| listener.clone()).collect()
        };
        for listener in snapshot {
            listener(event);
        }
    }

    fn remove(&self, id: u64) {
        let mut entries = self.entries.lock().expect("listener registry poisoned");
        entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Handle returned by `on_status`; detaches its listener on `unsubscribe`.
pub struct StatusSubscription {
    id: u64,
    registry: std::sync::Weak<StatusListeners>,
}

impl StatusSubscription {
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

/// Bounded publish/subscribe log of masking lifecycle events.
pub struct StatusBroadcaster {
    ring: StatusRing,
    listeners: Arc<StatusListeners>,
}

impl StatusBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: StatusRing::new(capacity),
            listeners: Arc::new(StatusListeners::default()),
        }
    }

    /// Append the event and notify every listener before returning.
    pub fn publish(&self, event: MaskingStatusEvent) {
        self.ring.push(event.clone());
        self.listeners.notify(&event);
    }

    /// Independent, ordered copy of the retained events.
    pub fn snapshot(&self) -> Vec<MaskingStatusEvent> {
        self.ring.snapshot()
    }

    /// Register a listener; events arrive synchronously from `publish`.
    pub fn on_status(
        &self,
        listener: impl Fn(&MaskingStatusEvent) + Send + Sync + 'static,
    ) -> StatusSubscription {
        self.listeners.add(Arc::new(listener))
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.len() == 0
    }

    /// Total events dropped to honor the capacity bound.
    pub fn eviction_count(&self) -> u64 {
        self.ring.evictions()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MaskingJobState;

    fn event(job: usize) -> MaskingStatusEvent {
        MaskingStatusEvent::new(format!("job-{job}"), MaskingJobState::Queued)
    }

    #[test]
    fn test_ring_evicts_oldest_first() {
        let broadcaster = StatusBroadcaster::new(3);
        for i in 0..5 {
            broadcaster.publish(event(i));
        }

        assert_eq!(broadcaster.len(), 3);
        assert_eq!(broadcaster.eviction_count(), 2);

        let ids: Vec<String> = broadcaster
            .snapshot()
            .into_iter()
            .map(|e| e.job_id)
            .collect();
        assert_eq!(ids, vec!["job-2", "job-3", "job-4"]);
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let broadcaster = StatusBroadcaster::new(10);
        broadcaster.publish(event(0));

        let before = broadcaster.snapshot();
        broadcaster.publish(event(1));

        assert_eq!(before.len(), 1);
        assert_eq!(broadcaster.snapshot().len(), 2);
    }

    #[test]
    fn test_listeners_notified_in_registration_order() {
        let broadcaster = StatusBroadcaster::new(10);
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            broadcaster.on_status(move |_| order.lock().unwrap().push(tag));
        }

        broadcaster.publish(event(0));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_listener_may_reenter_registry_from_callback() {
        let broadcaster = Arc::new(StatusBroadcaster::new(8));
        let late_seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        // Registers a second listener from inside the callback; must not
        // deadlock on the registry.
        {
            let weak = Arc::downgrade(&broadcaster);
            let late_seen = late_seen.clone();
            broadcaster.on_status(move |_| {
                if let Some(broadcaster) = weak.upgrade() {
                    let late_seen = late_seen.clone();
                    broadcaster.on_status(move |event| {
                        late_seen.lock().unwrap().push(event.job_id.clone());
                    });
                }
            });
        }

        broadcaster.publish(event(0));
        broadcaster.publish(event(1));

        // The listener added during event 0 sees event 1; the one added
        // during event 1 has seen nothing yet.
        assert_eq!(*late_seen.lock().unwrap(), vec!["job-1".to_string()]);
    }

    #[test]
    fn test_unsubscribe_detaches_listener() {
        let broadcaster = StatusBroadcaster::new(10);
        let count = Arc::new(AtomicU64::new(0));

        let subscription = {
            let count = count.clone();
            broadcaster.on_status(move |_| {
                count.fetch_add(1, Ordering::Relaxed);
            })
        };

        broadcaster.publish(event(0));
        subscription.unsubscribe();
        broadcaster.publish(event(1));

        assert_eq!(count.load(Ordering::Relaxed), 1);
    }
}
