//! Notification boundary
//!
//! Publish/subscribe bus keyed by event kind. Observers are plain callbacks
//! invoked synchronously on the emitting thread, in emission order.

use crate::daemon::log::LogEntry;
use crate::daemon::DaemonState;
use parking_lot::{ReentrantMutex, RwLock};
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Event kinds emitted by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DaemonStatusChanged,
    LogUpdated,
    TrackingSetChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::DaemonStatusChanged,
        EventKind::LogUpdated,
        EventKind::TrackingSetChanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::DaemonStatusChanged => "daemon_status_changed",
            EventKind::LogUpdated => "log_updated",
            EventKind::TrackingSetChanged => "tracking_set_changed",
        }
    }
}

/// Event payloads
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProofEvent {
    DaemonStatusChanged { state: DaemonState },
    LogUpdated { entry: LogEntry },
    TrackingSetChanged { path: PathBuf, tracked: bool },
}

impl ProofEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ProofEvent::DaemonStatusChanged { .. } => EventKind::DaemonStatusChanged,
            ProofEvent::LogUpdated { .. } => EventKind::LogUpdated,
            ProofEvent::TrackingSetChanged { .. } => EventKind::TrackingSetChanged,
        }
    }
}

pub type Observer = Arc<dyn Fn(&ProofEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<(SubscriptionId, Observer)>>>,
    // Reentrant so an observer may call back into the core on the same thread.
    emit_lock: ReentrantMutex<()>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, observer: F) -> SubscriptionId
    where
        F: Fn(&ProofEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let mut removed = false;
        for list in subscribers.values_mut() {
            let before = list.len();
            list.retain(|(existing, _)| *existing != id);
            removed |= list.len() != before;
        }
        removed
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every observer of its kind
    ///
    /// Emissions are serialized, so all observers see events in the same
    /// order. A panicking observer is logged and skipped.
    pub fn emit(&self, event: ProofEvent) {
        self.emit_with(|| vec![event]);
    }

    /// Run `produce` and deliver its events inside one emission
    ///
    /// Whatever `produce` mutates happens in the same order its events reach
    /// observers. `produce` must not block on a lock held by an observer.
    pub fn emit_with<F>(&self, produce: F)
    where
        F: FnOnce() -> Vec<ProofEvent>,
    {
        let _ordered = self.emit_lock.lock();
        for event in produce() {
            self.deliver(&event);
        }
    }

    fn deliver(&self, event: &ProofEvent) {
        let observers: Vec<Observer> = match self.subscribers.read().get(&event.kind()) {
            Some(list) => list.iter().map(|(_, o)| Arc::clone(o)).collect(),
            None => return,
        };
        for observer in observers {
            if catch_unwind(AssertUnwindSafe(|| observer(event))).is_err() {
                warn!(kind = event.kind().as_str(), "Event observer panicked");
            }
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.read();
        f.debug_struct("EventBus")
            .field(
                "subscribers",
                &subscribers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.len()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
