//! Observability Event Channel
//!
//! One event per handled KMS request, published before any crypto work so a
//! test can assert the call happened regardless of its outcome. Delivery is
//! synchronous and in-process; with no listener attached the event is dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KmsEventKind {
    DecryptCallback,
    SignCallback,
    MasterSignCallback,
}

impl KmsEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            KmsEventKind::DecryptCallback => "decryptCallback",
            KmsEventKind::SignCallback => "signCallback",
            KmsEventKind::MasterSignCallback => "masterSignCallback",
        }
    }
}

impl fmt::Display for KmsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A KMS request as received, before it was acted on
#[derive(Debug, Clone, Serialize)]
pub struct KmsEvent {
    pub kind: KmsEventKind,
    pub request_id: Uuid,
    /// The request body exactly as the caller sent it
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl KmsEvent {
    pub fn new(kind: KmsEventKind, payload: Value) -> Self {
        Self {
            kind,
            request_id: Uuid::new_v4(),
            payload,
            received_at: Utc::now(),
        }
    }
}

/// Handle returned by [`KmsEvents::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&KmsEvent) + Send + Sync>;

struct Registration {
    id: ListenerId,
    kind: KmsEventKind,
    listener: Listener,
}

/// Listener registry injected into the HTTP layer
pub struct KmsEvents {
    next_id: AtomicU64,
    registrations: Mutex<Vec<Registration>>,
}

impl Default for KmsEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KmsEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KmsEvents")
            .field("listeners", &self.lock().len())
            .finish()
    }
}

impl KmsEvents {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Attach `listener` to one event kind
    pub fn subscribe<F>(&self, kind: KmsEventKind, listener: F) -> ListenerId
    where
        F: Fn(&KmsEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Registration {
            id,
            kind,
            listener: Arc::new(listener),
        });
        id
    }

    /// Detach a listener; returns false if it was not attached
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut registrations = self.lock();
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        registrations.len() != before
    }

    /// Detach every listener
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn listener_count(&self, kind: KmsEventKind) -> usize {
        self.lock()
            .iter()
            .filter(|registration| registration.kind == kind)
            .count()
    }

    /// Deliver `event` to every listener of its kind, in subscription order.
    ///
    /// Listeners run outside the registry lock so they may subscribe or
    /// unsubscribe. Returns how many listeners were called.
    pub fn publish(&self, event: &KmsEvent) -> usize {
        let listeners: Vec<Listener> = self
            .lock()
            .iter()
            .filter(|registration| registration.kind == event.kind)
            .map(|registration| Arc::clone(&registration.listener))
            .collect();

        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collector(events: &KmsEvents, kind: KmsEventKind) -> (ListenerId, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = events.subscribe(kind, move |event| {
            sink.lock().unwrap().push(event.payload.clone());
        });
        (id, seen)
    }

    #[test]
    fn test_publish_reaches_matching_kind_only() {
        let events = KmsEvents::new();
        let (_, signs) = collector(&events, KmsEventKind::SignCallback);
        let (_, decrypts) = collector(&events, KmsEventKind::DecryptCallback);

        let delivered = events.publish(&KmsEvent::new(KmsEventKind::SignCallback, json!({"node_id": "rp1"})));

        assert_eq!(delivered, 1);
        assert_eq!(signs.lock().unwrap().as_slice(), &[json!({"node_id": "rp1"})]);
        assert!(decrypts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let events = KmsEvents::new();
        let (id, seen) = collector(&events, KmsEventKind::MasterSignCallback);

        assert!(events.unsubscribe(id));
        assert!(!events.unsubscribe(id));
        assert_eq!(events.listener_count(KmsEventKind::MasterSignCallback), 0);

        let delivered = events.publish(&KmsEvent::new(KmsEventKind::MasterSignCallback, Value::Null));
        assert_eq!(delivered, 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_listener_may_unsubscribe_itself() {
        let events = Arc::new(KmsEvents::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let registry = Arc::clone(&events);
        let own_id = Arc::clone(&slot);
        let id = events.subscribe(KmsEventKind::SignCallback, move |_| {
            if let Some(id) = own_id.lock().unwrap().take() {
                registry.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        assert_eq!(events.publish(&KmsEvent::new(KmsEventKind::SignCallback, Value::Null)), 1);
        assert_eq!(events.publish(&KmsEvent::new(KmsEventKind::SignCallback, Value::Null)), 0);
    }

    #[test]
    fn test_event_kind_wire_names() {
        assert_eq!(KmsEventKind::DecryptCallback.to_string(), "decryptCallback");
        assert_eq!(
            serde_json::to_string(&KmsEventKind::MasterSignCallback).unwrap(),
            "\"masterSignCallback\""
        );
    }
}
