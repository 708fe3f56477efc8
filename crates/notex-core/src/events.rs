//! Change events and the broadcast registry for live note updates.
//!
//! Every committed mutation is described by a [`ChangeEvent`] and fanned out
//! through a [`BroadcastRegistry`] to every currently open subscription. The
//! registry keeps no history: a subscriber only sees events published while
//! it is registered.
//!
//! ## Wire Format (SSE)
//!
//! ```text
//! event: noteChange
//! data: {"type":"updated","note":{"id":5,"name":"X",...},"timestamp":1718000000000}
//! ```
//!
//! ## Delivery model
//!
//! At-most-once, best-effort, ordered per subscriber. Each subscriber owns a
//! bounded queue; `publish` never waits on it. A full queue drops the event
//! for that subscriber only, and a subscriber whose queue has stayed full for
//! longer than the stall timeout is evicted, which ends its stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;

use crate::defaults;
use crate::models::{Note, NoteRef};

// ============================================================================
// Change Event
// ============================================================================

/// A single create/update/delete mutation, as pushed to subscribers.
///
/// Serialized with a lowercase `type` tag, e.g.
/// `{"type":"deleted","note":{"id":7},"timestamp":1718000000000}`.
/// `timestamp` is the emission time in milliseconds since the Unix epoch and
/// is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangeEvent {
    Created { note: Note, timestamp: i64 },
    Updated { note: Note, timestamp: i64 },
    Deleted { note: NoteRef, timestamp: i64 },
}

impl ChangeEvent {
    /// Id of the note this event concerns.
    pub fn note_id(&self) -> i64 {
        match self {
            ChangeEvent::Created { note, .. } | ChangeEvent::Updated { note, .. } => note.id,
            ChangeEvent::Deleted { note, .. } => note.id,
        }
    }

    /// The `type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeEvent::Created { .. } => "created",
            ChangeEvent::Updated { .. } => "updated",
            ChangeEvent::Deleted { .. } => "deleted",
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            ChangeEvent::Created { timestamp, .. }
            | ChangeEvent::Updated { timestamp, .. }
            | ChangeEvent::Deleted { timestamp, .. } => *timestamp,
        }
    }
}

// ============================================================================
// Broadcast Registry
// ============================================================================

/// Identifier assigned to each registered subscriber.
pub type SubscriberId = u64;

/// Outcome of a single [`BroadcastRegistry::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that missed the event because their queue was full.
    pub dropped: usize,
    /// Subscribers removed during this publish (gone or stalled).
    pub evicted: usize,
}

struct Slot {
    tx: mpsc::Sender<Arc<str>>,
    last_delivery: Mutex<Instant>,
}

struct RegistryInner {
    subscribers: Mutex<HashMap<SubscriberId, Arc<Slot>>>,
    next_id: AtomicU64,
    capacity: usize,
    stall_timeout: Duration,
}

/// Process-wide set of live subscribers.
///
/// Constructed once at startup and shared by handle; cloning is cheap and all
/// clones see the same subscriber set.
#[derive(Clone)]
pub struct BroadcastRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for BroadcastRegistry {
    fn default() -> Self {
        Self::new(defaults::SSE_BUFFER, defaults::sse_stall_timeout())
    }
}

impl BroadcastRegistry {
    /// Create a registry with the given per-subscriber queue capacity and
    /// stall timeout. A zero capacity is raised to one.
    pub fn new(capacity: usize, stall_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
                stall_timeout,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, Arc<Slot>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a new subscriber. Dropping the returned [`Subscription`]
    /// unregisters it.
    pub fn register(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let slot = Arc::new(Slot {
            tx,
            last_delivery: Mutex::new(Instant::now()),
        });

        let subscriber_count = {
            let mut subscribers = self.lock();
            subscribers.insert(id, slot);
            subscribers.len()
        };
        tracing::info!(
            subsystem = "events",
            component = "registry",
            op = "register",
            subscriber_id = id,
            subscriber_count,
            "Subscriber registered"
        );

        Subscription {
            id,
            rx,
            registry: self.clone(),
        }
    }

    /// Remove a subscriber. Returns whether it was present; removing an
    /// absent id is a no-op.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let (removed, subscriber_count) = {
            let mut subscribers = self.lock();
            let removed = subscribers.remove(&id).is_some();
            (removed, subscribers.len())
        };
        if removed {
            tracing::info!(
                subsystem = "events",
                component = "registry",
                op = "unregister",
                subscriber_id = id,
                subscriber_count,
                "Subscriber unregistered"
            );
        }
        removed
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Serialize `event` once and enqueue it for every subscriber registered
    /// when the call starts. Never blocks and never fails; per-subscriber
    /// problems are reflected in the returned report.
    pub fn publish(&self, event: &ChangeEvent) -> DeliveryReport {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(
                    subsystem = "events",
                    component = "registry",
                    op = "publish",
                    note_id = event.note_id(),
                    error = %e,
                    "Failed to serialize change event"
                );
                return DeliveryReport::default();
            }
        };
        self.publish_payload(payload, event.kind(), event.note_id())
    }

    fn publish_payload(&self, payload: Arc<str>, kind: &str, note_id: i64) -> DeliveryReport {
        // Snapshot so register/unregister can proceed while we fan out.
        let snapshot: Vec<(SubscriberId, Arc<Slot>)> = self
            .lock()
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect();

        let mut report = DeliveryReport::default();
        let mut evict = Vec::new();
        let now = Instant::now();

        for (id, slot) in snapshot {
            match slot.tx.try_send(Arc::clone(&payload)) {
                Ok(()) => {
                    *slot
                        .last_delivery
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
                    report.delivered += 1;
                }
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    let last = *slot
                        .last_delivery
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    let stalled_for = now.saturating_duration_since(last);
                    tracing::warn!(
                        subsystem = "events",
                        component = "registry",
                        subscriber_id = id,
                        note_id,
                        stalled_ms = stalled_for.as_millis() as u64,
                        "Subscriber queue full, event dropped"
                    );
                    if stalled_for >= self.inner.stall_timeout {
                        evict.push(id);
                    }
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::warn!(
                        subsystem = "events",
                        component = "registry",
                        subscriber_id = id,
                        note_id,
                        "Subscriber gone, evicting"
                    );
                    evict.push(id);
                }
            }
        }

        for id in evict {
            if self.unregister(id) {
                report.evicted += 1;
            }
        }

        tracing::debug!(
            subsystem = "events",
            component = "registry",
            op = "publish",
            event_type = kind,
            note_id,
            delivered = report.delivered,
            dropped = report.dropped,
            evicted = report.evicted,
            "Change event published"
        );
        report
    }
}

/// Receiving side of one registered subscriber.
///
/// Yields serialized [`ChangeEvent`] JSON in publish order. Unregisters itself
/// when dropped.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Arc<str>>,
    registry: BroadcastRegistry,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next payload. `None` once the subscriber has been evicted
    /// and its queue drained.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Take the next payload if one is already queued.
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
