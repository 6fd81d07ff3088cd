//! Broadcast hub
//!
//! The process-wide registry of open notification streams. Constructed once
//! at startup and injected (`Arc<Hub>`) into both the webhook ingress and the
//! stream-open handler; nothing else mutates the subscriber set.
//!
//! Fan-out is fire-and-forget: each subscriber is a bounded channel sender
//! and `publish` uses `try_send`, so a slow or dead subscriber can never
//! stall delivery to the others; it is simply dropped from the set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::event::Notification;
use crate::frame;

/// Identifier the hub issues for one open stream connection.
pub type SubscriberId = u64;

/// The broadcast registry. Cheap to share behind an `Arc`.
pub struct Hub {
    // Mutations never await while holding the lock, so iterate-and-remove
    // stays one uninterrupted step even on a multi-threaded runtime.
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Bytes>>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a subscriber and return its id.
    pub fn register(&self, sender: mpsc::Sender<Bytes>) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().unwrap().insert(id, sender);
        debug!(subscriber = id, "Stream subscriber registered");
        id
    }

    /// Remove a subscriber. No-op if it is already gone.
    pub fn unregister(&self, id: SubscriberId) {
        if self.subscribers.lock().unwrap().remove(&id).is_some() {
            debug!(subscriber = id, "Stream subscriber removed");
        }
    }

    /// Fan one event out to every current subscriber.
    ///
    /// The event is serialized once; each subscriber gets the same shared
    /// record. A failed push (channel closed or full) removes only that
    /// subscriber; publish always completes and never reports an error to
    /// the ingress caller. Returns the number of subscribers reached.
    pub fn publish(&self, event: &Notification) -> usize {
        let record = match frame::event_record(event) {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, "Failed to encode notification, dropping it");
                return 0;
            }
        };

        let mut subscribers = self.subscribers.lock().unwrap();
        let mut dead = Vec::new();
        let mut delivered = 0;

        for (&id, sender) in subscribers.iter() {
            match sender.try_send(record.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    debug!(subscriber = id, error = %err, "Push failed, dropping subscriber");
                    dead.push(id);
                }
            }
        }
        for id in dead {
            subscribers.remove(&id);
        }

        delivered
    }

    /// Number of currently open subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
