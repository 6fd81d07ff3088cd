//! Delivery lifecycle events
//!
//! A [`Notification`] is one state transition of a delivery, broadcast to
//! every connected admin console. Kind, message and timestamp are fixed at
//! ingress and never mutated afterwards; the `delivery` payload is an opaque
//! snapshot owned by the dispatch backend and carried through verbatim.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of a lifecycle event, carried on the wire in the `type` field.
///
/// The taxonomy is open-ended: kinds this build does not know about
/// deserialize to [`EventKind::Unknown`] so that consumers keep working when
/// the producer is newer than they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A delivery was created.
    NewDelivery,
    /// A delivery changed status (including cancellation).
    StatusUpdate,
    /// A delivery was assigned to a courier.
    Assignment,
    /// Generic update with no dedicated treatment on the console.
    Info,
    /// Greeting frame emitted once when a stream connection opens.
    Connected,
    /// Any kind this build does not recognize.
    #[serde(other)]
    Unknown,
}

/// One delivery lifecycle notification.
///
/// Serialized atomically as a single JSON object; the wire field names
/// (`type`, `message`, `delivery`, `timestamp`) are what the admin dashboard
/// expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Event kind, rendered as the `type` field.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Human-readable message, rendered verbatim by the console.
    pub message: String,
    /// Opaque delivery snapshot. Passthrough only, never inspected for
    /// control flow.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub delivery: Value,
    /// ISO-8601 creation time, assigned once at ingress.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub timestamp: String,
}

impl Notification {
    /// Create a notification with the given kind and message, stamped now.
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            delivery: Value::Null,
            timestamp: now_timestamp(),
        }
    }

    /// Attach the delivery snapshot.
    pub fn with_delivery(mut self, delivery: Value) -> Self {
        self.delivery = delivery;
        self
    }

    /// Override the ingress timestamp (used when the producer supplies one).
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// The greeting sent once per stream connection. Not a lifecycle event;
    /// consumers log it but trigger no side effects.
    pub fn connected() -> Self {
        Self {
            kind: EventKind::Connected,
            message: "stream connected".to_string(),
            delivery: Value::Null,
            timestamp: String::new(),
        }
    }
}

/// Current time as an ISO-8601 string, e.g. `2024-01-01T10:00:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
