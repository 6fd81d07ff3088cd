//! Webhook ingress payload adapters
//!
//! Two body shapes arrive from upstream producers:
//!
//! - the current one, `{ "event": "...", "data": {...}, "timestamp": "..." }`
//! - the legacy one, `{ "delivery": {...}, "action": "..." }`
//!
//! Both are collapsed into a single [`Notification`] at the boundary so that
//! nothing downstream ever sees two code paths.

use serde::Deserialize;
use serde_json::Value;

use crate::event::{now_timestamp, EventKind, Notification};

/// Primary webhook body shape.
#[derive(Debug, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Legacy webhook body shape. `delivery` is required; a body without it is
/// rejected at deserialization time.
#[derive(Debug, Deserialize)]
pub struct LegacyEnvelope {
    pub delivery: Value,
    #[serde(default)]
    pub action: Option<String>,
}

impl WebhookEnvelope {
    /// Map a backend event name onto the console taxonomy.
    ///
    /// Unrecognized or missing event names become a generic status update
    /// ("Notification reçue") rather than an error; the producer may be newer
    /// than this relay.
    pub fn into_notification(self) -> Notification {
        let id = field_text(&self.data, "delivery_id");
        let timestamp = self.timestamp.unwrap_or_else(now_timestamp);

        let (kind, message) = match self.event.as_deref() {
            Some("delivery_created") => (
                EventKind::NewDelivery,
                format!("Nouvelle livraison #{} créée", id),
            ),
            Some("delivery_assigned") => {
                (EventKind::Assignment, format!("Livraison #{} assignée", id))
            }
            Some("delivery_status_changed") => (
                EventKind::StatusUpdate,
                format!(
                    "Statut de la livraison #{} mis à jour: {}",
                    id,
                    field_text(&self.data, "status")
                ),
            ),
            Some("delivery_cancelled") => (
                EventKind::StatusUpdate,
                format!("Livraison #{} annulée", id),
            ),
            _ => (EventKind::StatusUpdate, "Notification reçue".to_string()),
        };

        Notification {
            kind,
            message,
            delivery: self.data,
            timestamp,
        }
    }
}

impl LegacyEnvelope {
    /// Map a legacy `{delivery, action}` body onto the console taxonomy.
    pub fn into_notification(self) -> Notification {
        let id = field_text(&self.delivery, "id");

        let (kind, message) = match self.action.as_deref() {
            Some("created") => {
                let label = match self.delivery.get("description").and_then(Value::as_str) {
                    Some(desc) if !desc.is_empty() => desc.to_string(),
                    _ => format!("Livraison #{}", id),
                };
                (
                    EventKind::NewDelivery,
                    format!("Nouvelle livraison créée: {}", label),
                )
            }
            Some("status_updated") => (
                EventKind::StatusUpdate,
                format!(
                    "Statut mis à jour: {} pour la livraison #{}",
                    field_text(&self.delivery, "statut"),
                    id
                ),
            ),
            Some("assigned") => (
                EventKind::Assignment,
                format!("Livraison #{} assignée à un livreur", id),
            ),
            _ => (
                EventKind::Info,
                format!("Mise à jour pour la livraison #{}", id),
            ),
        };

        Notification {
            kind,
            message,
            delivery: self.delivery,
            timestamp: now_timestamp(),
        }
    }
}

/// Render a payload field as display text, empty when absent. Matches the
/// dashboard's `data?.field ?? ''` rendering.
fn field_text(data: &Value, field: &str) -> String {
    match data.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
