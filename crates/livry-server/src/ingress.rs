//! Webhook ingress handlers
//!
//! The trusted upstream producer posts one lifecycle event per request. Both
//! body shapes are adapted into [`livry_core::Notification`] and handed to the
//! hub; fan-out failures never reach the producer, which only ever sees a 400
//! for a body it must fix itself.

use crate::response::{self, Response};
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use livry_core::ingress::{LegacyEnvelope, WebhookEnvelope};
use livry_core::{ApiError, Hub, Result};
use serde::de::DeserializeOwned;
use tracing::info;

const OK_BODY: &str = r#"{"ok":true}"#;

/// `POST /api/webhooks/delivery`, the primary ingress.
pub async fn webhook_delivery(hub: &Hub, req: hyper::Request<Incoming>) -> Result<Response> {
    let envelope: WebhookEnvelope = read_json(req).await?;
    let event = envelope.into_notification();
    let delivered = hub.publish(&event);
    info!(kind = ?event.kind, delivered, "Webhook event broadcast");
    Ok(response::json(StatusCode::OK, OK_BODY))
}

/// `POST /api/webhook/deliveries`, the legacy ingress.
pub async fn legacy_webhook(hub: &Hub, req: hyper::Request<Incoming>) -> Result<Response> {
    let envelope: LegacyEnvelope = read_json(req).await?;
    let event = envelope.into_notification();
    let delivered = hub.publish(&event);
    info!(kind = ?event.kind, delivered, "Legacy webhook event broadcast");
    Ok(response::json(StatusCode::OK, OK_BODY))
}

/// Buffer the request body and parse it as JSON. Malformed bodies are a 400;
/// nothing is broadcast for them.
async fn read_json<T: DeserializeOwned>(req: hyper::Request<Incoming>) -> Result<T> {
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|err| ApiError::internal(format!("Failed to read request body: {}", err)))?
        .to_bytes();
    serde_json::from_slice(&body).map_err(ApiError::from)
}
