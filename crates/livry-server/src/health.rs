//! Health endpoint
//!
//! Consumed by the dashboard's health check; the subscriber count doubles as
//! a cheap operational signal for how many consoles are watching.

use crate::response::{self, Response};
use http::StatusCode;
use livry_core::Hub;

/// `GET /health`
pub fn health(hub: &Hub) -> Response {
    let body = serde_json::json!({
        "status": "ok",
        "subscribers": hub.subscriber_count(),
    });
    response::json(StatusCode::OK, body.to_string())
}
