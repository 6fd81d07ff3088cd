//! # Livry Core
//!
//! Core types for the Livry notification relay: the delivery lifecycle event
//! taxonomy, the webhook ingress adapters, the SSE frame codec, and the
//! broadcast hub that fans events out to open admin streams.

mod config;
mod error;
pub mod event;
pub mod frame;
mod hub;
pub mod ingress;

// Public API
pub use config::{ConsumerConfig, RelayConfig};
pub use error::{ApiError, Result};
pub use event::{EventKind, Notification};
pub use hub::{Hub, SubscriberId};
