//! # Livry Server
//!
//! The relay's HTTP surface: a webhook ingress that accepts delivery
//! lifecycle events from the dispatch backend and an SSE endpoint that fans
//! them out to every open admin console.

mod health;
mod ingress;
pub mod response;
mod server;
mod stream;

pub use server::RelayServer;
