//! # Livry Client
//!
//! The console-side half of the notification relay: maintains a best-effort
//! continuous connection to the server's stream endpoint, parses inbound SSE
//! records, and turns lifecycle events into sound/toast/log side effects,
//! exactly once per event, reconnecting forever after any disconnect.

mod consumer;
mod error;
mod http;
mod notify;
mod parser;

pub use consumer::{Consumer, ConsumerState, StateHandle, StreamConnection, StreamTransport};
pub use error::{ConsumerError, PlaybackRejected};
pub use http::HttpTransport;
pub use notify::{dispatch, NotificationLog, Notifier, Toast};
pub use parser::{Record, RecordParser};
