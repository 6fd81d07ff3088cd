//! SSE wire framing
//!
//! Each frame on the notification stream is a discrete, blank-line-delimited
//! text record. A lifecycle event is one `data:` record carrying the event as
//! JSON; keep-alive records are SSE comments (leading `:`) so consumers can
//! filter them without parsing.

use bytes::Bytes;
use std::fmt::Write;

use crate::event::Notification;

/// The periodic no-op record that keeps intermediaries from dropping an idle
/// connection. Never interpreted as a lifecycle event.
pub const KEEP_ALIVE: &str = ": keep-alive\n\n";

/// Encode a `data:` record from already-serialized text.
///
/// Multi-line payloads get one `data:` line per input line, per the SSE
/// specification; the record is terminated by a blank line.
pub fn data_record(payload: &str) -> String {
    let mut output = String::with_capacity(payload.len() + 16);
    for line in payload.lines() {
        writeln!(output, "data: {}", line).unwrap();
    }
    output.push('\n');
    output
}

/// Encode one notification as a complete SSE record.
pub fn event_record(event: &Notification) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(data_record(&json)))
}

/// The keep-alive record as bytes.
pub fn keep_alive_record() -> Bytes {
    Bytes::from_static(KEEP_ALIVE.as_bytes())
}
