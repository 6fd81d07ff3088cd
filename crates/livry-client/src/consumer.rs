//! Reconnecting stream consumer
//!
//! An explicit state machine over an abstract transport: Connecting →
//! Connected → ReconnectScheduled → Connecting → … forever, with TornDown
//! reached only by dropping the consumer. The owning view's lifetime is the
//! cancellation token; there is no retry cap and no external signal.
//!
//! Each connection is consumed whole and then discarded; a fresh parser and
//! a fresh connection object are made on every attempt.

use crate::error::ConsumerError;
use crate::notify::{dispatch, NotificationLog, Notifier};
use crate::parser::{Record, RecordParser};
use async_trait::async_trait;
use bytes::Bytes;
use livry_core::{ConsumerConfig, Notification};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One live connection to the notification stream.
#[async_trait]
pub trait StreamConnection: Send {
    /// The next chunk of bytes; `Ok(None)` on orderly end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, ConsumerError>;
}

/// Factory for stream connections. Implemented over HTTP in production and
/// by scripted in-memory transports in tests.
#[async_trait]
pub trait StreamTransport: Send {
    type Connection: StreamConnection;

    /// Open a fresh connection. Called once per attempt; previous
    /// connections are never reused.
    async fn connect(&mut self) -> Result<Self::Connection, ConsumerError>;
}

/// Where the consumer currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Connecting,
    Connected,
    ReconnectScheduled,
    TornDown,
}

/// Shared, read-only view of the consumer's state.
#[derive(Debug, Clone)]
pub struct StateHandle(Arc<Mutex<ConsumerState>>);

impl StateHandle {
    pub fn get(&self) -> ConsumerState {
        *self.0.lock().unwrap()
    }
}

/// The stream consumer. Build it, keep handles to the log and state, then
/// hand `run()` to a task owned by the view; aborting that task is teardown.
pub struct Consumer<T, N> {
    transport: T,
    notifier: N,
    config: ConsumerConfig,
    log: NotificationLog,
    state: Arc<Mutex<ConsumerState>>,
}

impl<T, N> Consumer<T, N>
where
    T: StreamTransport,
    N: Notifier,
{
    pub fn new(transport: T, notifier: N) -> Self {
        Self {
            transport,
            notifier,
            config: ConsumerConfig::default(),
            log: NotificationLog::new(),
            state: Arc::new(Mutex::new(ConsumerState::Connecting)),
        }
    }

    /// Override the reconnect timing.
    pub fn with_config(mut self, config: ConsumerConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle to the append-only notification log.
    pub fn log(&self) -> NotificationLog {
        self.log.clone()
    }

    /// Handle observing the consumer's lifecycle state.
    pub fn state_handle(&self) -> StateHandle {
        StateHandle(self.state.clone())
    }

    fn set_state(&self, state: ConsumerState) {
        *self.state.lock().unwrap() = state;
    }

    /// Maintain the connection until torn down. Never returns; dropping the
    /// future (view closed) is the only way out and cancels any pending
    /// reconnect with it.
    pub async fn run(mut self) {
        loop {
            self.set_state(ConsumerState::Connecting);
            match self.transport.connect().await {
                Ok(conn) => {
                    self.set_state(ConsumerState::Connected);
                    debug!("Notification stream open");
                    self.drive(conn).await;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to open notification stream");
                }
            }

            self.set_state(ConsumerState::ReconnectScheduled);
            debug!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Reconnecting after delay"
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Consume one connection until it ends or breaks.
    async fn drive(&mut self, mut conn: T::Connection) {
        let mut parser = RecordParser::new();
        loop {
            match conn.next_chunk().await {
                Ok(Some(chunk)) => {
                    for record in parser.push(&chunk) {
                        self.handle_record(record);
                    }
                }
                Ok(None) => {
                    debug!("Notification stream closed by server");
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "Notification stream lost");
                    return;
                }
            }
        }
    }

    /// One record: keep-alives are ignored, malformed payloads are discarded
    /// without closing the connection, events are logged then dispatched.
    fn handle_record(&mut self, record: Record) {
        let Record::Data(payload) = record else {
            return;
        };
        match serde_json::from_str::<Notification>(&payload) {
            Ok(event) => {
                self.log.append(event.clone());
                dispatch(&self.notifier, &event);
            }
            Err(err) => {
                warn!(error = %err, "Discarding malformed notification record");
            }
        }
    }
}

impl<T, N> Drop for Consumer<T, N> {
    fn drop(&mut self) {
        *self.state.lock().unwrap() = ConsumerState::TornDown;
        debug!("Notification consumer torn down");
    }
}
