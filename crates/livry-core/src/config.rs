//! Relay timing and capacity configuration
//!
//! The production dashboard hard-coded these values (15 s keep-alive, 5 s
//! reconnect); here they are parameters with those defaults.

use std::time::Duration;

/// Server-side configuration for the notification relay.
#[derive(Debug, Clone, Copy)]
pub struct RelayConfig {
    /// Interval between keep-alive comment frames on an open stream.
    pub keep_alive_interval: Duration,
    /// Per-subscriber outbound buffer, in records. A subscriber that falls
    /// this far behind is dropped.
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: Duration::from_secs(15),
            channel_capacity: 32,
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keep-alive interval.
    pub fn keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    /// Set the per-subscriber buffer capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// Client-side configuration for the stream consumer.
#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    /// Fixed delay before re-establishing a lost connection.
    pub reconnect_delay: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl ConsumerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reconnect delay.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}
