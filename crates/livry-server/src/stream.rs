//! Notification stream channel
//!
//! One long-lived SSE response per admin console. The channel registers with
//! the hub as it opens, writes a welcome frame, then interleaves broadcast
//! records with keep-alive comments. All exit paths (peer abort, failed
//! push, server shutdown) run through the same drop guard, which is the only
//! place the subscriber is removed.

use crate::response::Response;
use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use livry_core::{frame, Hub, Notification, RelayConfig, SubscriberId};
use std::convert::Infallible;
use std::sync::Arc;
use std::task::Poll;
use tokio::sync::mpsc;
use tracing::debug;

/// Unregisters the subscriber when the response body is dropped.
struct StreamGuard {
    hub: Arc<Hub>,
    id: SubscriberId,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
        debug!(subscriber = self.id, "Notification stream closed");
    }
}

/// `GET /api/notifications/stream`: open a push channel.
pub fn open(hub: Arc<Hub>, config: RelayConfig) -> Response {
    let (tx, mut rx) = mpsc::channel::<Bytes>(config.channel_capacity);
    let id = hub.register(tx);
    let guard = StreamGuard { hub, id };

    // The connected greeting serializes from static fields; fall back to a
    // bare comment rather than failing the stream open.
    let mut welcome = Some(
        frame::event_record(&Notification::connected())
            .unwrap_or_else(|_| frame::keep_alive_record()),
    );

    // First tick only after a full interval; the welcome frame already
    // confirms liveness at open.
    let period = config.keep_alive_interval;
    let mut keep_alive = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    keep_alive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let records = futures_util::stream::poll_fn(move |cx| {
        // Owned by the stream so dropping the body unregisters.
        let _guard = &guard;

        if let Some(record) = welcome.take() {
            return Poll::Ready(Some(Ok::<_, Infallible>(Frame::data(record))));
        }

        // Broadcast records take priority over keep-alives.
        match rx.poll_recv(cx) {
            Poll::Ready(Some(record)) => return Poll::Ready(Some(Ok(Frame::data(record)))),
            // Sender gone: the hub dropped us after a failed push. End the
            // stream; the client reconnects.
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Pending => {}
        }

        match keep_alive.poll_tick(cx) {
            Poll::Ready(_) => Poll::Ready(Some(Ok(Frame::data(frame::keep_alive_record())))),
            Poll::Pending => Poll::Pending,
        }
    });

    http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header(header::CONNECTION, "keep-alive")
        .body(StreamBody::new(records).boxed_unsync())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use livry_core::EventKind;

    async fn next_record(body: &mut crate::response::Body) -> Bytes {
        body.frame()
            .await
            .expect("stream ended")
            .expect("stream errored")
            .into_data()
            .expect("expected a data frame")
    }

    #[tokio::test(start_paused = true)]
    async fn stream_headers_disable_buffering() {
        let hub = Arc::new(Hub::new());
        let response = open(hub, RelayConfig::default());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/event-stream; charset=utf-8"
        );
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-cache, no-transform"
        );
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "keep-alive"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_then_broadcast_records() {
        let hub = Arc::new(Hub::new());
        let mut body = open(hub.clone(), RelayConfig::default()).into_body();

        let welcome = next_record(&mut body).await;
        let text = std::str::from_utf8(&welcome).unwrap();
        assert!(text.starts_with("data: "));
        assert!(text.contains("\"type\":\"connected\""));
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(&Notification::new(
            EventKind::NewDelivery,
            "Nouvelle livraison #42 créée",
        ));
        let record = next_record(&mut body).await;
        let text = std::str::from_utf8(&record).unwrap();
        assert!(text.contains("\"type\":\"new_delivery\""));
        assert!(text.contains("Nouvelle livraison #42 créée"));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_stream_emits_keep_alive_comments() {
        let hub = Arc::new(Hub::new());
        let mut body = open(hub, RelayConfig::default()).into_body();

        next_record(&mut body).await; // welcome

        // No events published: the next record is a keep-alive comment
        // (paused time auto-advances through the interval).
        let record = next_record(&mut body).await;
        assert_eq!(&record[..], frame::KEEP_ALIVE.as_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_body_unregisters_the_subscriber() {
        let hub = Arc::new(Hub::new());
        let mut body = open(hub.clone(), RelayConfig::default()).into_body();
        next_record(&mut body).await;
        assert_eq!(hub.subscriber_count(), 1);

        drop(body);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stream_ends_after_the_hub_drops_the_subscriber() {
        let hub = Arc::new(Hub::new());
        // Capacity 1: the second unconsumed publish overflows the buffer and
        // the hub drops the subscriber.
        let config = RelayConfig::new().channel_capacity(1);
        let mut body = open(hub.clone(), config).into_body();
        next_record(&mut body).await;

        hub.publish(&Notification::new(EventKind::Info, "a"));
        hub.publish(&Notification::new(EventKind::Info, "b"));
        assert_eq!(hub.subscriber_count(), 0);

        // The buffered record still drains, then the stream terminates.
        next_record(&mut body).await;
        assert!(body.frame().await.is_none());
    }
}
