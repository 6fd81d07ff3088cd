//! End-to-end tests over loopback: real server, real HTTP consumer.

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use livry_client::{Consumer, HttpTransport, Notifier, PlaybackRejected, Toast};
use livry_core::{ConsumerConfig, EventKind, Hub, RelayConfig};
use livry_server::RelayServer;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct TestNotifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
    sounds: Arc<AtomicUsize>,
}

impl TestNotifier {
    fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for TestNotifier {
    fn play_sound(&self) -> Result<(), PlaybackRejected> {
        self.sounds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn toast(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}

async fn start_relay(config: RelayConfig) -> (SocketAddr, Arc<Hub>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = Arc::new(Hub::new());
    let server = RelayServer::new(hub.clone(), config);
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    (addr, hub)
}

fn http_client() -> Client<HttpConnector, Full<Bytes>> {
    Client::builder(TokioExecutor::new()).build_http()
}

async fn post_json(addr: SocketAddr, path: &str, body: &str) -> StatusCode {
    let request = http::Request::post(format!("http://{}{}", addr, path))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap();
    http_client().request(request).await.unwrap().status()
}

async fn get_body(addr: SocketAddr, path: &str) -> (StatusCode, String) {
    let client: Client<HttpConnector, Full<Bytes>> = http_client();
    let request = http::Request::get(format!("http://{}{}", addr, path))
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = client.request(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).to_string())
}

fn spawn_consumer(addr: SocketAddr, notifier: TestNotifier) -> (livry_client::NotificationLog, tokio::task::JoinHandle<()>) {
    let transport =
        HttpTransport::new(&format!("http://{}/api/notifications/stream", addr)).unwrap();
    let consumer = Consumer::new(transport, notifier)
        .with_config(ConsumerConfig::new().reconnect_delay(Duration::from_millis(200)));
    let log = consumer.log();
    let task = tokio::spawn(consumer.run());
    (log, task)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread")]
async fn webhook_fans_out_to_every_connected_console() {
    let (addr, hub) = start_relay(RelayConfig::default()).await;

    let notifier_a = TestNotifier::default();
    let notifier_b = TestNotifier::default();
    let (log_a, task_a) = spawn_consumer(addr, notifier_a.clone());
    let (log_b, task_b) = spawn_consumer(addr, notifier_b.clone());

    {
        let hub = hub.clone();
        wait_until(move || hub.subscriber_count() == 2).await;
    }

    let status = post_json(
        addr,
        "/api/webhooks/delivery",
        r#"{"event":"delivery_created","data":{"delivery_id":42},"timestamp":"2024-01-01T10:00:00Z"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Greeting + event on both consoles.
    wait_until(|| log_a.len() >= 2 && log_b.len() >= 2).await;

    for (log, notifier) in [(&log_a, &notifier_a), (&log_b, &notifier_b)] {
        let events = log.snapshot();
        assert_eq!(events[0].kind, EventKind::Connected);
        assert_eq!(events[1].kind, EventKind::NewDelivery);
        assert_eq!(events[1].message, "Nouvelle livraison #42 créée");
        assert_eq!(events[1].timestamp, "2024-01-01T10:00:00Z");

        let toasts = notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].icon, "📦");
        assert_eq!(notifier.sounds.load(Ordering::SeqCst), 1);
    }

    task_a.abort();
    task_b.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn legacy_webhook_shape_is_mapped_at_the_boundary() {
    let (addr, hub) = start_relay(RelayConfig::default()).await;
    let notifier = TestNotifier::default();
    let (log, task) = spawn_consumer(addr, notifier.clone());
    {
        let hub = hub.clone();
        wait_until(move || hub.subscriber_count() == 1).await;
    }

    let status = post_json(
        addr,
        "/api/webhook/deliveries",
        r#"{"delivery":{"id":7,"statut":"livre"},"action":"status_updated"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_until(|| log.len() >= 2).await;
    let events = log.snapshot();
    assert_eq!(events[1].kind, EventKind::StatusUpdate);
    assert_eq!(events[1].message, "Statut mis à jour: livre pour la livraison #7");
    assert_eq!(notifier.toasts()[0].icon, "🔄");

    task.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_ingress_is_rejected_and_never_broadcast() {
    let (addr, hub) = start_relay(RelayConfig::default()).await;
    let notifier = TestNotifier::default();
    let (log, task) = spawn_consumer(addr, notifier.clone());
    {
        let hub = hub.clone();
        wait_until(move || hub.subscriber_count() == 1).await;
    }

    // Invalid JSON on the primary route.
    let status = post_json(addr, "/api/webhooks/delivery", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Valid JSON missing the required field on the legacy route.
    let status = post_json(addr, "/api/webhook/deliveries", r#"{"action":"created"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A valid event still flows afterwards, and it is the only one.
    let status = post_json(
        addr,
        "/api/webhooks/delivery",
        r#"{"event":"delivery_assigned","data":{"delivery_id":3}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    wait_until(|| log.len() >= 2).await;
    let events = log.snapshot();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].kind, EventKind::Assignment);
    assert_eq!(events[1].message, "Livraison #3 assignée");

    task.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_the_subscriber_count() {
    let (addr, hub) = start_relay(RelayConfig::default()).await;

    let (status, body) = get_body(addr, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"subscribers\":0"));

    let (_log, task) = spawn_consumer(addr, TestNotifier::default());
    {
        let hub = hub.clone();
        wait_until(move || hub.subscriber_count() == 1).await;
    }

    let (_, body) = get_body(addr, "/health").await;
    assert!(body.contains("\"subscribers\":1"));

    task.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_routes_and_methods_are_structured_errors() {
    let (addr, _hub) = start_relay(RelayConfig::default()).await;

    let (status, body) = get_body(addr, "/api/deliveries").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("\"type\":\"not_found\""));

    // GET on a POST-only route.
    let (status, body) = get_body(addr, "/api/webhooks/delivery").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body.contains("\"type\":\"method_not_allowed\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn keep_alives_do_not_pollute_the_notification_log() {
    let config = RelayConfig::new().keep_alive_interval(Duration::from_millis(100));
    let (addr, hub) = start_relay(config).await;
    let notifier = TestNotifier::default();
    let (log, task) = spawn_consumer(addr, notifier.clone());
    {
        let hub = hub.clone();
        wait_until(move || hub.subscriber_count() == 1).await;
    }

    // Several keep-alive periods pass; only the greeting is logged.
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(log.len(), 1);
    assert!(notifier.toasts().is_empty());

    // The connection is still usable afterwards.
    post_json(
        addr,
        "/api/webhooks/delivery",
        r#"{"event":"delivery_status_changed","data":{"delivery_id":7,"status":"livre"}}"#,
    )
    .await;
    wait_until(|| log.len() >= 2).await;
    assert_eq!(
        log.snapshot()[1].message,
        "Statut de la livraison #7 mis à jour: livre"
    );

    task.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn consumer_self_heals_when_the_server_comes_back() {
    // Reserve a port, then release it so the consumer's first attempts fail.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let notifier = TestNotifier::default();
    let (log, task) = spawn_consumer(addr, notifier.clone());

    // Let a few refused attempts happen.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(log.is_empty());

    // Server appears on the same address; the consumer recovers on its own.
    let listener = TcpListener::bind(addr).await.unwrap();
    let hub = Arc::new(Hub::new());
    let server = RelayServer::new(hub.clone(), RelayConfig::default());
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    wait_until(|| log.len() >= 1).await;
    assert_eq!(log.snapshot()[0].kind, EventKind::Connected);

    let status = post_json(
        addr,
        "/api/webhooks/delivery",
        r#"{"event":"delivery_created","data":{"delivery_id":9}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    wait_until(|| log.len() >= 2).await;
    assert_eq!(log.snapshot()[1].message, "Nouvelle livraison #9 créée");

    task.abort();
}
