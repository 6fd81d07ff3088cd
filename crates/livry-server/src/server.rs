//! HTTP server implementation

use crate::response::{self, Response};
use crate::{health, ingress, stream};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use livry_core::{ApiError, Hub, RelayConfig};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use uuid::Uuid;

/// The routes this server exposes.
#[derive(Debug, Clone, Copy)]
enum Route {
    /// Primary webhook ingress: `{event, data, timestamp}` bodies.
    WebhookDelivery,
    /// Legacy webhook ingress: `{delivery, action}` bodies.
    LegacyWebhook,
    /// SSE notification stream.
    NotificationStream,
    /// Liveness and subscriber count.
    Health,
}

fn build_router() -> matchit::Router<Route> {
    let mut router = matchit::Router::new();
    for (path, route) in [
        ("/api/webhooks/delivery", Route::WebhookDelivery),
        ("/api/webhook/deliveries", Route::LegacyWebhook),
        ("/api/notifications/stream", Route::NotificationStream),
        ("/health", Route::Health),
    ] {
        // Static paths registered at startup cannot conflict.
        router.insert(path, route).unwrap();
    }
    router
}

/// The relay server: one hub shared by the ingress and every open stream.
pub struct RelayServer {
    hub: Arc<Hub>,
    config: RelayConfig,
}

impl RelayServer {
    pub fn new(hub: Arc<Hub>, config: RelayConfig) -> Self {
        Self { hub, config }
    }

    /// Bind `addr` and serve until the process exits.
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Livry relay listening on http://{}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Serve connections from an already-bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let router = Arc::new(build_router());

        loop {
            let (socket, _remote_addr) = listener.accept().await?;
            let io = TokioIo::new(socket);
            let hub = self.hub.clone();
            let config = self.config;
            let router = router.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<Incoming>| {
                    let hub = hub.clone();
                    let router = router.clone();
                    async move {
                        let response = handle_request(hub, config, &router, req).await;
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    // Peer aborts on open streams land here; not a server fault.
                    tracing::debug!(error = %err, "Connection ended with error");
                }
            });
        }
    }
}

/// Handle a single HTTP request
async fn handle_request(
    hub: Arc<Hub>,
    config: RelayConfig,
    router: &matchit::Router<Route>,
    req: hyper::Request<Incoming>,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id = Uuid::new_v4();
    let start = std::time::Instant::now();

    let result = match router.at(&path) {
        Ok(matched) => match *matched.value {
            Route::WebhookDelivery if method == http::Method::POST => {
                ingress::webhook_delivery(&hub, req).await
            }
            Route::LegacyWebhook if method == http::Method::POST => {
                ingress::legacy_webhook(&hub, req).await
            }
            Route::NotificationStream if method == http::Method::GET => {
                Ok(stream::open(hub.clone(), config))
            }
            Route::Health if method == http::Method::GET => Ok(health::health(&hub)),
            _ => Err(ApiError::method_not_allowed(format!(
                "Method {} not allowed for {}",
                method, path
            ))),
        },
        Err(_) => Err(ApiError::not_found(format!(
            "No route found for {} {}",
            method, path
        ))),
    };

    let response = match result {
        Ok(response) => response,
        Err(err) => response::error(&err),
    };

    log_request(request_id, &method, &path, response.status(), start);
    response
}

/// Log request completion
fn log_request(
    request_id: Uuid,
    method: &http::Method,
    path: &str,
    status: http::StatusCode,
    start: std::time::Instant,
) {
    let elapsed = start.elapsed();

    if status.is_success() {
        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else {
        error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    }
}
