//! HTTP transport for the stream consumer
//!
//! Opens `GET /api/notifications/stream` and yields decoded body chunks. One
//! `HttpTransport` makes a fresh request per connection attempt; hyper's
//! chunked decoding is already done by the time chunks reach the parser.

use crate::consumer::{StreamConnection, StreamTransport};
use crate::error::ConsumerError;
use async_trait::async_trait;
use bytes::Bytes;
use http::header;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// Transport connecting to a relay server over HTTP.
pub struct HttpTransport {
    client: Client<HttpConnector, Empty<Bytes>>,
    url: http::Uri,
}

impl HttpTransport {
    /// Build a transport for the given stream URL, e.g.
    /// `http://127.0.0.1:3001/api/notifications/stream`.
    pub fn new(url: &str) -> Result<Self, ConsumerError> {
        let url: http::Uri = url
            .parse()
            .map_err(|err| ConsumerError::connect(format!("invalid stream URL: {}", err)))?;
        let client = Client::builder(TokioExecutor::new()).build_http();
        Ok(Self { client, url })
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    type Connection = HttpConnection;

    async fn connect(&mut self) -> Result<HttpConnection, ConsumerError> {
        let request = http::Request::get(self.url.clone())
            .header(header::ACCEPT, "text/event-stream")
            .body(Empty::new())
            .map_err(|err| ConsumerError::connect(err.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|err| ConsumerError::connect(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ConsumerError::connect(format!(
                "stream endpoint returned {}",
                response.status()
            )));
        }

        Ok(HttpConnection {
            body: response.into_body(),
        })
    }
}

/// One open HTTP response body.
pub struct HttpConnection {
    body: hyper::body::Incoming,
}

#[async_trait]
impl StreamConnection for HttpConnection {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, ConsumerError> {
        loop {
            match self.body.frame().await {
                None => return Ok(None),
                Some(Err(err)) => return Err(ConsumerError::transport(err.to_string())),
                Some(Ok(frame)) => {
                    // Trailer frames carry no stream data.
                    if let Ok(chunk) = frame.into_data() {
                        return Ok(Some(chunk));
                    }
                }
            }
        }
    }
}
