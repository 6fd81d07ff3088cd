//! Response plumbing shared by the handlers
//!
//! JSON replies and SSE streams share one body type so the connection service
//! has a single response signature.

use bytes::Bytes;
use http::{header, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full};
use livry_core::ApiError;
use std::convert::Infallible;

/// The server's uniform body type.
pub type Body = UnsyncBoxBody<Bytes, Infallible>;

/// The server's uniform response type.
pub type Response = http::Response<Body>;

/// A fully-buffered body.
pub fn full(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into()).boxed_unsync()
}

/// A JSON response with the given status.
pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Response {
    http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(full(body))
        .unwrap()
}

/// Render an [`ApiError`] as its JSON envelope.
pub fn error(err: &ApiError) -> Response {
    json(err.status, err.body_json())
}
