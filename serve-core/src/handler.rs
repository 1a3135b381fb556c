//! Request handler abstraction
//!
//! A [`Handler`] turns one request into one response. Handlers compose by
//! wrapping: a decorator owns an inner handler and implements `Handler`
//! itself, so the server only ever sees the outermost link of the chain.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Response body type shared by all handlers
pub type Body = UnsyncBoxBody<Bytes, std::io::Error>;

/// Handle a single HTTP request
///
/// Failures are expressed as responses; a handler never returns an error.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Produce the response for `req`
    async fn handle(&self, req: Request<()>) -> Response<Body>;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn handle(&self, req: Request<()>) -> Response<Body> {
        (**self).handle(req).await
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn handle(&self, req: Request<()>) -> Response<Body> {
        (**self).handle(req).await
    }
}

/// Body holding `bytes` in memory
pub fn full(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into())
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

/// Body with no content
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

/// Plain-text response carrying `message`
pub fn text_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(full(format!("{}\n", message)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

/// 404 response
pub fn not_found() -> Response<Body> {
    text_response(StatusCode::NOT_FOUND, "404 page not found")
}
