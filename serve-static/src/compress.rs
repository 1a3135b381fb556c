//! Compression support
//!
//! [`Compression`] wraps any [`Handler`] and gzips the response body when the
//! request accepts it. The encoder is streamed: it reads the inner body as it
//! arrives and writes the gzip trailer once the inner body ends.

use async_compression::tokio::bufread::GzipEncoder;
use async_compression::Level;
use async_trait::async_trait;
use futures::{future, TryStreamExt};
use http::header::{self, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, BodyStream, StreamBody};
use serve_core::{Body, CompressionLevel, Handler};
use tokio_util::io::{ReaderStream, StreamReader};

/// Token looked for in `Accept-Encoding`
pub const GZIP: &str = "gzip";

/// Gzip compression decorator
pub struct Compression<H> {
    inner: H,
    level: CompressionLevel,
}

impl<H: Handler> Compression<H> {
    /// Wrap `inner` with default compression
    pub fn new(inner: H) -> Self {
        Self::with_level(inner, CompressionLevel::default())
    }

    /// Wrap `inner` compressing at `level`
    pub fn with_level(inner: H, level: CompressionLevel) -> Self {
        Self { inner, level }
    }
}

#[async_trait]
impl<H: Handler> Handler for Compression<H> {
    async fn handle(&self, req: Request<()>) -> Response<Body> {
        if !accepts_gzip(&req) {
            return self.inner.handle(req).await;
        }

        let bodiless = req.method() == Method::HEAD;
        let response = self.inner.handle(req).await;
        let (mut parts, body) = response.into_parts();

        parts
            .headers
            .insert(header::CONTENT_ENCODING, HeaderValue::from_static(GZIP));
        parts.headers.remove(header::CONTENT_LENGTH);
        parts
            .headers
            .append(header::VARY, HeaderValue::from_static("Accept-Encoding"));

        if bodiless
            || parts.status == StatusCode::NOT_MODIFIED
            || parts.status == StatusCode::NO_CONTENT
        {
            return Response::from_parts(parts, body);
        }

        Response::from_parts(parts, gzip_body(body, self.level))
    }
}

/// `Accept-Encoding` mentions gzip
fn accepts_gzip<B>(req: &Request<B>) -> bool {
    req.headers()
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains(GZIP))
}

/// Stream `body` through a gzip encoder.
///
/// Non-data frames are dropped. An error from `body` ends the compressed
/// stream with that error instead of a gzip trailer.
fn gzip_body(body: Body, level: CompressionLevel) -> Body {
    let data = BodyStream::new(body).try_filter_map(|frame| future::ready(Ok(frame.into_data().ok())));
    let encoder = GzipEncoder::with_quality(StreamReader::new(data), quality(level));
    StreamBody::new(ReaderStream::new(encoder).map_ok(Frame::data)).boxed_unsync()
}

fn quality(level: CompressionLevel) -> Level {
    match level {
        CompressionLevel::Fast => Level::Fastest,
        CompressionLevel::Default => Level::Default,
        CompressionLevel::Best => Level::Best,
    }
}
