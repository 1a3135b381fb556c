//! File server implementation
//!
//! Serves one resolved path with the usual static file semantics: content
//! type detection, validators and conditional requests, single byte ranges,
//! index documents and directory listings.

use std::fs::Metadata;
use std::io::{self, SeekFrom};
use std::path::Path;

use futures::TryStreamExt;
use http::header::{self, HeaderMap, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serve_core::handler::{self, Body};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::mime;
use crate::precondition::{self, Precondition, Validators};
use crate::range::ByteRange;
use crate::resolve::{RequestContext, DEFAULT_DOCUMENT};

/// Read buffer size used when streaming files
const CHUNK_SIZE: usize = 64 * 1024;

/// Characters escaped in listing links
const LINK_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Static file server
#[derive(Debug, Clone)]
pub struct FileServer {
    index: String,
}

impl Default for FileServer {
    fn default() -> Self {
        Self {
            index: DEFAULT_DOCUMENT.to_string(),
        }
    }
}

impl FileServer {
    /// Create a new file server
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the file `ctx` resolved to
    pub async fn serve(&self, req: &Request<()>, ctx: &RequestContext) -> Response<Body> {
        let method = req.method();
        if method != Method::GET && method != Method::HEAD {
            let mut response =
                handler::text_response(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed");
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        if contains_dot_dot(&ctx.request_path) {
            return handler::text_response(StatusCode::BAD_REQUEST, "invalid URL path");
        }

        tracing::debug!("Serving request: {} -> {:?}", ctx.request_path, ctx.resolved_path);

        let metadata = match tokio::fs::metadata(&ctx.resolved_path).await {
            Ok(m) => m,
            Err(e) => return io_error_response(&e, &ctx.resolved_path),
        };

        if !metadata.is_dir() {
            return self.serve_file(req, &ctx.resolved_path, &metadata).await;
        }

        if !req.uri().path().ends_with('/') {
            return redirect_to_directory(req);
        }

        let index_path = ctx.resolved_path.join(&self.index);
        match tokio::fs::metadata(&index_path).await {
            Ok(index_meta) if !index_meta.is_dir() => {
                self.serve_file(req, &index_path, &index_meta).await
            }
            _ => match self.generate_listing(&ctx.resolved_path, &ctx.request_path).await {
                Ok(html) => {
                    let mut response = if req.method() == Method::HEAD {
                        Response::new(handler::empty())
                    } else {
                        Response::new(handler::full(html))
                    };
                    response.headers_mut().insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/html; charset=utf-8"),
                    );
                    response
                }
                Err(e) => io_error_response(&e, &ctx.resolved_path),
            },
        }
    }

    async fn serve_file(&self, req: &Request<()>, path: &Path, metadata: &Metadata) -> Response<Body> {
        let mut file = match tokio::fs::File::open(path).await {
            Ok(f) => f,
            Err(e) => return io_error_response(&e, path),
        };
        let file_size = metadata.len();

        let content_type = match mime::guess(path) {
            Some(known) => known,
            None => match sniff_file(&mut file).await {
                Ok(sniffed) => sniffed.to_string(),
                Err(e) => return io_error_response(&e, path),
            },
        };

        let validators = Validators::new(file_size, metadata.modified().ok());
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, header::ETAG, &validators.etag);
        if let Some(last_modified) = validators.last_modified_header() {
            insert_header(&mut headers, header::LAST_MODIFIED, &last_modified);
        }

        let honor_range = match precondition::evaluate(req.method(), req.headers(), &validators) {
            Precondition::NotModified => {
                return with_headers(StatusCode::NOT_MODIFIED, headers, handler::empty());
            }
            Precondition::Failed => {
                return handler::text_response(StatusCode::PRECONDITION_FAILED, "412 precondition failed");
            }
            Precondition::Proceed { honor_range } => honor_range,
        };

        let range = match req.headers().get(header::RANGE).and_then(|v| v.to_str().ok()) {
            Some(value) if honor_range => ByteRange::parse(value, file_size),
            _ => ByteRange::Full,
        };

        let (status, start, length) = match range {
            ByteRange::Full => (StatusCode::OK, 0, file_size),
            ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
            ByteRange::Unsatisfiable => {
                let mut response = handler::text_response(
                    StatusCode::RANGE_NOT_SATISFIABLE,
                    "invalid range: failed to overlap",
                );
                if let Some(content_range) = range.content_range(file_size) {
                    insert_header(response.headers_mut(), header::CONTENT_RANGE, &content_range);
                }
                return response;
            }
        };

        insert_header(&mut headers, header::CONTENT_TYPE, &content_type);
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        if let Some(content_range) = range.content_range(file_size) {
            insert_header(&mut headers, header::CONTENT_RANGE, &content_range);
        }

        if req.method() == Method::HEAD {
            return with_headers(status, headers, handler::empty());
        }

        if start > 0 {
            if let Err(e) = file.seek(SeekFrom::Start(start)).await {
                return io_error_response(&e, path);
            }
        }

        let stream = ReaderStream::with_capacity(file.take(length), CHUNK_SIZE).map_ok(Frame::data);
        with_headers(status, headers, StreamBody::new(stream).boxed_unsync())
    }

    /// Generate HTML directory listing
    async fn generate_listing(&self, dir_path: &Path, req_path: &str) -> io::Result<String> {
        let mut entries = tokio::fs::read_dir(dir_path).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().await?.is_dir();
            names.push(if is_dir { format!("{}/", name) } else { name });
        }
        names.sort();

        let title = escape_html(req_path);
        let mut html = format!(
            "<!doctype html>\n<html><head><meta name=\"viewport\" content=\"width=device-width\">\
             <title>Index of {}</title></head><body><h1>Index of {}</h1><hr><pre>\n",
            title, title
        );
        if req_path != "/" {
            html.push_str("<a href=\"../\">../</a>\n");
        }
        for name in &names {
            html.push_str(&format!(
                "<a href=\"{}\">{}</a>\n",
                utf8_percent_encode(name, LINK_ESCAPE),
                escape_html(name)
            ));
        }
        html.push_str("</pre><hr></body></html>\n");
        Ok(html)
    }
}

/// Read the first bytes of `file` for content sniffing and rewind it.
async fn sniff_file(file: &mut tokio::fs::File) -> io::Result<&'static str> {
    let mut head = Vec::with_capacity(mime::SNIFF_LEN);
    (&mut *file).take(mime::SNIFF_LEN as u64).read_to_end(&mut head).await?;
    file.seek(SeekFrom::Start(0)).await?;
    Ok(mime::sniff(&head))
}

fn contains_dot_dot(path: &str) -> bool {
    path.contains("..") && path.split(['/', '\\']).any(|segment| segment == "..")
}

fn redirect_to_directory(req: &Request<()>) -> Response<Body> {
    let mut location = format!("{}/", req.uri().path());
    if let Some(query) = req.uri().query() {
        location.push('?');
        location.push_str(query);
    }

    let mut response = Response::new(handler::empty());
    *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
    insert_header(response.headers_mut(), header::LOCATION, &location);
    response
}

fn io_error_response(err: &io::Error, path: &Path) -> Response<Body> {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
            handler::not_found()
        }
        io::ErrorKind::PermissionDenied => {
            handler::text_response(StatusCode::FORBIDDEN, "403 Forbidden")
        }
        _ => {
            tracing::warn!("Failed to serve {}: {}", path.display(), err);
            handler::text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
        }
    }
}

fn with_headers(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn insert_header(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        headers.insert(name, value);
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
