//! Static file request handler

use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use percent_encoding::percent_decode_str;
use serve_core::handler::text_response;
use serve_core::{Body, Handler, ServerConfig};

use crate::file_server::FileServer;
use crate::resolve::PathResolver;

/// Serves files from the configured root
#[derive(Debug, Clone)]
pub struct FileHandler {
    resolver: PathResolver,
    files: FileServer,
}

impl FileHandler {
    /// Create a handler for the configured root
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            resolver: PathResolver::new(&config.root).with_logging(config.verbose_logging),
            files: FileServer::new(),
        }
    }
}

#[async_trait]
impl Handler for FileHandler {
    async fn handle(&self, req: Request<()>) -> Response<Body> {
        let path = match percent_decode_str(req.uri().path()).decode_utf8() {
            Ok(path) => path,
            Err(_) => return text_response(StatusCode::BAD_REQUEST, "invalid URL path"),
        };
        let ctx = self.resolver.resolve(&path);
        self.files.serve(&req, &ctx).await
    }
}
