//! serve static file module
//!
//! Static file serving with:
//! - Request path resolution under a root directory
//! - MIME type detection
//! - Conditional and range requests
//! - Index documents and directory listings
//! - Gzip compression as a handler decorator

mod compress;
mod file_server;
mod handler;
mod mime;
mod precondition;
mod range;
mod resolve;

pub use compress::{Compression, GZIP};
pub use file_server::FileServer;
pub use handler::FileHandler;
pub use resolve::{PathResolver, RequestContext, DEFAULT_DOCUMENT};

use serve_core::{Handler, ServerConfig};

/// Build the handler chain for `config`: the file handler, wrapped in gzip
/// compression when enabled.
pub fn handler_chain(config: &ServerConfig) -> Box<dyn Handler> {
    let files = FileHandler::new(config);
    if config.compression {
        Box::new(Compression::with_level(files, config.compression_level))
    } else {
        Box::new(files)
    }
}
