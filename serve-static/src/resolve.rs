//! Request path resolution

use std::path::{Path, PathBuf};

/// Document served for the root path
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Per-request resolution result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Decoded URL path as requested
    pub request_path: String,
    /// Filesystem path under the root
    pub resolved_path: PathBuf,
}

/// Maps request paths onto the served root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    log_requests: bool,
}

impl PathResolver {
    /// Create a resolver for `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            log_requests: false,
        }
    }

    /// Log each request path together with the file it resolved to
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.log_requests = enable;
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `request_path` to a path under the root.
    ///
    /// `/` maps to the default document. No existence check is made here.
    pub fn resolve(&self, request_path: &str) -> RequestContext {
        let relative = if request_path == "/" {
            DEFAULT_DOCUMENT
        } else {
            request_path
        };
        let resolved_path = join_under(&self.root, relative);

        if self.log_requests {
            tracing::info!("URL {} -> {}", request_path, resolved_path.display());
        }

        RequestContext {
            request_path: request_path.to_string(),
            resolved_path,
        }
    }
}

/// Join `relative` onto `root`, cleaning it lexically first.
///
/// `..` drops the previous segment and stops at the root, so the result
/// always starts with `root`.
fn join_under(root: &Path, relative: &str) -> PathBuf {
    let mut segments: Vec<&str> = Vec::new();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    let mut path = root.to_path_buf();
    path.extend(segments);
    path
}
