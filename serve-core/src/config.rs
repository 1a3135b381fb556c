//! Server configuration
//!
//! A [`ServerConfig`] is built once at startup and shared read-only with every
//! component that needs it.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "localhost:8080";

/// Default per-connection read timeout (1 hour)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Compression level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompressionLevel {
    /// Fast compression
    Fast,
    /// Default compression
    #[default]
    Default,
    /// Best compression (slower)
    Best,
}

/// Runtime configuration of the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Absolute path of the directory being served
    pub root: PathBuf,

    /// Address to bind, as `host:port`
    pub bind_address: String,

    /// Compress responses when the client accepts gzip
    pub compression: bool,

    /// Gzip level used when compressing
    pub compression_level: CompressionLevel,

    /// Log every request path and the file it resolved to
    pub verbose_logging: bool,

    /// Maximum time a connection may take to deliver a request head.
    /// Zero means no limit.
    pub read_timeout: Duration,
}

impl ServerConfig {
    /// Create a configuration serving `root` with default settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            compression: false,
            compression_level: CompressionLevel::default(),
            verbose_logging: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Build a configuration for `root`, falling back to the current
    /// working directory when no root is given.
    ///
    /// Relative roots are made absolute against the working directory.
    pub fn for_directory(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(dir) => std::path::absolute(&dir).map_err(|e| {
                Error::Config(format!("Could not resolve directory {}: {}", dir.display(), e))
            })?,
            None => std::env::current_dir()
                .map_err(|e| Error::Config(format!("Could not get current directory: {}", e)))?,
        };
        Ok(Self::new(root))
    }

    /// Set the bind address
    pub fn with_bind_address(mut self, addr: impl AsRef<str>) -> Self {
        self.bind_address = normalize_bind_address(addr.as_ref());
        self
    }

    /// Enable or disable gzip compression
    pub fn with_compression(mut self, enable: bool, level: CompressionLevel) -> Self {
        self.compression = enable;
        self.compression_level = level;
        self
    }

    /// Enable or disable per-request path logging
    pub fn with_verbose_logging(mut self, enable: bool) -> Self {
        self.verbose_logging = enable;
        self
    }

    /// Set the per-connection read timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// `:8080` means every interface, the same as `0.0.0.0:8080`.
pub fn normalize_bind_address(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    }
}
