//! Command line interface

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serve_core::{CompressionLevel, ServerConfig};

/// Serves a directory (or the present working directory) via HTTP on the given address.
#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(version, about)]
#[command(override_usage = "serve [OPTIONS] [DIRECTORY]")]
pub struct Cli {
    /// Address for HTTP communication
    #[arg(long, default_value = serve_core::config::DEFAULT_BIND_ADDRESS, value_name = "ADDR")]
    pub port: String,

    /// Use gzip compression for responses
    #[arg(long)]
    pub gzip: bool,

    /// Gzip compression level
    #[arg(long, value_enum, default_value_t = GzipLevel::Default, value_name = "LEVEL")]
    pub gzip_level: GzipLevel,

    /// Run in verbose mode, logging every request path
    #[arg(long)]
    pub log: bool,

    /// Seconds a connection may take to send a request head (0 disables the limit)
    #[arg(long, default_value_t = 3600, value_name = "SECS")]
    pub read_timeout: u64,

    /// Directory to serve (defaults to the current directory)
    pub directory: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GzipLevel {
    Fast,
    Default,
    Best,
}

impl From<GzipLevel> for CompressionLevel {
    fn from(level: GzipLevel) -> Self {
        match level {
            GzipLevel::Fast => CompressionLevel::Fast,
            GzipLevel::Default => CompressionLevel::Default,
            GzipLevel::Best => CompressionLevel::Best,
        }
    }
}

const LONG_FLAGS: &[&str] = &["port", "gzip", "gzip-level", "log", "read-timeout", "help", "version"];

impl Cli {
    /// Parse arguments, accepting single-dash long flags such as `-port`.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Turn the parsed arguments into the server configuration
    pub fn into_config(self) -> serve_core::Result<ServerConfig> {
        Ok(ServerConfig::for_directory(self.directory)?
            .with_bind_address(&self.port)
            .with_compression(self.gzip, self.gzip_level.into())
            .with_verbose_logging(self.log)
            .with_read_timeout(Duration::from_secs(self.read_timeout)))
    }
}

/// Rewrite `-name` and `-name=value` to their `--` form for known long flags.
///
/// Everything after a bare `--` is left alone.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut rest_positional = false;
    args.into_iter()
        .map(|arg| {
            if rest_positional {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                rest_positional = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(flag) if !flag.starts_with('-') => {
                    let name = flag.split_once('=').map_or(flag, |(name, _)| name);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}
