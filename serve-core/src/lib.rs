//! serve core library
//!
//! Configuration, the [`Handler`] abstraction and the HTTP server lifecycle
//! shared by the serve binary and its handlers.

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use config::{CompressionLevel, ServerConfig};
pub use error::{Error, Result};
pub use handler::{Body, Handler};
pub use server::{Server, ShutdownSignal, Signal};

/// serve version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
