//! Process shutdown signals

use std::fmt;

use crate::error::{Error, Result};

/// Signal that ended the serving state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT / Ctrl-C
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("interrupt"),
            Signal::Terminate => f.write_str("terminated"),
        }
    }
}

/// Listener for interrupt and termination signals
///
/// Handlers are registered by [`ShutdownSignal::install`], so signals that
/// arrive before [`ShutdownSignal::recv`] is awaited are not lost.
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    /// Register the signal handlers. Must be called inside a tokio runtime.
    #[cfg(unix)]
    pub fn install() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt = signal(SignalKind::interrupt())
            .map_err(|e| Error::Signal(format!("Failed to listen for SIGINT: {}", e)))?;
        let terminate = signal(SignalKind::terminate())
            .map_err(|e| Error::Signal(format!("Failed to listen for SIGTERM: {}", e)))?;

        Ok(Self { interrupt, terminate })
    }

    /// Register the signal handlers. Must be called inside a tokio runtime.
    #[cfg(not(unix))]
    pub fn install() -> Result<Self> {
        Ok(Self {})
    }

    /// Wait for the first shutdown signal
    #[cfg(unix)]
    pub async fn recv(mut self) -> Signal {
        tokio::select! {
            _ = self.interrupt.recv() => Signal::Interrupt,
            _ = self.terminate.recv() => Signal::Terminate,
        }
    }

    /// Wait for the first shutdown signal
    #[cfg(not(unix))]
    pub async fn recv(self) -> Signal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        Signal::Interrupt
    }
}
