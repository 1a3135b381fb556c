//! HTTP server lifecycle
//!
//! [`Server::bind`] takes the server from configuring to bound, and
//! [`Server::serve_until`] accepts connections until the shutdown future
//! resolves. Each connection is driven by hyper in its own task.

mod shutdown;

pub use self::shutdown::{ShutdownSignal, Signal};

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::handler::Handler;

/// A bound HTTP server
pub struct Server<H> {
    listener: TcpListener,
    local_addr: SocketAddr,
    handler: Arc<H>,
    http: http1::Builder,
}

impl<H: Handler> Server<H> {
    /// Bind the configured address and install `handler`
    pub async fn bind(config: &ServerConfig, handler: H) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_address.as_str())
            .await
            .map_err(|source| Error::Bind {
                addr: config.bind_address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        // A client that cannot deliver a request head in time loses its
        // connection; this also bounds idle keep-alive connections.
        // A zero timeout disables the limit.
        let read_timeout = Some(config.read_timeout).filter(|t| !t.is_zero());
        let mut http = http1::Builder::new();
        http.timer(TokioTimer::new())
            .header_read_timeout(read_timeout)
            .keep_alive(true);

        tracing::debug!("Bound {} (read timeout {:?})", local_addr, read_timeout);

        Ok(Self {
            listener,
            local_addr,
            handler: Arc::new(handler),
            http,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` resolves, then return its output.
    ///
    /// The listener is closed on return. Connections already accepted keep
    /// running only for as long as the runtime does.
    pub async fn serve_until<F>(self, shutdown: F) -> F::Output
    where
        F: Future,
    {
        tracing::info!("Web server listening at {} ...", self.local_addr);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                output = &mut shutdown => {
                    tracing::debug!("Stopped accepting on {}", self.local_addr);
                    return output;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => {
                        tracing::warn!("Accept error: {}", e);
                        continue;
                    }
                },
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let io = TokioIo::new(stream);
        let handler = self.handler.clone();
        let http = self.http.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let handler = handler.clone();
                async move { Ok::<_, Infallible>(handler.handle(req.map(|_| ())).await) }
            });

            if let Err(err) = http.serve_connection(io, service).await {
                tracing::debug!("Connection from {} ended: {}", peer, err);
            }
        });
    }
}
