//! Gateway server lifecycle
//!
//! [`Gateway`] owns the frozen configuration, the request handler, and — once
//! started — the listener and its accept loop. `start()` is where transport
//! resources are acquired: TLS material is loaded, the address is bound, and
//! the accept loop is spawned. `stop()` releases all of it. Lifecycle calls
//! on one instance are serialized by `&mut self`; misuse of the state machine
//! is reported as a loud [`GatewayError::Lifecycle`] error, never ignored.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use log::{debug, error, info, warn};
use openssl::ssl::{Ssl, SslAcceptor};
use serde::Serialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_openssl::SslStream;

use crate::common::{GatewayError, Result};
use crate::config::{GatewayConfig, Scheme};
use crate::handler::S3Handler;
use crate::tls::create_tls_acceptor;

/// Listener lifecycle states.
///
/// Transitions are driven only by [`Gateway::start`] and [`Gateway::stop`]:
/// `Stopped → Starting → Started → Stopping → Stopped`, with
/// `Starting → Failed` when the bind or certificate load fails. `Failed` is
/// terminal for the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServerState {
    /// No listener exists
    Stopped,
    /// Acquiring transport resources
    Starting,
    /// Accepting connections
    Started,
    /// Draining and releasing transport resources
    Stopping,
    /// Startup failed; the instance cannot be reused
    Failed,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "STOPPED"),
            Self::Starting => write!(f, "STARTING"),
            Self::Started => write!(f, "STARTED"),
            Self::Stopping => write!(f, "STOPPING"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Point-in-time lifecycle snapshot for embedding callers.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayStatus {
    /// Current lifecycle state
    pub state: ServerState,
    /// Bound port, present while the listener is bound
    pub port: Option<u16>,
}

/// Handles on the running accept loop, held between start() and stop().
struct RunningListener {
    shutdown: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

/// Gateway server instance.
///
/// Constructed by [`crate::gateway::GatewayBuilder::build`] from a validated,
/// frozen configuration. The handler is created here, once; the socket is
/// not opened until [`Gateway::start`].
pub struct Gateway {
    config: GatewayConfig,
    handler: Arc<S3Handler>,
    state: ServerState,
    bound_addr: Option<SocketAddr>,
    running: Option<RunningListener>,
}

impl Gateway {
    pub(crate) fn new(config: GatewayConfig) -> Self {
        let handler = Arc::new(S3Handler::new(
            Arc::clone(&config.store),
            config.credentials.clone(),
            config.virtual_host.clone(),
        ));

        Self {
            config,
            handler,
            state: ServerState::Stopped,
            bound_addr: None,
            running: None,
        }
    }

    /// Start the gateway: load TLS material if the endpoint demands it, bind
    /// the listen address, and spawn the accept loop.
    ///
    /// Blocks only long enough to report a bind or certificate failure;
    /// connection handling runs asynchronously relative to the caller.
    /// Calling `start()` on anything but a stopped instance is a usage error.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != ServerState::Stopped {
            return Err(GatewayError::Lifecycle(format!(
                "start() called in state {}",
                self.state
            )));
        }
        self.state = ServerState::Starting;

        let endpoint = &self.config.endpoint;

        let tls_acceptor = match endpoint.scheme {
            Scheme::Https => {
                // Guaranteed by validation, but never worth a panic.
                let Some(tls) = self.config.tls.as_ref() else {
                    self.state = ServerState::Failed;
                    return Err(GatewayError::Transport(
                        "https endpoint without certificate material".to_string(),
                    ));
                };
                match create_tls_acceptor(&tls.keystore_path, &tls.keystore_password) {
                    Ok(acceptor) => Some(Arc::new(acceptor)),
                    Err(e) => {
                        self.state = ServerState::Failed;
                        return Err(e);
                    }
                }
            }
            Scheme::Http => None,
        };

        let listener = match TcpListener::bind((endpoint.host.as_str(), endpoint.port)).await {
            Ok(listener) => listener,
            Err(e) => {
                self.state = ServerState::Failed;
                return Err(GatewayError::Transport(format!(
                    "cannot bind {}:{}: {}",
                    endpoint.host, endpoint.port, e
                )));
            }
        };
        let bound_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.state = ServerState::Failed;
                return Err(GatewayError::Transport(format!(
                    "cannot resolve bound address: {}",
                    e
                )));
            }
        };
        self.bound_addr = Some(bound_addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handler = Arc::clone(&self.handler);
        let accept_task = tokio::spawn(accept_loop(listener, tls_acceptor, handler, shutdown_rx));

        self.running = Some(RunningListener {
            shutdown: shutdown_tx,
            accept_task,
        });
        self.state = ServerState::Started;
        info!("gateway listening on {}://{}", endpoint.scheme, bound_addr);

        Ok(())
    }

    /// Stop the gateway: signal the accept loop, give in-flight dispatch a
    /// chance to drain, and release the listener and certificate material.
    ///
    /// Calling `stop()` on anything but a started instance is a usage error.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state != ServerState::Started {
            return Err(GatewayError::Lifecycle(format!(
                "stop() called in state {}",
                self.state
            )));
        }
        self.state = ServerState::Stopping;

        if let Some(running) = self.running.take() {
            // The receiver is gone if the loop already exited; either way the
            // join below observes its termination.
            let _ = running.shutdown.send(true);
            if let Err(e) = running.accept_task.await {
                warn!("accept loop terminated abnormally: {}", e);
            }
        }

        self.bound_addr = None;
        self.state = ServerState::Stopped;
        info!("gateway stopped");

        Ok(())
    }

    /// The actual bound port, resolving an ephemeral-port request.
    ///
    /// Fails with a lifecycle error before `start()` has completed binding.
    pub fn local_port(&self) -> Result<u16> {
        self.bound_addr
            .map(|addr| addr.port())
            .ok_or_else(|| {
                GatewayError::Lifecycle("local_port() called before the listener is bound".to_string())
            })
    }

    /// Current lifecycle state; callable at any time.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Lifecycle snapshot for embedding callers.
    pub fn status(&self) -> GatewayStatus {
        GatewayStatus {
            state: self.state,
            port: self.bound_addr.map(|addr| addr.port()),
        }
    }
}

/// Accept connections until the shutdown signal flips.
///
/// Each accepted connection is served on its own task, tracked in a
/// `JoinSet`; on shutdown the listener is dropped first so the port frees
/// immediately, then remaining connection tasks are aborted.
async fn accept_loop(
    listener: TcpListener,
    tls_acceptor: Option<Arc<SslAcceptor>>,
    handler: Arc<S3Handler>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tasks = JoinSet::new();

    loop {
        // Reap finished connection tasks so the set does not grow unbounded.
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    error!("connection task failed: {}", e);
                }
            }
        }

        tokio::select! {
            _ = shutdown.changed() => {
                debug!("accept loop received shutdown signal");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        debug!("accepted connection from {}", peer_addr);
                        let tls_acceptor = tls_acceptor.clone();
                        let handler = Arc::clone(&handler);
                        tasks.spawn(async move {
                            if let Err(e) =
                                serve_connection(stream, tls_acceptor, handler).await
                            {
                                debug!("connection from {} ended: {}", peer_addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("error accepting connection: {}", e);
                    }
                }
            }
        }
    }

    drop(listener);
    tasks.shutdown().await;
    debug!("accept loop drained");
}

/// Serve one accepted connection: optional TLS handshake, then HTTP dispatch
/// into the handler.
async fn serve_connection(
    stream: TcpStream,
    tls_acceptor: Option<Arc<SslAcceptor>>,
    handler: Arc<S3Handler>,
) -> Result<()> {
    let service = service_fn(move |req| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handler.handle(req).await) }
    });

    let mut http = HttpConnBuilder::new(TokioExecutor::new());
    // Hand headers to the handler as the client sent them; S3 signatures
    // cover the raw header bytes.
    http.http1().preserve_header_case(true);

    match tls_acceptor {
        Some(acceptor) => {
            let ssl = Ssl::new(acceptor.context()).map_err(GatewayError::Ssl)?;
            let stream = SslStream::new(ssl, stream).map_err(GatewayError::Ssl)?;
            let mut stream = Box::pin(stream);

            stream
                .as_mut()
                .accept()
                .await
                .map_err(|e| GatewayError::TlsHandshake(e.to_string()))?;
            debug!("TLS handshake successful");

            if let Err(e) = http.serve_connection(TokioIo::new(stream), service).await {
                debug!("http connection error: {}", e);
            }
        }
        None => {
            if let Err(e) = http.serve_connection(TokioIo::new(stream), service).await {
                debug!("http connection error: {}", e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display_matches_the_lifecycle_names() {
        assert_eq!(ServerState::Stopped.to_string(), "STOPPED");
        assert_eq!(ServerState::Starting.to_string(), "STARTING");
        assert_eq!(ServerState::Started.to_string(), "STARTED");
        assert_eq!(ServerState::Stopping.to_string(), "STOPPING");
        assert_eq!(ServerState::Failed.to_string(), "FAILED");
    }

    #[test]
    fn test_status_serializes_for_embedding_callers() {
        let status = GatewayStatus {
            state: ServerState::Started,
            port: Some(4242),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"state":"STARTED","port":4242}"#);
    }
}
