//! HTTP server implementation

use crate::handler::RequestHandler;
use crate::shutdown::ShutdownSignal;
use crate::RuntimeState;
use bytes::Bytes;
use http_body_util::Full;
use hyper_util::rt::TokioIo;
use shoal_config::Config;
use shoal_core::middleware::Middleware;
use shoal_core::{Error, Result};
use shoal_precompress::{CacheStats, StaticFiles};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tokio::task::JoinSet;

/// HTTP server
pub struct Server {
    config: Config,
    handler: RequestHandler,
    static_files: Arc<StaticFiles>,
    state: Arc<RwLock<RuntimeState>>,
    shutdown: ShutdownSignal,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("handler", &self.handler)
            .finish()
    }
}

impl Server {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Get the current state
    pub async fn state(&self) -> RuntimeState {
        *self.state.read().await
    }

    /// Get listen address
    pub fn listen_addr(&self) -> SocketAddr {
        self.config.server.listen
    }

    /// Get request count
    pub fn request_count(&self) -> usize {
        self.handler.request_count()
    }

    /// Snapshot of the payload cache counters
    pub fn cache_stats(&self) -> CacheStats {
        self.static_files.responder().cache().stats()
    }

    /// Get shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr())
            .await
            .map_err(|e| {
                Error::Runtime(format!("Failed to bind to {}: {}", self.listen_addr(), e))
            })?;

        self.serve(listener).await
    }

    /// Serve connections from an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown.subscribe();
        if self.shutdown.is_triggered() {
            tracing::info!("Shutdown requested before start");
            return Ok(());
        }

        self.set_state(RuntimeState::Running).await;

        tracing::info!(
            listen = %listener.local_addr().map_err(Error::Io)?,
            root = %self.config.assets.root.display(),
            mount = %self.config.assets.mount,
            precompression = self.config.precompression.enabled,
            max_size = self.config.precompression.max_size,
            "Server listening"
        );

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::trace!("Accepted connection from {}", addr);
                            connections.spawn(serve_connection(
                                stream,
                                self.handler.clone(),
                                self.shutdown.clone(),
                            ));
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }

                Some(_) = connections.join_next(), if !connections.is_empty() => {}

                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.set_state(RuntimeState::ShuttingDown).await;
        self.drain(&mut connections).await;
        self.set_state(RuntimeState::Stopped).await;

        let stats = self.cache_stats();
        tracing::info!(
            requests = self.request_count(),
            cache_entries = stats.entries,
            cache_bytes = stats.cached_bytes,
            cache_hits = stats.hits,
            cache_computations = stats.computations,
            cache_failures = stats.failures,
            cache_rejected = stats.rejected,
            "Server stopped"
        );

        Ok(())
    }

    /// Wait for open connections to finish, up to the shutdown timeout
    ///
    /// Each connection stops reading new requests once shutdown is signalled
    /// and closes after its in-flight response. Connections still open at
    /// the deadline are aborted.
    async fn drain(&self, connections: &mut JoinSet<()>) {
        let shutdown_timeout = self.config.server.shutdown_timeout;
        let start = Instant::now();

        tracing::info!(
            open_connections = connections.len(),
            active_requests = self.handler.in_flight(),
            timeout_secs = shutdown_timeout.as_secs(),
            "Waiting for connections to close"
        );

        let closed = tokio::time::timeout(shutdown_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        match closed {
            Ok(()) => tracing::info!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                "All connections closed, shutting down cleanly"
            ),
            Err(_) => {
                tracing::warn!(
                    open_connections = connections.len(),
                    active_requests = self.handler.in_flight(),
                    "Shutdown timeout reached, forcing shutdown"
                );
                connections.abort_all();
            }
        }
    }

    async fn set_state(&self, next: RuntimeState) {
        *self.state.write().await = next;
    }
}

/// Serve one HTTP/1.1 connection until it closes or shutdown is signalled
async fn serve_connection(
    stream: TcpStream,
    handler: RequestHandler,
    shutdown: ShutdownSignal,
) {
    let mut shutdown_rx = shutdown.subscribe();
    let shutdown_requested = async move {
        if !shutdown.is_triggered() {
            let _ = shutdown_rx.recv().await;
        }
    };
    let service = hyper::service::service_fn(move |req| {
        let handler = handler.clone();
        async move {
            handler.handle(req).await.or_else(|e| {
                tracing::error!("Request handler error: {}", e);
                http::Response::builder()
                    .status(e.to_status_code())
                    .body(Full::new(Bytes::from(format!("Error: {}", e))))
            })
        }
    });

    let conn = hyper::server::conn::http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown_requested => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };

    if let Err(e) = result {
        tracing::debug!("HTTP connection error: {}", e);
    }
}

/// Server builder
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: Option<Config>,
    shutdown: Option<ShutdownSignal>,
}

impl ServerBuilder {
    /// Create a new server builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Share an existing shutdown signal instead of creating one
    pub fn shutdown_signal(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Build the server
    pub fn build(self) -> Result<Server> {
        let config = self
            .config
            .ok_or_else(|| Error::Config("Configuration is required".to_string()))?;

        let static_files = Arc::new(
            StaticFiles::new(&config.assets.root, &config.precompression)
                .mount(config.assets.mount.clone()),
        );

        let middleware_chain: Arc<[Arc<dyn Middleware>]> =
            Arc::new([Arc::clone(&static_files) as Arc<dyn Middleware>]);

        Ok(Server {
            handler: RequestHandler::new(middleware_chain),
            static_files,
            state: Arc::new(RwLock::new(RuntimeState::Initializing)),
            shutdown: self.shutdown.unwrap_or_default(),
            config,
        })
    }
}
