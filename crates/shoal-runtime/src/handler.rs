//! HTTP request handler

use http::{Method, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use shoal_core::middleware::{Body, HandlerFn, HandlerFuture, Middleware, Next};
use shoal_core::response::responses;
use shoal_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// HTTP request handler
///
/// Runs each request through the middleware chain and answers anything
/// left unhandled with 404 (or 405 for methods other than GET/HEAD).
#[derive(Clone)]
pub struct RequestHandler {
    middleware_chain: Arc<[Arc<dyn Middleware>]>,
    fallback: Arc<HandlerFn>,
    in_flight: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl std::fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestHandler")
            .field("middleware_count", &self.middleware_chain.len())
            .field("in_flight", &self.in_flight)
            .field("total", &self.total)
            .finish()
    }
}

/// Decrements the in-flight counter when a request finishes or is dropped
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::Relaxed);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl RequestHandler {
    /// Create a new request handler with middleware chain
    pub fn new(middleware_chain: Arc<[Arc<dyn Middleware>]>) -> Self {
        Self {
            middleware_chain,
            fallback: Arc::new(Box::new(fallback_handler) as HandlerFn),
            in_flight: Arc::new(AtomicUsize::new(0)),
            total: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Requests currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Requests handled since startup
    pub fn request_count(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Handle an incoming HTTP request (from Hyper with Incoming body)
    pub async fn handle(&self, req: Request<Incoming>) -> Result<Response<Body>> {
        let (parts, body) = req.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read request body: {}", e)))?
            .to_bytes();

        self.handle_request(Request::from_parts(parts, Full::new(body_bytes)))
            .await
    }

    /// Handle a request with a buffered body
    pub async fn handle_request(&self, req: Request<Body>) -> Result<Response<Body>> {
        let _guard = InFlight::enter(&self.in_flight);
        self.total.fetch_add(1, Ordering::Relaxed);

        let start = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let next = Next::with_shared_handler(
            Arc::clone(&self.middleware_chain),
            Arc::clone(&self.fallback),
        );
        let response = next.run(req).await?;

        debug!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            duration_us = start.elapsed().as_micros() as u64,
            "Request handled"
        );

        Ok(response)
    }
}

fn fallback_handler(req: Request<Body>) -> HandlerFuture {
    Box::pin(async move { fallback(req) })
}

fn fallback(req: Request<Body>) -> Result<Response<Body>> {
    match *req.method() {
        Method::GET | Method::HEAD => responses::not_found("Not found"),
        _ => responses::method_not_allowed("GET, HEAD"),
    }
}
