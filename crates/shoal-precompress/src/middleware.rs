//! Static file middleware backed by the pre-compressing responder

use crate::cache::PayloadCache;
use crate::config::PrecompressConfig;
use crate::mime::MimeLookup;
use crate::resource::{FileResource, Resource};
use crate::responder::{Outcome, Responder};
use async_trait::async_trait;
use http::{HeaderMap, Method, Request, Response};
use percent_encoding::percent_decode_str;
use shoal_core::middleware::{Body, Middleware, Next};
use shoal_core::{Error, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Serves files below a root directory
///
/// Requests that do not map to a regular file, and methods other than GET
/// and HEAD, are passed to the next handler. Files the cache declines are
/// served directly without compression.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    mount: String,
    enabled: bool,
    responder: Responder,
}

impl StaticFiles {
    /// Create a static file middleware for `root`
    pub fn new(root: impl Into<PathBuf>, config: &PrecompressConfig) -> Self {
        let cache = Arc::new(PayloadCache::new(config.max_size));
        Self::with_responder(root, config, Responder::new(cache))
    }

    /// Create a static file middleware with a custom content type lookup
    pub fn with_mime_lookup(
        root: impl Into<PathBuf>,
        config: &PrecompressConfig,
        mime: Arc<dyn MimeLookup>,
    ) -> Self {
        let cache = Arc::new(PayloadCache::new(config.max_size));
        Self::with_responder(root, config, Responder::with_mime_lookup(cache, mime))
    }

    fn with_responder(root: impl Into<PathBuf>, config: &PrecompressConfig, responder: Responder) -> Self {
        Self {
            root: root.into(),
            mount: "/".to_string(),
            enabled: config.enabled,
            responder,
        }
    }

    /// Serve files under a URL prefix instead of `/`
    pub fn mount(mut self, prefix: impl Into<String>) -> Self {
        self.mount = prefix.into();
        self
    }

    /// The responder, for inspecting the payload cache
    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Map a request path to a file below the root
    ///
    /// Segments are percent-decoded before they are checked. Empty and `.`
    /// segments are dropped, so every spelling of a file yields the same
    /// logical path. Returns `None` outside the mount prefix, for the mount
    /// root itself, and for any segment that would escape the root.
    fn resolve(&self, path: &str) -> Option<Resolved> {
        let mount = self.mount.trim_end_matches('/');
        let rest = path.strip_prefix(mount)?;
        if !rest.is_empty() && !rest.starts_with('/') {
            return None;
        }

        let mut logical = String::with_capacity(path.len());
        logical.push_str(mount);
        let mut file = self.root.clone();
        let mut depth = 0;

        for raw in rest.split('/') {
            let segment = percent_decode_str(raw).decode_utf8().ok()?;
            if segment.is_empty() || segment == "." {
                continue;
            }
            if segment.contains(['/', '\\', '\0']) {
                return None;
            }

            let mut components = Path::new(&*segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => file.push(name),
                _ => return None,
            }
            logical.push('/');
            logical.push_str(&segment);
            depth += 1;
        }

        (depth > 0).then_some(Resolved { logical, file })
    }
}

/// A request path accepted by [`StaticFiles::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    /// Normalized, decoded request path used for cache keys and MIME lookup
    logical: String,
    /// File below the root
    file: PathBuf,
}

#[async_trait]
impl Middleware for StaticFiles {
    async fn call(&self, req: Request<Body>, next: Next) -> Result<Response<Body>> {
        let method = req.method().clone();
        if method != Method::GET && method != Method::HEAD {
            return next.run(req).await;
        }

        let Some(Resolved { logical, file }) = self.resolve(req.uri().path()) else {
            trace!(path = %req.uri().path(), "Path outside static root");
            return next.run(req).await;
        };

        let headers = req.headers().clone();
        let responder = self.responder.clone();
        let enabled = self.enabled;

        // Runs on the blocking pool; a dropped request does not cancel it.
        let response = tokio::task::spawn_blocking(move || {
            serve(&responder, enabled, &logical, &FileResource::new(file), &headers)
        })
        .await
        .map_err(|e| Error::Internal(format!("Static file task failed: {e}")))??;

        match response {
            Some(response) if method == Method::HEAD => {
                let (parts, _) = response.into_parts();
                Ok(Response::from_parts(parts, Body::default()))
            }
            Some(response) => Ok(response),
            None => next.run(req).await,
        }
    }
}

fn serve(
    responder: &Responder,
    enabled: bool,
    target: &str,
    resource: &dyn Resource,
    headers: &HeaderMap,
) -> Result<Option<Response<Body>>> {
    if !enabled {
        return Ok(responder.respond_direct(target, resource, headers)?.into_response());
    }

    let outcome = match responder.respond(target, resource, headers)? {
        Outcome::NotHandled(reason) if reason.allows_direct_fallback() => {
            debug!(path = target, %reason, "Falling back to direct serving");
            responder.respond_direct(target, resource, headers)?
        }
        outcome => outcome,
    };

    Ok(outcome.into_response())
}
