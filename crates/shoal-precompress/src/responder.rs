//! Per-request responder for pre-compressed static resources

use crate::cache::PayloadCache;
use crate::encoding::{negotiate, Encoding};
use crate::error::PrecompressError;
use crate::exclusion::is_excluded;
use crate::mime::{GuessMime, MimeLookup};
use crate::resource::Resource;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use shoal_core::{Body, Result};
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of handling one request
#[derive(Debug)]
pub enum Outcome {
    /// Full response with body
    Served(Response<Body>),
    /// `304 Not Modified`, no body
    NotModified(Response<Body>),
    /// The responder declined; the caller falls back
    NotHandled(PrecompressError),
}

impl Outcome {
    /// The response, if one was produced
    pub fn into_response(self) -> Option<Response<Body>> {
        match self {
            Self::Served(response) | Self::NotModified(response) => Some(response),
            Self::NotHandled(_) => None,
        }
    }
}

/// Serves static resources from the payload cache
#[derive(Clone)]
pub struct Responder {
    cache: Arc<PayloadCache>,
    mime: Arc<dyn MimeLookup>,
}

impl Responder {
    /// Create a responder over `cache` using `mime_guess` for content types
    pub fn new(cache: Arc<PayloadCache>) -> Self {
        Self::with_mime_lookup(cache, Arc::new(GuessMime))
    }

    /// Create a responder with a custom content type lookup
    pub fn with_mime_lookup(cache: Arc<PayloadCache>, mime: Arc<dyn MimeLookup>) -> Self {
        Self { cache, mime }
    }

    /// The payload cache
    pub fn cache(&self) -> &PayloadCache {
        &self.cache
    }

    /// Serve `resource` for request path `target`
    ///
    /// Blocks while a cache miss is encoded. Only response construction
    /// errors are returned as `Err`.
    pub fn respond(
        &self,
        target: &str,
        resource: &dyn Resource,
        headers: &HeaderMap,
    ) -> Result<Outcome> {
        if !resource.exists() || resource.is_dir() {
            return Ok(Outcome::NotHandled(PrecompressError::NotApplicable {
                path: target.to_string(),
            }));
        }

        let content_type = self.mime.mime_type(target).unwrap_or_default();
        let compressible = !content_type.is_empty() && !is_excluded(&content_type);

        let encoding = if compressible {
            negotiate(header_str(headers, header::ACCEPT_ENCODING))
        } else {
            Encoding::None
        };

        let key = encoding.cache_key(target);
        let payload = match self.cache.get_or_compute(resource, &key, encoding) {
            Ok(payload) => payload,
            Err(e) => return Ok(Outcome::NotHandled(e)),
        };

        debug!(
            path = target,
            %encoding,
            content_type = %content_type,
            bytes = payload.len(),
            "Serving pre-compressed resource"
        );

        let etag = resource.weak_etag();
        if let Some(response) = not_modified(&etag, headers, compressible)? {
            return Ok(Outcome::NotModified(response));
        }

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, payload.len());
        if let Some(value) = header_value(&content_type) {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        if !encoding.is_identity() {
            builder = builder.header(
                header::CONTENT_ENCODING,
                HeaderValue::from_static(encoding.encoding_name()),
            );
        }
        if compressible {
            builder = builder.header(header::VARY, HeaderValue::from_static("accept-encoding"));
        }
        if let Some(value) = header_value(&etag) {
            builder = builder.header(header::ETAG, value);
        }

        Ok(Outcome::Served(builder.body(Body::new(payload))?))
    }

    /// Serve `resource` uncompressed without touching the cache
    ///
    /// Fallback for resources the cache declined. Read failures are
    /// returned as errors since no further fallback exists.
    pub fn respond_direct(
        &self,
        target: &str,
        resource: &dyn Resource,
        headers: &HeaderMap,
    ) -> Result<Outcome> {
        if !resource.exists() || resource.is_dir() {
            return Ok(Outcome::NotHandled(PrecompressError::NotApplicable {
                path: target.to_string(),
            }));
        }

        let etag = resource.weak_etag();
        if let Some(response) = not_modified(&etag, headers, false)? {
            return Ok(Outcome::NotModified(response));
        }

        let mut content = Vec::with_capacity(resource.len() as usize);
        resource.open()?.read_to_end(&mut content)?;

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, content.len());
        if let Some(value) = self.mime.mime_type(target).as_deref().and_then(header_value) {
            builder = builder.header(header::CONTENT_TYPE, value);
        }
        if let Some(value) = header_value(&etag) {
            builder = builder.header(header::ETAG, value);
        }

        debug!(path = target, bytes = content.len(), "Serving resource directly");
        Ok(Outcome::Served(builder.body(Body::new(Bytes::from(content)))?))
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn header_value(value: &str) -> Option<HeaderValue> {
    if value.is_empty() {
        return None;
    }
    match HeaderValue::from_str(value) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(value, "Dropping header value that is not valid in HTTP");
            None
        }
    }
}

/// Build a 304 when `If-None-Match` equals `etag` exactly
fn not_modified(
    etag: &str,
    headers: &HeaderMap,
    compressible: bool,
) -> Result<Option<Response<Body>>> {
    if header_str(headers, header::IF_NONE_MATCH) != Some(etag) {
        return Ok(None);
    }

    let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    if let Some(value) = header_value(etag) {
        builder = builder.header(header::ETAG, value);
    }
    if compressible {
        builder = builder.header(header::VARY, HeaderValue::from_static("accept-encoding"));
    }
    Ok(Some(builder.body(Body::default())?))
}
