//! Pre-compressed static asset serving for Shoal
//!
//! Serves static resources with their encoded bytes cached for the life of
//! the process, so each (path, encoding) pair is compressed at most once:
//! - gzip (level 9) and brotli (quality 11, behind the `brotli` feature)
//! - Accept-Encoding negotiation with gzip preferred
//! - Media and archive types are never compressed
//! - Resources above a configurable size bypass the cache
//! - Weak ETag / If-None-Match handling
//!
//! ```rust,no_run
//! use shoal_precompress::{PrecompressConfig, StaticFiles};
//!
//! let files = StaticFiles::new("./public", &PrecompressConfig::default()).mount("/assets");
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod cache;
pub mod config;
pub mod encoder;
pub mod encoding;
pub mod error;
pub mod exclusion;
pub mod middleware;
pub mod mime;
pub mod resource;
pub mod responder;

pub use cache::{CacheStats, PayloadCache, DEFAULT_MAX_SIZE};
pub use config::PrecompressConfig;
pub use encoder::Encoder;
pub use encoding::{negotiate, negotiate_with, Encoding};
pub use error::PrecompressError;
pub use exclusion::is_excluded;
pub use middleware::StaticFiles;
pub use mime::{GuessMime, MimeLookup};
pub use resource::{FileResource, MemoryResource, Resource};
pub use responder::{Outcome, Responder};
