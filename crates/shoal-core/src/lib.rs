//! # Shoal Core
//!
//! Core types, traits, and error handling for the Shoal static asset server.
//!
//! This crate provides the foundational abstractions shared by the other crates:
//! - Middleware trait and chain
//! - Response helpers
//! - Error types

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod middleware;
pub mod response;

pub use error::{Error, Result};
pub use middleware::{Body, Middleware, Next};
pub use response::ResponseBuilder;

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::middleware::{Body, Middleware, Next};
    pub use crate::response::{responses, ResponseBuilder};
}
