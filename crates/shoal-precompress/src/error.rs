//! Error types for pre-compressed serving

use crate::encoding::Encoding;

/// Result type for payload operations
pub type Result<T, E = PrecompressError> = std::result::Result<T, E>;

/// Reasons the pre-compressing path declines a request
///
/// None of these are client-visible failures; the caller falls back to
/// direct serving or to the next handler.
#[derive(Debug, thiserror::Error)]
pub enum PrecompressError {
    /// Resource is missing or is a directory
    #[error("Resource '{path}' does not exist or is a directory")]
    NotApplicable {
        /// Request path
        path: String,
    },

    /// Resource is larger than the cache admits
    #[error("Static file '{key}' is larger than the pre-compression limit ({length} > {limit} bytes)")]
    SizeExceeded {
        /// Cache key that was requested
        key: String,
        /// Resource length in bytes
        length: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Reading or encoding the resource failed
    #[error("Failed to encode '{key}' as {encoding}: {source}")]
    Encoding {
        /// Cache key that was being populated
        key: String,
        /// Encoding that was requested
        encoding: Encoding,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },
}

impl PrecompressError {
    /// Whether a direct, uncompressed response is a valid fallback
    pub fn allows_direct_fallback(&self) -> bool {
        !matches!(self, Self::NotApplicable { .. })
    }
}
