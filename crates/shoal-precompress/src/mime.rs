//! Content type lookup by file extension

/// Resolves a content type from a request path
#[cfg_attr(test, mockall::automock)]
pub trait MimeLookup: Send + Sync {
    /// MIME type for the extension of `path`, if known
    fn mime_type(&self, path: &str) -> Option<String>;
}

/// Extension table lookup backed by `mime_guess`
#[derive(Debug, Default, Clone, Copy)]
pub struct GuessMime;

impl MimeLookup for GuessMime {
    fn mime_type(&self, path: &str) -> Option<String> {
        mime_guess::from_path(path).first_raw().map(str::to_string)
    }
}
