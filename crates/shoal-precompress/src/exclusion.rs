//! MIME types that are never worth compressing

/// Media families and container formats that are already compressed
pub const EXCLUDED_MIME_TYPES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/compress",
    "application/zip",
    "application/gzip",
    "application/bzip2",
    "application/brotli",
    "application/x-xz",
    "application/x-rar-compressed",
];

/// Check whether a content type is excluded from compression
///
/// An empty MIME type is not excluded here; callers treat an unknown type
/// as uncompressible on their own.
pub fn is_excluded(mime_type: &str) -> bool {
    if mime_type.is_empty() {
        return false;
    }
    let mime = mime_type.to_ascii_lowercase();
    EXCLUDED_MIME_TYPES
        .iter()
        .any(|excluded| mime.contains(excluded))
}
