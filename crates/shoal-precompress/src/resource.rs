//! Static resource handles

use bytes::Bytes;
use std::fs::{self, File, Metadata};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// A static asset the responder can serve
///
/// Handles are supplied per request and are not retained by the cache.
pub trait Resource: Send + Sync {
    /// Whether the resource exists
    fn exists(&self) -> bool;

    /// Whether the resource is a directory
    fn is_dir(&self) -> bool;

    /// Length in bytes
    fn len(&self) -> u64;

    /// Whether the resource is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Weak validator used for `ETag` / `If-None-Match`
    fn weak_etag(&self) -> String;

    /// Open a reader over the full contents
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;
}

/// A file on the local filesystem
///
/// Metadata is captured once when the handle is created.
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
    metadata: Option<Metadata>,
}

impl FileResource {
    /// Create a handle for `path`, reading its metadata
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let metadata = fs::metadata(&path).ok();
        Self { path, metadata }
    }

    /// Filesystem path of the resource
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for FileResource {
    fn exists(&self) -> bool {
        self.metadata.is_some()
    }

    fn is_dir(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.is_dir())
    }

    fn len(&self) -> u64 {
        self.metadata.as_ref().map_or(0, |m| m.len())
    }

    fn weak_etag(&self) -> String {
        let modified = self
            .metadata
            .as_ref()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_nanos());
        format!("W/\"{:x}-{:x}\"", self.len(), modified)
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }
}

/// An in-memory resource, for embedded assets
#[derive(Debug, Clone)]
pub struct MemoryResource {
    content: Bytes,
    etag: String,
}

impl MemoryResource {
    /// Create a resource from bytes and a weak validator
    pub fn new(content: impl Into<Bytes>, etag: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            etag: etag.into(),
        }
    }
}

impl Resource for MemoryResource {
    fn exists(&self) -> bool {
        true
    }

    fn is_dir(&self) -> bool {
        false
    }

    fn len(&self) -> u64 {
        self.content.len() as u64
    }

    fn weak_etag(&self) -> String {
        self.etag.clone()
    }

    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.content.clone())))
    }
}
