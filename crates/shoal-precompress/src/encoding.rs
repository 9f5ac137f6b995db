//! Content encodings and `Accept-Encoding` negotiation

use std::fmt;

/// Content encodings the responder can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Identity, the payload is served as stored
    None,
    /// gzip (RFC 1952)
    Gzip,
    /// Brotli (RFC 7932)
    Brotli,
}

impl Encoding {
    /// Compressed encodings in negotiation priority order
    pub const PRIORITY: [Encoding; 2] = [Encoding::Gzip, Encoding::Brotli];

    /// Get the Content-Encoding header value
    ///
    /// Empty for [`Encoding::None`], which never emits the header.
    pub fn encoding_name(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => "gzip",
            Self::Brotli => "br",
        }
    }

    /// Suffix appended to the request path to build the cache key
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Brotli => ".br",
        }
    }

    /// Build the cache key for `path` under this encoding
    pub fn cache_key(&self, path: &str) -> String {
        let mut key = String::with_capacity(path.len() + self.suffix().len());
        key.push_str(path);
        key.push_str(self.suffix());
        key
    }

    /// Whether this is the identity encoding
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Whether an encoder for this variant is compiled into the process
    ///
    /// Brotli is optional and gated on the `brotli` cargo feature.
    pub fn is_available(&self) -> bool {
        match self {
            Self::None | Self::Gzip => true,
            Self::Brotli => cfg!(feature = "brotli"),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "identity"),
            other => write!(f, "{}", other.encoding_name()),
        }
    }
}

/// Negotiate an encoding from the `Accept-Encoding` header value
///
/// Picks the first available encoding in [`Encoding::PRIORITY`] whose name
/// occurs anywhere in the header, ignoring case. Quality values are not
/// interpreted.
pub fn negotiate(accept_encoding: Option<&str>) -> Encoding {
    negotiate_with(accept_encoding, |encoding| encoding.is_available())
}

/// [`negotiate`] with an explicit encoder capability check
pub fn negotiate_with<F>(accept_encoding: Option<&str>, is_available: F) -> Encoding
where
    F: Fn(Encoding) -> bool,
{
    let Some(accept) = accept_encoding else {
        return Encoding::None;
    };
    let accept = accept.to_ascii_lowercase();

    Encoding::PRIORITY
        .into_iter()
        .find(|encoding| accept.contains(encoding.encoding_name()) && is_available(*encoding))
        .unwrap_or(Encoding::None)
}
