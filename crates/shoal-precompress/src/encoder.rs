//! Streaming encoders run at their maximum compression level

use crate::encoding::Encoding;
use bytes::Bytes;
use std::io::{self, Read};

/// Highest gzip level
pub const GZIP_MAX_LEVEL: u32 = 9;

/// Highest brotli quality
pub const BROTLI_MAX_QUALITY: i32 = 11;

/// Encoder for whole static resources
#[derive(Debug)]
pub struct Encoder;

impl Encoder {
    /// Read `input` to the end and encode it with `encoding`
    ///
    /// [`Encoding::None`] buffers the input unchanged.
    pub fn encode(input: &mut dyn Read, encoding: Encoding, size_hint: usize) -> io::Result<Bytes> {
        match encoding {
            Encoding::None => Self::passthrough(input, size_hint),
            Encoding::Gzip => Self::encode_gzip(input, size_hint),
            Encoding::Brotli => Self::encode_brotli(input, size_hint),
        }
    }

    fn passthrough(input: &mut dyn Read, size_hint: usize) -> io::Result<Bytes> {
        let mut buffer = Vec::with_capacity(size_hint);
        input.read_to_end(&mut buffer)?;
        Ok(Bytes::from(buffer))
    }

    fn encode_gzip(input: &mut dyn Read, size_hint: usize) -> io::Result<Bytes> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(
            Vec::with_capacity(size_hint / 2),
            Compression::new(GZIP_MAX_LEVEL),
        );
        io::copy(input, &mut encoder)?;
        let compressed = encoder.finish()?;
        Ok(Bytes::from(compressed))
    }

    #[cfg(feature = "brotli")]
    fn encode_brotli(mut input: &mut dyn Read, size_hint: usize) -> io::Result<Bytes> {
        let mut compressed = Vec::with_capacity(size_hint / 2);
        let params = brotli::enc::BrotliEncoderParams {
            quality: BROTLI_MAX_QUALITY,
            ..Default::default()
        };

        brotli::BrotliCompress(&mut input, &mut compressed, &params)?;

        Ok(Bytes::from(compressed))
    }

    #[cfg(not(feature = "brotli"))]
    fn encode_brotli(_input: &mut dyn Read, _size_hint: usize) -> io::Result<Bytes> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "brotli support is not compiled in",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> String {
        "Hello, World! This is a test string that should compress well. ".repeat(100)
    }

    #[test]
    fn test_passthrough() {
        let data = sample();
        let out = Encoder::encode(&mut Cursor::new(data.as_bytes()), Encoding::None, data.len())
            .unwrap();
        assert_eq!(&out[..], data.as_bytes());
    }

    #[test]
    fn test_gzip_roundtrip() {
        use flate2::read::GzDecoder;

        let data = sample();
        let compressed =
            Encoder::encode(&mut Cursor::new(data.as_bytes()), Encoding::Gzip, data.len()).unwrap();
        assert!(compressed.len() < data.len());

        let mut decoded = String::new();
        GzDecoder::new(&compressed[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_gzip_is_deterministic() {
        let data = sample();
        let a = Encoder::encode(&mut Cursor::new(data.as_bytes()), Encoding::Gzip, 0).unwrap();
        let b = Encoder::encode(&mut Cursor::new(data.as_bytes()), Encoding::Gzip, 0).unwrap();
        assert_eq!(a, b);
    }

    #[cfg(feature = "brotli")]
    #[test]
    fn test_brotli_roundtrip() {
        let data = sample();
        let compressed =
            Encoder::encode(&mut Cursor::new(data.as_bytes()), Encoding::Brotli, data.len())
                .unwrap();
        assert!(compressed.len() < data.len());

        let mut decoded = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(&compressed[..]), &mut decoded).unwrap();
        assert_eq!(decoded, data.as_bytes());
    }

    #[test]
    fn test_read_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
            }
        }

        let err = Encoder::encode(&mut Broken, Encoding::Gzip, 0).unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
    }
}
