/// zlib (deflate) wrapper for transform stage payloads
use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};
use std::io::Write;
use thiserror::Error;

/// Upper bound on inflated output: 64 KB, inclusive.
/// Real payloads are a few KB at most; this caps decompression bombs.
pub const MAX_INFLATED_SIZE: usize = 64 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompressError {
    #[error("Corrupt deflate stream: {0}")]
    Corrupt(String),

    #[error("Deflate stream ended early")]
    Truncated,

    #[error("Trailing bytes after deflate stream")]
    TrailingBytes,

    #[error("Inflated data exceeds {MAX_INFLATED_SIZE} bytes")]
    TooLarge,

    #[error("Inflated data is not valid UTF-8")]
    InvalidUtf8,
}

/// Compress data into a zlib stream (header + deflate + Adler-32)
pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::best());
    // Writes go to a Vec, so the only failure mode would be an allocator abort.
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .unwrap_or_else(|e| unreachable!("in-memory deflate failed: {e}"))
}

/// Decompress a complete zlib stream produced by `deflate()`
///
/// Unlike a plain reader this insists on the end-of-stream marker and on
/// consuming every input byte, so truncated or padded input is rejected.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut inflater = Decompress::new(true);
    let mut out: Vec<u8> = Vec::with_capacity((data.len() * 4).min(MAX_INFLATED_SIZE));

    loop {
        if out.len() == out.capacity() {
            if out.len() > MAX_INFLATED_SIZE {
                return Err(CompressError::TooLarge);
            }
            // One byte of headroom past the limit tells a stream that ends
            // exactly at the limit apart from one that keeps going
            let grow = out.capacity().max(256).min(MAX_INFLATED_SIZE + 1 - out.len());
            out.reserve_exact(grow);
        }

        let consumed = inflater.total_in() as usize;
        let produced = out.len();

        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CompressError::Corrupt(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled = inflater.total_in() as usize == consumed && out.len() == produced;
                if stalled && out.len() < out.capacity() {
                    return Err(CompressError::Truncated);
                }
            }
        }
    }

    if out.len() > MAX_INFLATED_SIZE {
        return Err(CompressError::TooLarge);
    }
    if inflater.total_in() as usize != data.len() {
        return Err(CompressError::TrailingBytes);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_inflate_roundtrip() {
        let original = b"Hello, QR share! This is a test message.";
        let compressed = deflate(original);
        let decompressed = inflate(&compressed).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_deflate_empty_data() {
        let compressed = deflate(b"");
        assert!(!compressed.is_empty());
        assert_eq!(inflate(&compressed).unwrap(), b"");
    }

    #[test]
    fn test_deflate_has_zlib_header() {
        let compressed = deflate(b"abc");
        // CMF = deflate with 32K window; header checksum is a multiple of 31
        assert_eq!(compressed[0], 0x78);
        assert_eq!(((compressed[0] as u16) << 8 | compressed[1] as u16) % 31, 0);
    }

    #[test]
    fn test_deflate_repetitive_data() {
        let original = "AAAAAABBBBBBCCCCCCDDDDDD".repeat(100);
        let compressed = deflate(original.as_bytes());

        assert!(compressed.len() < original.len() / 2);
        assert_eq!(inflate(&compressed).unwrap(), original.as_bytes());
    }

    #[test]
    fn test_inflate_grows_output_buffer() {
        // Highly compressible input forces several buffer reservations
        let original = vec![0x42u8; 40_000];
        let compressed = deflate(&original);
        assert_eq!(inflate(&compressed).unwrap(), original);
    }

    #[test]
    fn test_inflate_invalid_data() {
        assert!(inflate(b"not compressed data").is_err());
    }

    #[test]
    fn test_inflate_empty_input() {
        assert_eq!(inflate(b""), Err(CompressError::Truncated));
    }

    #[test]
    fn test_inflate_truncated() {
        let compressed = deflate(b"The quick brown fox jumps over the lazy dog.");
        let cut = &compressed[..compressed.len() - 3];
        assert!(inflate(cut).is_err());
    }

    #[test]
    fn test_inflate_trailing_bytes() {
        let mut compressed = deflate(b"payload");
        compressed.extend_from_slice(b"junk");
        assert_eq!(inflate(&compressed), Err(CompressError::TrailingBytes));
    }

    #[test]
    fn test_inflate_rejects_bomb() {
        let original = vec![0u8; MAX_INFLATED_SIZE + 1024];
        let compressed = deflate(&original);
        assert_eq!(inflate(&compressed), Err(CompressError::TooLarge));
    }

    #[test]
    fn test_inflate_accepts_exactly_the_limit() {
        let original = vec![b'a'; MAX_INFLATED_SIZE];
        assert_eq!(inflate(&deflate(&original)).unwrap(), original);

        let over = vec![b'a'; MAX_INFLATED_SIZE + 1];
        assert_eq!(inflate(&deflate(&over)), Err(CompressError::TooLarge));
    }

    #[test]
    fn test_inflate_detects_checksum_mismatch() {
        let mut compressed = deflate(b"checksummed text");
        let last = compressed.len() - 1;
        compressed[last] ^= 0xFF;
        assert!(inflate(&compressed).is_err());
    }
}
