//! Variable-byte integer encoding.
//!
//! Unsigned 64-bit integers are encoded as a sequence of 7-bit groups, most
//! significant group first. Every byte except the last has its high bit set
//! as a continuation flag. Small numbers therefore take a single byte, which
//! makes the scheme a good fit for compressing document-id and position
//! deltas in posting lists.

use std::io::{ErrorKind, Read};

use byteorder::ReadBytesExt;

use crate::error::{QuillError, Result};

/// Encode a u64 value as a variable-byte sequence, most significant group first.
///
/// `encode_u64(0)` yields the single byte `0x00`.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut val = value;

    loop {
        groups[count] = (val & 0x7F) as u8;
        count += 1;
        val >>= 7;

        if val == 0 {
            break;
        }
    }

    // Reverse the groups so the most significant one comes first, setting the
    // continuation bit on everything but the final byte.
    let mut bytes = Vec::with_capacity(count);
    for i in (0..count).rev() {
        let mut byte = groups[i];
        if i != 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }

    bytes
}

/// Decode a complete variable-byte sequence back into a u64.
///
/// The slice must contain exactly one encoded integer.
pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    if bytes.is_empty() {
        return Err(QuillError::other("empty varint"));
    }
    if bytes.len() > 10 {
        return Err(QuillError::other("varint overflow"));
    }

    let mut result = 0u64;
    for &byte in bytes {
        result <<= 7;
        result |= (byte & 0x7F) as u64;
    }

    Ok(result)
}

/// Read one encoded integer from a reader.
///
/// Consumes bytes until a byte with the high bit clear is seen. A clean
/// end-of-stream before the first byte yields `Ok(None)` (no more data); an
/// end-of-stream in the middle of an integer is an error, as is any other
/// I/O failure.
pub fn read_one<R: Read>(reader: &mut R) -> Result<Option<u64>> {
    let mut bytes = Vec::new();

    loop {
        match reader.read_u8() {
            Ok(byte) => {
                bytes.push(byte);
                if byte & 0x80 == 0 {
                    return decode_u64(&bytes).map(Some);
                }
            }
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                if bytes.is_empty() {
                    return Ok(None);
                }
                return Err(QuillError::other("truncated varint at end of stream"));
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Encode a u64 and append it to a byte buffer.
pub fn write_u64(buffer: &mut Vec<u8>, value: u64) {
    buffer.extend_from_slice(&encode_u64(value));
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rand::Rng;

    use super::*;

    #[test]
    fn test_encode_zero() {
        assert_eq!(encode_u64(0), vec![0x00]);
    }

    #[test]
    fn test_single_byte_values() {
        for value in [1u64, 5, 64, 126, 127] {
            let encoded = encode_u64(value);
            assert_eq!(encoded.len(), 1);
            assert_eq!(encoded[0], value as u8);
        }
    }

    #[test]
    fn test_continuation_bits() {
        // 0x80 splits into groups [1, 0]: first byte carries the continuation
        // bit, last byte has it clear.
        assert_eq!(encode_u64(0x80), vec![0x81, 0x00]);
        assert_eq!(encode_u64(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encode_u64(0x4000), vec![0x81, 0x80, 0x00]);
    }

    #[test]
    fn test_round_trip_boundary_values() {
        let boundaries = [
            0u64,
            (1 << 7) - 1,
            1 << 7,
            (1 << 14) - 1,
            1 << 14,
            1 << 32,
            u64::MAX - 1,
            u64::MAX,
        ];

        for &value in &boundaries {
            let encoded = encode_u64(value);
            assert_eq!(decode_u64(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_round_trip_random_values() {
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let value: u64 = rng.random();
            let encoded = encode_u64(value);
            assert_eq!(decode_u64(&encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_encoding_is_minimal() {
        assert_eq!(encode_u64(0).len(), 1);
        assert_eq!(encode_u64(127).len(), 1);
        assert_eq!(encode_u64(128).len(), 2);
        assert_eq!(encode_u64((1 << 14) - 1).len(), 2);
        assert_eq!(encode_u64(1 << 14).len(), 3);
        assert_eq!(encode_u64(u64::MAX).len(), 10);
    }

    #[test]
    fn test_read_one_from_stream() {
        let mut buffer = Vec::new();
        write_u64(&mut buffer, 300);
        write_u64(&mut buffer, 0);
        write_u64(&mut buffer, u64::MAX);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_one(&mut cursor).unwrap(), Some(300));
        assert_eq!(read_one(&mut cursor).unwrap(), Some(0));
        assert_eq!(read_one(&mut cursor).unwrap(), Some(u64::MAX));
        assert_eq!(read_one(&mut cursor).unwrap(), None);
    }

    #[test]
    fn test_read_one_clean_eof_is_not_an_error() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(read_one(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_read_one_truncated_is_an_error() {
        // Continuation bit set but the stream ends.
        let mut cursor = Cursor::new(vec![0x81]);
        assert!(read_one(&mut cursor).is_err());
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let oversized = vec![0xFF; 11];
        assert!(decode_u64(&oversized).is_err());
    }
}
