//! LEB128 varint utilities for the hypergraph artifact.
//!
//! Vertex ids and hyperedge ids are small, dense integers, so varints keep
//! the incidence columns compact before zstd compression.

// --- VARINT ENCODING (LEB128) ---

/// Maximum number of bytes needed to encode a u64 as LEB128 varint.
pub(crate) const MAX_VARINT_BYTES: usize = 10;

/// Error type for varint decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarIntError {
    /// Buffer ended before varint was complete (continuation bit was set on last byte).
    /// Contains the number of bytes that were available.
    Truncated(usize),
    /// Varint exceeds maximum size (>10 bytes for u64).
    /// Contains the number of bytes consumed before overflow.
    Overflow(usize),
}

impl std::fmt::Display for VarIntError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VarIntError::Truncated(bytes) => {
                write!(f, "Truncated varint: buffer ended after {} bytes with continuation bit set", bytes)
            }
            VarIntError::Overflow(bytes) => {
                write!(f, "Malformed varint: exceeded 10 bytes at {} bytes consumed", bytes)
            }
        }
    }
}

impl std::error::Error for VarIntError {}

/// Encode a u64 as a variable-length integer (LEB128 format).
///
/// Smaller values use fewer bytes (1 byte for 0-127, 2 bytes for 128-16383, etc.).
///
/// # Returns
/// The number of bytes written to buf.
#[inline]
pub(crate) fn encode_varint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf[i] = byte;
            return i + 1;
        } else {
            buf[i] = byte | 0x80;
            i += 1;
        }
    }
}

/// Decode a variable-length integer from a byte slice.
///
/// # Returns
/// * `Ok((value, bytes_consumed))` - Successfully decoded varint
/// * `Err(VarIntError::Truncated(n))` - Buffer ended with continuation bit set after n bytes
/// * `Err(VarIntError::Overflow(n))` - Varint exceeded 10 bytes
#[inline]
pub(crate) fn decode_varint(buf: &[u8]) -> Result<(u64, usize), VarIntError> {
    let mut value: u64 = 0;
    let mut shift = 0;
    let mut i = 0;
    loop {
        if i >= buf.len() {
            return Err(VarIntError::Truncated(i));
        }
        let byte = buf[i];
        value |= ((byte & 0x7F) as u64) << shift;
        i += 1;
        if byte & 0x80 == 0 {
            return Ok((value, i));
        }
        shift += 7;
        if shift >= 64 {
            return Err(VarIntError::Overflow(i));
        }
    }
}

/// Append every value of `values` to `out` as consecutive varints.
pub(crate) fn extend_varints<I>(out: &mut Vec<u8>, values: I)
where
    I: IntoIterator<Item = u64>,
{
    let mut varint_buf = [0u8; MAX_VARINT_BYTES];
    for value in values {
        let len = encode_varint(value, &mut varint_buf);
        out.extend_from_slice(&varint_buf[..len]);
    }
}

/// Decode exactly `count` consecutive varints starting at `*pos`, advancing it.
pub(crate) fn read_varints(buf: &[u8], pos: &mut usize, count: usize) -> Result<Vec<u64>, VarIntError> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let (value, consumed) = decode_varint(&buf[*pos..])?;
        *pos += consumed;
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_truncation_detection() {
        let mut buf = [0u8; 10];

        // 16384 = [0x80, 0x80, 0x01]
        let len = encode_varint(16384, &mut buf);
        assert_eq!(len, 3);
        assert_eq!(&buf[..3], &[0x80, 0x80, 0x01]);

        assert_eq!(decode_varint(&buf[..3]), Ok((16384, 3)));
        assert_eq!(decode_varint(&buf[..2]), Err(VarIntError::Truncated(2)));
        assert_eq!(decode_varint(&buf[..1]), Err(VarIntError::Truncated(1)));
        assert_eq!(decode_varint(&[]), Err(VarIntError::Truncated(0)));
    }

    #[test]
    fn test_varint_lengths() {
        let mut buf = [0u8; 10];

        let test_cases = [
            (0u64, 1),
            (127u64, 1),
            (128u64, 2),
            (16383u64, 2),
            (16384u64, 3),
            (u64::MAX >> 1, 9),
            (u64::MAX, 10),
        ];

        for (val, expected_len) in test_cases {
            let len = encode_varint(val, &mut buf);
            assert_eq!(len, expected_len, "Encoded length mismatch for {}", val);
            let (decoded, consumed) = decode_varint(&buf[..len]).expect("decode failed");
            assert_eq!(decoded, val);
            assert_eq!(consumed, len);
        }
    }

    #[test]
    fn test_varint_overflow_detection() {
        let buf = [0xFFu8; 11];
        assert_eq!(decode_varint(&buf), Err(VarIntError::Overflow(10)));
    }

    #[test]
    fn test_sequence_helpers() {
        let mut out = Vec::new();
        extend_varints(&mut out, [3u64, 300, 0, 70_000]);

        let mut pos = 0;
        let values = read_varints(&out, &mut pos, 4).unwrap();
        assert_eq!(values, vec![3, 300, 0, 70_000]);
        assert_eq!(pos, out.len());

        let mut pos = 0;
        assert!(read_varints(&out, &mut pos, 5).is_err());
    }
}
