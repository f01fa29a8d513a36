//! HPACK primitive codecs: prefix integers (RFC 7541 Section 5.1) and
//! string literals (Section 5.2).

use crate::config::HPACK_MAXIMUM_INTEGER;
use crate::error::HpackError;

#[cfg(feature = "huffman")]
use super::huffman;

/// Bytes `encode_integer` produces for `value` on a `prefix`-bit prefix.
pub fn encoded_integer_size(value: u32, prefix: u8) -> usize {
    let max = (1u32 << prefix) - 1;
    if value < max {
        return 1;
    }
    let mut rest = value - max;
    let mut size = 2;
    while rest >= 128 {
        rest >>= 7;
        size += 1;
    }
    size
}

/// Appends `value` with the top `8 - prefix` bits of the first byte taken
/// from `preamble`.
pub fn encode_integer(out: &mut Vec<u8>, value: u32, prefix: u8, preamble: u8) {
    let max = (1u32 << prefix) - 1;
    if value < max {
        out.push(preamble | value as u8);
        return;
    }
    out.push(preamble | max as u8);
    let mut rest = value - max;
    while rest >= 128 {
        out.push(0x80 | (rest & 0x7f) as u8);
        rest >>= 7;
    }
    out.push(rest as u8);
}

/// Decodes an integer from the low `prefix` bits of `buf[0]` onwards.
/// Returns the value and the number of bytes consumed.
pub fn decode_integer(buf: &[u8], prefix: u8) -> Result<(u32, usize), HpackError> {
    let first = *buf.first().ok_or(HpackError::Truncated)?;
    let max = (1u32 << prefix) - 1;
    let value = u32::from(first) & max;
    if value < max {
        return Ok((value, 1));
    }

    let mut value = u64::from(max);
    let mut shift = 0u32;
    for (i, &b) in buf[1..].iter().enumerate() {
        value += u64::from(b & 0x7f) << shift;
        if value > u64::from(HPACK_MAXIMUM_INTEGER) {
            return Err(HpackError::IntegerOverflow);
        }
        if b & 0x80 == 0 {
            return Ok((value as u32, i + 2));
        }
        shift += 7;
        if shift > 28 {
            return Err(HpackError::IntegerOverflow);
        }
    }
    Err(HpackError::Truncated)
}

/// Appends a string literal, Huffman-coded when that is strictly shorter.
pub fn encode_string(out: &mut Vec<u8>, data: &[u8]) {
    #[cfg(feature = "huffman")]
    {
        let huffman_len = huffman::encoded_len(data);
        if huffman_len < data.len() {
            encode_integer(out, huffman_len as u32, 7, 0x80);
            huffman::encode(data, out);
            return;
        }
    }
    encode_integer(out, data.len() as u32, 7, 0x00);
    out.extend_from_slice(data);
}

/// A string literal as found on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawString<'a> {
    pub huffman: bool,
    pub bytes: &'a [u8],
}

/// Splits a length-prefixed string literal off `buf` without decoding it.
/// Returns the raw literal and the bytes consumed.
pub fn read_string(buf: &[u8]) -> Result<(RawString<'_>, usize), HpackError> {
    let huffman = buf.first().ok_or(HpackError::Truncated)? & 0x80 != 0;
    let (len, used) = decode_integer(buf, 7)?;
    let end = used + len as usize;
    if end > buf.len() {
        return Err(HpackError::Truncated);
    }
    Ok((
        RawString {
            huffman,
            bytes: &buf[used..end],
        },
        end,
    ))
}

impl RawString<'_> {
    /// Plain bytes of the literal, Huffman-decoded if flagged.
    pub fn decode(&self) -> Result<Vec<u8>, HpackError> {
        if !self.huffman {
            return Ok(self.bytes.to_vec());
        }
        #[cfg(feature = "huffman")]
        {
            huffman::decode(self.bytes)
        }
        #[cfg(not(feature = "huffman"))]
        {
            Err(HpackError::HuffmanUnsupported)
        }
    }
}

/// Decodes a string literal. Returns the bytes and the bytes consumed.
pub fn decode_string(buf: &[u8]) -> Result<(Vec<u8>, usize), HpackError> {
    let (raw, used) = read_string(buf)?;
    Ok((raw.decode()?, used))
}
