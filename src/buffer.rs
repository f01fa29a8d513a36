//! Big-endian fixed-width integer helpers used by the frame codec.
//!
//! Callers guarantee the slice is long enough; these panic on short input
//! like any slice index would.

pub fn get_u8(bytes: &[u8]) -> u8 {
    bytes[0]
}

pub fn get_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub fn get_u24(bytes: &[u8]) -> u32 {
    (u32::from(bytes[0]) << 16) | (u32::from(bytes[1]) << 8) | u32::from(bytes[2])
}

/// Reads 32 bits and clears the reserved top bit.
pub fn get_u31(bytes: &[u8]) -> u32 {
    get_u32(bytes) & 0x7fff_ffff
}

pub fn get_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub fn put_u8(bytes: &mut [u8], value: u8) {
    bytes[0] = value;
}

pub fn put_u16(bytes: &mut [u8], value: u16) {
    bytes[..2].copy_from_slice(&value.to_be_bytes());
}

/// Writes the low 24 bits of `value`.
pub fn put_u24(bytes: &mut [u8], value: u32) {
    bytes[0] = (value >> 16) as u8;
    bytes[1] = (value >> 8) as u8;
    bytes[2] = value as u8;
}

/// Writes `value` masked to 31 bits; the reserved bit is always zero.
pub fn put_u31(bytes: &mut [u8], value: u32) {
    put_u32(bytes, value & 0x7fff_ffff);
}

pub fn put_u32(bytes: &mut [u8], value: u32) {
    bytes[..4].copy_from_slice(&value.to_be_bytes());
}
