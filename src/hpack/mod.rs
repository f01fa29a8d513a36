//! HPACK header compression (RFC 7541).
//!
//! - [`integer`]: prefix integers and string literals
//! - [`huffman`]: the static Huffman code
//! - [`table`]: static table and circular dynamic table
//! - [`Encoder`] / [`Decoder`]: whole header blocks
//!
//! Encoder and decoder each own a dynamic table: the encoder's mirrors the
//! peer's decoder, the decoder's mirrors the peer's encoder.

pub mod decoder;
pub mod encoder;
pub mod huffman;
pub mod integer;
pub mod table;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use table::{DynamicTable, TableEntry, STATIC_TABLE};

/// The wire representations of a header field (RFC 7541 Section 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// `1xxxxxxx`
    Indexed,
    /// `01xxxxxx`
    LiteralWithIncrementalIndexing,
    /// `001xxxxx`
    SizeUpdate,
    /// `0001xxxx`
    LiteralNeverIndexed,
    /// `0000xxxx`
    LiteralWithoutIndexing,
}

impl Representation {
    /// Classifies a field by the high bits of its first byte.
    pub fn from_preamble(byte: u8) -> Self {
        if byte & 0x80 != 0 {
            Self::Indexed
        } else if byte & 0x40 != 0 {
            Self::LiteralWithIncrementalIndexing
        } else if byte & 0x20 != 0 {
            Self::SizeUpdate
        } else if byte & 0x10 != 0 {
            Self::LiteralNeverIndexed
        } else {
            Self::LiteralWithoutIndexing
        }
    }

    /// Fixed high bits of the first byte.
    pub fn preamble(self) -> u8 {
        match self {
            Self::Indexed => 0x80,
            Self::LiteralWithIncrementalIndexing => 0x40,
            Self::SizeUpdate => 0x20,
            Self::LiteralNeverIndexed => 0x10,
            Self::LiteralWithoutIndexing => 0x00,
        }
    }

    /// Bits left for the integer that follows the preamble.
    pub fn prefix_bits(self) -> u8 {
        match self {
            Self::Indexed => 7,
            Self::LiteralWithIncrementalIndexing => 6,
            Self::SizeUpdate => 5,
            Self::LiteralNeverIndexed | Self::LiteralWithoutIndexing => 4,
        }
    }
}
