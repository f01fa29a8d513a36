//! Build-time limits and default SETTINGS values.
//!
//! The stack is sized for small devices: every buffer that grows with peer
//! input is capped by one of these constants. Feature selection (Huffman
//! coding, dynamic-table indexing) lives in Cargo features instead.

/// Largest integer the HPACK decoder accepts (RFC 7541 Section 5.1 leaves it
/// unbounded). Anything above is a compression error.
pub const HPACK_MAXIMUM_INTEGER: u32 = (1 << 28) - 1;

/// Ceiling for the HPACK dynamic table, whatever the peer negotiates.
pub const HPACK_MAX_DYNAMIC_TABLE_SIZE: usize = 4096;

/// Maximum accumulated header block (HEADERS + CONTINUATION fragments).
pub const HTTP2_MAX_HBF_BUFFER: usize = 16 * 1024;

/// Maximum buffered body, in either direction, for a single stream.
pub const HTTP2_MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Maximum header name length stored in a [`HeaderList`](crate::HeaderList).
pub const MAX_HEADER_NAME_LEN: usize = 32;

/// Maximum header value length stored in a [`HeaderList`](crate::HeaderList).
pub const MAX_HEADER_VALUE_LEN: usize = 128;

/// Number of entries a connection's header lists can hold.
pub const HEADER_LIST_CAPACITY: usize = 16;

pub const DEFAULT_HEADER_TABLE_SIZE: u32 = 4096;
pub const DEFAULT_ENABLE_PUSH: u32 = 0;
pub const DEFAULT_MAX_CONCURRENT_STREAMS: u32 = 1;
pub const DEFAULT_INITIAL_WINDOW_SIZE: u32 = 65535;
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16384;
pub const DEFAULT_MAX_HEADER_LIST_SIZE: u32 = 2_147_483_647;
