//! Error types for every layer of the stack.
//!
//! Each layer returns its own error enum; [`H2Error`] is what the connection
//! surfaces, and [`H2Error::code`] is the code carried to the peer in GOAWAY
//! or RST_STREAM.

use thiserror::Error;

/// HTTP/2 error codes (RFC 7540 Section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NoError = 0x0,
    ProtocolError = 0x1,
    InternalError = 0x2,
    FlowControlError = 0x3,
    SettingsTimeout = 0x4,
    StreamClosed = 0x5,
    FrameSizeError = 0x6,
    RefusedStream = 0x7,
    Cancel = 0x8,
    CompressionError = 0x9,
    ConnectError = 0xa,
    EnhanceYourCalm = 0xb,
    InadequateSecurity = 0xc,
    Http11Required = 0xd,
}

impl ErrorCode {
    /// Unknown codes are treated as INTERNAL_ERROR (RFC 7540 Section 7).
    pub fn from_u32(v: u32) -> Self {
        match v {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            _ => Self::InternalError,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Header list failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// Name or value longer than the list's configured maximum.
    #[error("header name or value exceeds the configured length")]
    InvalidArgument,
    /// No free slot for a new header name.
    #[error("header list is full")]
    OutOfMemory,
    /// A value is empty or carries a merge separator.
    #[error("invalid value for header {0:?}")]
    InvalidValue(String),
}

/// HPACK encode/decode failures (RFC 7541).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HpackError {
    #[error("integer exceeds the decoder ceiling")]
    IntegerOverflow,
    #[error("header block truncated")]
    Truncated,
    #[error("invalid table index {0}")]
    InvalidIndex(u32),
    #[error("EOS symbol inside a huffman string")]
    EosInString,
    #[error("invalid huffman padding")]
    InvalidPadding,
    #[error("huffman strings are not supported by this build")]
    HuffmanUnsupported,
    #[error("dynamic table size update after a header field")]
    LateSizeUpdate,
    #[error("table size {requested} exceeds the negotiated limit {limit}")]
    TableSizeExceeded { requested: usize, limit: usize },
    #[error("entry of {0} bytes does not fit the dynamic table")]
    EntryTooLarge(usize),
    #[error("NUL byte in a header name or value")]
    NulByte,
    #[error(transparent)]
    Headers(#[from] HeaderError),
}

impl HpackError {
    /// Peer-attributable faults are COMPRESSION_ERROR; local limits are
    /// INTERNAL_ERROR.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EntryTooLarge(_) | Self::Headers(_) => ErrorCode::InternalError,
            _ => ErrorCode::CompressionError,
        }
    }
}

/// Frame payload layout failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("{frame} payload too short: {len} bytes, need {need}")]
    TooShort {
        frame: &'static str,
        len: usize,
        need: usize,
    },
    #[error("invalid padding length in {0} frame")]
    InvalidPadding(&'static str),
}

/// Errors surfaced by the HTTP/2 connection.
#[derive(Debug, Error)]
pub enum H2Error {
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("flow control error: {0}")]
    FlowControl(String),
    #[error("frame size error: {0}")]
    FrameSize(String),
    #[error("compression error: {0}")]
    Compression(#[from] HpackError),
    #[error("internal error: {0}")]
    Internal(String),
    /// Confined to one stream: answered with RST_STREAM, the connection lives on.
    #[error("stream {stream_id} error: {code:?}")]
    Stream { stream_id: u32, code: ErrorCode },
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed")]
    Closed,
}

impl H2Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Protocol(_) => ErrorCode::ProtocolError,
            Self::FlowControl(_) => ErrorCode::FlowControlError,
            Self::FrameSize(_) => ErrorCode::FrameSizeError,
            Self::Compression(e) => e.code(),
            Self::Stream { code, .. } => *code,
            Self::Internal(_) | Self::Io(_) => ErrorCode::InternalError,
            Self::Closed => ErrorCode::NoError,
        }
    }

    /// True when the error is confined to a single stream.
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Self::Stream { .. })
    }
}

impl From<FrameError> for H2Error {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::TooShort { .. } => H2Error::FrameSize(e.to_string()),
            FrameError::InvalidPadding(_) => H2Error::Protocol(e.to_string()),
        }
    }
}

impl From<HeaderError> for H2Error {
    fn from(e: HeaderError) -> Self {
        H2Error::Compression(HpackError::Headers(e))
    }
}
