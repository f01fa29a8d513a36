//! HTTP/2 frame codec (RFC 7540 Section 4 and 6).
//!
//! This layer only knows bit layouts. Semantic checks such as exact payload
//! lengths, stream-id rules and MAX_FRAME_SIZE are the connection's job.

use crate::buffer::{get_u16, get_u24, get_u31, get_u32, put_u16, put_u24, put_u31, put_u32};
use crate::error::{ErrorCode, FrameError};

/// Size of the fixed frame header.
pub const FRAME_HEADER_SIZE: usize = 9;

/// The client connection preface (RFC 7540 Section 3.5).
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Check if data starts with the HTTP/2 connection preface.
pub fn is_preface(data: &[u8]) -> bool {
    data.starts_with(CONNECTION_PREFACE)
}

/// HTTP/2 frame types (RFC 7540 Section 6)
pub mod frame_type {
    pub const DATA: u8 = 0x0;
    pub const HEADERS: u8 = 0x1;
    pub const PRIORITY: u8 = 0x2;
    pub const RST_STREAM: u8 = 0x3;
    pub const SETTINGS: u8 = 0x4;
    pub const PUSH_PROMISE: u8 = 0x5;
    pub const PING: u8 = 0x6;
    pub const GOAWAY: u8 = 0x7;
    pub const WINDOW_UPDATE: u8 = 0x8;
    pub const CONTINUATION: u8 = 0x9;
}

/// HTTP/2 frame flags
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    /// SETTINGS and PING share bit 0 for ACK.
    pub const ACK: u8 = 0x1;
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// The fixed 9-byte frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Payload length, 24 bits.
    pub length: u32,
    pub frame_type: u8,
    pub flags: u8,
    /// 31 bits; the reserved bit is dropped on read and zero on write.
    pub stream_id: u32,
}

impl FrameHeader {
    pub fn new(frame_type: u8, flags: u8, stream_id: u32, length: u32) -> Self {
        Self {
            length,
            frame_type,
            flags,
            stream_id,
        }
    }

    /// Parse a frame header from the first 9 bytes of `data`.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < FRAME_HEADER_SIZE {
            return None;
        }
        Some(Self {
            length: get_u24(&data[0..3]),
            frame_type: data[3],
            flags: data[4],
            stream_id: get_u31(&data[5..9]),
        })
    }

    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut out = [0u8; FRAME_HEADER_SIZE];
        put_u24(&mut out[0..3], self.length);
        out[3] = self.frame_type;
        out[4] = self.flags;
        put_u31(&mut out[5..9], self.stream_id);
        out
    }

    /// Total frame size including header
    pub fn total_size(&self) -> usize {
        FRAME_HEADER_SIZE + self.length as usize
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    pub fn is_end_stream(&self) -> bool {
        self.has_flag(flags::END_STREAM)
    }

    pub fn is_end_headers(&self) -> bool {
        self.has_flag(flags::END_HEADERS)
    }

    pub fn is_ack(&self) -> bool {
        self.has_flag(flags::ACK)
    }
}

/// A decoded frame payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Padding already stripped.
    Data {
        stream_id: u32,
        data: Vec<u8>,
        end_stream: bool,
    },
    /// Padding and priority fields already stripped.
    Headers {
        stream_id: u32,
        fragment: Vec<u8>,
        end_stream: bool,
        end_headers: bool,
    },
    Priority {
        stream_id: u32,
        dependency: u32,
        exclusive: bool,
        weight: u8,
    },
    RstStream {
        stream_id: u32,
        error_code: ErrorCode,
    },
    Settings {
        ack: bool,
        params: Vec<(u16, u32)>,
    },
    PushPromise {
        stream_id: u32,
        promised_stream_id: u32,
    },
    Ping {
        ack: bool,
        data: [u8; 8],
    },
    GoAway {
        last_stream_id: u32,
        error_code: ErrorCode,
        debug_data: Vec<u8>,
    },
    WindowUpdate {
        stream_id: u32,
        increment: u32,
    },
    Continuation {
        stream_id: u32,
        fragment: Vec<u8>,
        end_headers: bool,
    },
    /// Unknown types are carried opaquely (RFC 7540 Section 4.1).
    Unknown {
        frame_type: u8,
        flags: u8,
        stream_id: u32,
        payload: Vec<u8>,
    },
}

impl Frame {
    /// Decodes `payload` as the frame `header` describes.
    pub fn decode(header: &FrameHeader, payload: &[u8]) -> Result<Frame, FrameError> {
        let stream_id = header.stream_id;
        let frame = match header.frame_type {
            frame_type::DATA => Frame::Data {
                stream_id,
                data: strip_padding(header, payload, "DATA")?.to_vec(),
                end_stream: header.is_end_stream(),
            },
            frame_type::HEADERS => {
                let mut fragment = strip_padding(header, payload, "HEADERS")?;
                if header.has_flag(flags::PRIORITY) {
                    require(fragment, 5, "HEADERS")?;
                    // Stream dependency (4 bytes) + weight (1 byte).
                    fragment = &fragment[5..];
                }
                Frame::Headers {
                    stream_id,
                    fragment: fragment.to_vec(),
                    end_stream: header.is_end_stream(),
                    end_headers: header.is_end_headers(),
                }
            }
            frame_type::PRIORITY => {
                require(payload, 5, "PRIORITY")?;
                Frame::Priority {
                    stream_id,
                    dependency: get_u31(payload),
                    exclusive: payload[0] & 0x80 != 0,
                    weight: payload[4],
                }
            }
            frame_type::RST_STREAM => {
                require(payload, 4, "RST_STREAM")?;
                Frame::RstStream {
                    stream_id,
                    error_code: ErrorCode::from_u32(get_u32(payload)),
                }
            }
            frame_type::SETTINGS => Frame::Settings {
                ack: header.is_ack(),
                params: payload
                    .chunks_exact(6)
                    .map(|p| (get_u16(p), get_u32(&p[2..])))
                    .collect(),
            },
            frame_type::PUSH_PROMISE => {
                let rest = strip_padding(header, payload, "PUSH_PROMISE")?;
                require(rest, 4, "PUSH_PROMISE")?;
                Frame::PushPromise {
                    stream_id,
                    promised_stream_id: get_u31(rest),
                }
            }
            frame_type::PING => {
                require(payload, 8, "PING")?;
                let mut data = [0u8; 8];
                data.copy_from_slice(&payload[..8]);
                Frame::Ping {
                    ack: header.is_ack(),
                    data,
                }
            }
            frame_type::GOAWAY => {
                require(payload, 8, "GOAWAY")?;
                Frame::GoAway {
                    last_stream_id: get_u31(payload),
                    error_code: ErrorCode::from_u32(get_u32(&payload[4..])),
                    debug_data: payload[8..].to_vec(),
                }
            }
            frame_type::WINDOW_UPDATE => {
                require(payload, 4, "WINDOW_UPDATE")?;
                Frame::WindowUpdate {
                    stream_id,
                    increment: get_u31(payload),
                }
            }
            frame_type::CONTINUATION => Frame::Continuation {
                stream_id,
                fragment: payload.to_vec(),
                end_headers: header.is_end_headers(),
            },
            other => Frame::Unknown {
                frame_type: other,
                flags: header.flags,
                stream_id,
                payload: payload.to_vec(),
            },
        };
        Ok(frame)
    }

    /// Appends header and payload to `out`. Never pads.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Frame::Data {
                stream_id,
                data,
                end_stream,
            } => {
                let f = if *end_stream { flags::END_STREAM } else { 0 };
                put_frame(out, frame_type::DATA, f, *stream_id, data);
            }
            Frame::Headers {
                stream_id,
                fragment,
                end_stream,
                end_headers,
            } => {
                let mut f = 0;
                if *end_stream {
                    f |= flags::END_STREAM;
                }
                if *end_headers {
                    f |= flags::END_HEADERS;
                }
                put_frame(out, frame_type::HEADERS, f, *stream_id, fragment);
            }
            Frame::Priority {
                stream_id,
                dependency,
                exclusive,
                weight,
            } => {
                let mut payload = [0u8; 5];
                put_u31(&mut payload[..4], *dependency);
                if *exclusive {
                    payload[0] |= 0x80;
                }
                payload[4] = *weight;
                put_frame(out, frame_type::PRIORITY, 0, *stream_id, &payload);
            }
            Frame::RstStream {
                stream_id,
                error_code,
            } => {
                let mut payload = [0u8; 4];
                put_u32(&mut payload, error_code.as_u32());
                put_frame(out, frame_type::RST_STREAM, 0, *stream_id, &payload);
            }
            Frame::Settings { ack, params } => {
                let mut payload = vec![0u8; params.len() * 6];
                for (chunk, (id, value)) in payload.chunks_exact_mut(6).zip(params) {
                    put_u16(&mut chunk[..2], *id);
                    put_u32(&mut chunk[2..], *value);
                }
                let f = if *ack { flags::ACK } else { 0 };
                put_frame(out, frame_type::SETTINGS, f, 0, &payload);
            }
            Frame::PushPromise {
                stream_id,
                promised_stream_id,
            } => {
                let mut payload = [0u8; 4];
                put_u31(&mut payload, *promised_stream_id);
                put_frame(
                    out,
                    frame_type::PUSH_PROMISE,
                    flags::END_HEADERS,
                    *stream_id,
                    &payload,
                );
            }
            Frame::Ping { ack, data } => {
                let f = if *ack { flags::ACK } else { 0 };
                put_frame(out, frame_type::PING, f, 0, data);
            }
            Frame::GoAway {
                last_stream_id,
                error_code,
                debug_data,
            } => {
                let mut payload = vec![0u8; 8];
                put_u31(&mut payload[..4], *last_stream_id);
                put_u32(&mut payload[4..], error_code.as_u32());
                payload.extend_from_slice(debug_data);
                put_frame(out, frame_type::GOAWAY, 0, 0, &payload);
            }
            Frame::WindowUpdate {
                stream_id,
                increment,
            } => {
                let mut payload = [0u8; 4];
                put_u31(&mut payload, *increment);
                put_frame(out, frame_type::WINDOW_UPDATE, 0, *stream_id, &payload);
            }
            Frame::Continuation {
                stream_id,
                fragment,
                end_headers,
            } => {
                let f = if *end_headers { flags::END_HEADERS } else { 0 };
                put_frame(out, frame_type::CONTINUATION, f, *stream_id, fragment);
            }
            Frame::Unknown {
                frame_type,
                flags,
                stream_id,
                payload,
            } => put_frame(out, *frame_type, *flags, *stream_id, payload),
        }
    }

    /// Convenience wrapper around [`Frame::encode`].
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }

    pub fn name(&self) -> &'static str {
        match self {
            Frame::Data { .. } => "DATA",
            Frame::Headers { .. } => "HEADERS",
            Frame::Priority { .. } => "PRIORITY",
            Frame::RstStream { .. } => "RST_STREAM",
            Frame::Settings { .. } => "SETTINGS",
            Frame::PushPromise { .. } => "PUSH_PROMISE",
            Frame::Ping { .. } => "PING",
            Frame::GoAway { .. } => "GOAWAY",
            Frame::WindowUpdate { .. } => "WINDOW_UPDATE",
            Frame::Continuation { .. } => "CONTINUATION",
            Frame::Unknown { .. } => "UNKNOWN",
        }
    }
}

fn put_frame(out: &mut Vec<u8>, frame_type: u8, flags: u8, stream_id: u32, payload: &[u8]) {
    let header = FrameHeader::new(frame_type, flags, stream_id, payload.len() as u32);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(payload);
}

fn require(payload: &[u8], need: usize, frame: &'static str) -> Result<(), FrameError> {
    if payload.len() < need {
        return Err(FrameError::TooShort {
            frame,
            len: payload.len(),
            need,
        });
    }
    Ok(())
}

/// Removes the pad-length byte and trailing padding of a PADDED frame.
fn strip_padding<'a>(
    header: &FrameHeader,
    payload: &'a [u8],
    frame: &'static str,
) -> Result<&'a [u8], FrameError> {
    if !header.has_flag(flags::PADDED) {
        return Ok(payload);
    }
    require(payload, 1, frame)?;
    let pad_length = payload[0] as usize;
    if pad_length >= payload.len() {
        return Err(FrameError::InvalidPadding(frame));
    }
    Ok(&payload[1..payload.len() - pad_length])
}
