//! HTTP/2 SETTINGS parameters (RFC 7540 Section 6.5).

use crate::config::{
    DEFAULT_ENABLE_PUSH, DEFAULT_HEADER_TABLE_SIZE, DEFAULT_INITIAL_WINDOW_SIZE,
    DEFAULT_MAX_CONCURRENT_STREAMS, DEFAULT_MAX_FRAME_SIZE, DEFAULT_MAX_HEADER_LIST_SIZE,
};
use crate::error::H2Error;

/// HTTP/2 SETTINGS identifiers (RFC 7540 Section 6.5.2)
pub mod settings_id {
    pub const HEADER_TABLE_SIZE: u16 = 0x1;
    pub const ENABLE_PUSH: u16 = 0x2;
    pub const MAX_CONCURRENT_STREAMS: u16 = 0x3;
    pub const INITIAL_WINDOW_SIZE: u16 = 0x4;
    pub const MAX_FRAME_SIZE: u16 = 0x5;
    pub const MAX_HEADER_LIST_SIZE: u16 = 0x6;
}

/// Largest flow-control window and INITIAL_WINDOW_SIZE (2^31 - 1).
pub const MAX_WINDOW_SIZE: u32 = 0x7fff_ffff;

/// Bounds of SETTINGS_MAX_FRAME_SIZE.
pub const MIN_MAX_FRAME_SIZE: u32 = 16_384;
pub const MAX_MAX_FRAME_SIZE: u32 = 16_777_215;

/// One endpoint's settings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub header_table_size: u32,
    pub enable_push: u32,
    pub max_concurrent_streams: u32,
    pub initial_window_size: u32,
    pub max_frame_size: u32,
    pub max_header_list_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_table_size: DEFAULT_HEADER_TABLE_SIZE,
            enable_push: DEFAULT_ENABLE_PUSH,
            max_concurrent_streams: DEFAULT_MAX_CONCURRENT_STREAMS,
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_header_list_size: DEFAULT_MAX_HEADER_LIST_SIZE,
        }
    }
}

impl Settings {
    /// Value of a known identifier.
    pub fn get(&self, id: u16) -> Option<u32> {
        let value = match id {
            settings_id::HEADER_TABLE_SIZE => self.header_table_size,
            settings_id::ENABLE_PUSH => self.enable_push,
            settings_id::MAX_CONCURRENT_STREAMS => self.max_concurrent_streams,
            settings_id::INITIAL_WINDOW_SIZE => self.initial_window_size,
            settings_id::MAX_FRAME_SIZE => self.max_frame_size,
            settings_id::MAX_HEADER_LIST_SIZE => self.max_header_list_size,
            _ => return None,
        };
        Some(value)
    }

    /// Validates and stores one parameter. Unknown identifiers are ignored
    /// (RFC 7540 Section 6.5.2); the return value tells whether it was known.
    pub fn apply(&mut self, id: u16, value: u32) -> Result<bool, H2Error> {
        validate(id, value)?;
        let slot = match id {
            settings_id::HEADER_TABLE_SIZE => &mut self.header_table_size,
            settings_id::ENABLE_PUSH => &mut self.enable_push,
            settings_id::MAX_CONCURRENT_STREAMS => &mut self.max_concurrent_streams,
            settings_id::INITIAL_WINDOW_SIZE => &mut self.initial_window_size,
            settings_id::MAX_FRAME_SIZE => &mut self.max_frame_size,
            settings_id::MAX_HEADER_LIST_SIZE => &mut self.max_header_list_size,
            _ => return Ok(false),
        };
        *slot = value;
        Ok(true)
    }

    /// All six parameters as `(identifier, value)` pairs, in identifier order.
    pub fn to_params(&self) -> Vec<(u16, u32)> {
        (settings_id::HEADER_TABLE_SIZE..=settings_id::MAX_HEADER_LIST_SIZE)
            .filter_map(|id| self.get(id).map(|v| (id, v)))
            .collect()
    }
}

/// Per-parameter range checks.
pub fn validate(id: u16, value: u32) -> Result<(), H2Error> {
    match id {
        settings_id::ENABLE_PUSH if value > 1 => Err(H2Error::Protocol(format!(
            "ENABLE_PUSH must be 0 or 1, got {value}"
        ))),
        settings_id::INITIAL_WINDOW_SIZE if value > MAX_WINDOW_SIZE => Err(H2Error::FlowControl(
            format!("INITIAL_WINDOW_SIZE {value} above 2^31-1"),
        )),
        settings_id::MAX_FRAME_SIZE
            if !(MIN_MAX_FRAME_SIZE..=MAX_MAX_FRAME_SIZE).contains(&value) =>
        {
            Err(H2Error::Protocol(format!("MAX_FRAME_SIZE {value} out of range")))
        }
        _ => Ok(()),
    }
}
