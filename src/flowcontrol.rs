//! HTTP/2 flow control windows (RFC 7540 Section 6.9).

use crate::error::H2Error;
use crate::settings::MAX_WINDOW_SIZE;

/// Lowest a window may fall after an INITIAL_WINDOW_SIZE change.
const MIN_WINDOW_SIZE: i64 = -(1 << 31);

/// A single send or receive window. May go negative after SETTINGS shrink
/// INITIAL_WINDOW_SIZE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowControl {
    window: i64,
}

impl FlowControl {
    pub fn new(initial: u32) -> Self {
        Self {
            window: i64::from(initial),
        }
    }

    pub fn window(&self) -> i64 {
        self.window
    }

    /// Bytes that may be sent right now.
    pub fn available(&self) -> usize {
        self.window.max(0) as usize
    }

    /// Takes `amount` bytes off the window. Fails without change if the
    /// window would go below zero.
    pub fn consume(&mut self, amount: u32) -> Result<(), H2Error> {
        let new = self.window - i64::from(amount);
        if new < 0 {
            return Err(H2Error::FlowControl(format!(
                "{amount} bytes exceed window {}",
                self.window
            )));
        }
        self.window = new;
        Ok(())
    }

    /// Adds a WINDOW_UPDATE increment.
    pub fn increase(&mut self, increment: u32) -> Result<(), H2Error> {
        self.adjust(i64::from(increment))
    }

    /// Applies `new_initial - old_initial` after an INITIAL_WINDOW_SIZE
    /// change.
    pub fn adjust(&mut self, delta: i64) -> Result<(), H2Error> {
        let new = self.window + delta;
        if new > i64::from(MAX_WINDOW_SIZE) || new < MIN_WINDOW_SIZE {
            return Err(H2Error::FlowControl(format!(
                "window {} out of range after {delta:+}",
                self.window
            )));
        }
        self.window = new;
        Ok(())
    }
}

/// Connection and stream windows for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub connection: FlowControl,
    pub stream: FlowControl,
}

impl Windows {
    /// The connection window always starts at 65535 (RFC 7540 Section
    /// 6.9.2); only the stream window follows INITIAL_WINDOW_SIZE.
    pub fn new(initial_stream_window: u32) -> Self {
        Self {
            connection: FlowControl::new(crate::config::DEFAULT_INITIAL_WINDOW_SIZE),
            stream: FlowControl::new(initial_stream_window),
        }
    }

    /// Bytes both windows allow.
    pub fn available(&self) -> usize {
        self.connection.available().min(self.stream.available())
    }

    /// Charges a DATA payload against both windows.
    pub fn consume(&mut self, amount: u32) -> Result<(), H2Error> {
        if i64::from(amount) > self.connection.window().min(self.stream.window()) {
            return Err(H2Error::FlowControl(format!(
                "{amount} bytes exceed window ({} connection, {} stream)",
                self.connection.window(),
                self.stream.window()
            )));
        }
        self.connection.consume(amount)?;
        self.stream.consume(amount)
    }
}
