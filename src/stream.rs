//! Stream lifecycle (RFC 7540 Section 5.1).
//!
//! A connection carries one stream at a time, so only the states reachable
//! without PUSH_PROMISE are modelled.

use tracing::debug;

use crate::error::{ErrorCode, H2Error};

/// State of an HTTP/2 stream (RFC 7540 Section 5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    /// No HEADERS seen or sent yet.
    #[default]
    Idle,
    Open,
    /// We sent END_STREAM.
    HalfClosedLocal,
    /// Peer sent END_STREAM.
    HalfClosedRemote,
    Closed,
}

/// The connection's single active stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stream {
    /// Zero while idle and unassigned.
    pub id: u32,
    pub state: StreamState,
}

impl Stream {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            state: StreamState::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.state == StreamState::Idle
    }

    /// True while the peer may still send DATA or HEADERS.
    pub fn can_recv(&self) -> bool {
        matches!(self.state, StreamState::Open | StreamState::HalfClosedLocal)
    }

    /// True while we may still send.
    pub fn can_send(&self) -> bool {
        matches!(self.state, StreamState::Open | StreamState::HalfClosedRemote)
    }

    /// HEADERS sent or received on an idle stream.
    pub fn open(&mut self) -> Result<(), H2Error> {
        if self.state != StreamState::Idle {
            return Err(H2Error::Protocol(format!(
                "stream {} opened twice ({:?})",
                self.id, self.state
            )));
        }
        self.transition(StreamState::Open);
        Ok(())
    }

    /// Peer sent END_STREAM.
    pub fn recv_end_stream(&mut self) -> Result<StreamState, H2Error> {
        let next = match self.state {
            StreamState::Open => StreamState::HalfClosedRemote,
            StreamState::HalfClosedLocal => StreamState::Closed,
            _ => return Err(self.closed_error()),
        };
        self.transition(next);
        Ok(next)
    }

    /// We sent END_STREAM.
    pub fn send_end_stream(&mut self) -> Result<StreamState, H2Error> {
        let next = match self.state {
            StreamState::Open => StreamState::HalfClosedLocal,
            StreamState::HalfClosedRemote => StreamState::Closed,
            _ => return Err(self.closed_error()),
        };
        self.transition(next);
        Ok(next)
    }

    fn transition(&mut self, next: StreamState) {
        debug!(stream_id = self.id, from = ?self.state, to = ?next, "stream state");
        self.state = next;
    }

    fn closed_error(&self) -> H2Error {
        H2Error::Stream {
            stream_id: self.id,
            code: ErrorCode::StreamClosed,
        }
    }
}
