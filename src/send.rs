//! Outgoing frames: everything the connection queues for the peer.

use tracing::{debug, trace};

use crate::connection::Connection;
use crate::error::{ErrorCode, H2Error};
use crate::frame::Frame;
use crate::stream::StreamState;

impl Connection {
    pub(crate) fn send_frame(&mut self, frame: &Frame) {
        trace!(frame = frame.name(), "send");
        frame.encode(&mut self.send_buf);
    }

    /// Our local settings, all six parameters.
    pub(crate) fn send_settings(&mut self) {
        let params = self.local_settings.to_params();
        self.send_frame(&Frame::Settings { ack: false, params });
        self.wait_setting_ack = true;
    }

    pub(crate) fn send_settings_ack(&mut self) {
        self.send_frame(&Frame::Settings {
            ack: true,
            params: Vec::new(),
        });
    }

    pub(crate) fn send_ping_ack(&mut self, data: [u8; 8]) {
        self.send_frame(&Frame::Ping { ack: true, data });
    }

    pub(crate) fn send_window_update(&mut self, stream_id: u32, increment: u32) {
        self.send_frame(&Frame::WindowUpdate {
            stream_id,
            increment,
        });
    }

    pub(crate) fn send_goaway(&mut self, code: ErrorCode) {
        let last_stream_id = self.last_open_stream_id;
        self.send_frame(&Frame::GoAway {
            last_stream_id,
            error_code: code,
            debug_data: Vec::new(),
        });
        self.sent_goaway = true;
    }

    /// GOAWAY with `code`; the connection is closed afterwards.
    pub(crate) fn send_connection_error(&mut self, code: ErrorCode) {
        self.send_goaway(code);
        self.closed = true;
    }

    /// RST_STREAM with `code`. Resets the current stream if it is the one
    /// named.
    pub(crate) fn send_stream_error(&mut self, stream_id: u32, code: ErrorCode) {
        self.send_frame(&Frame::RstStream {
            stream_id,
            error_code: code,
        });
        if stream_id == self.stream.id && !self.stream.is_idle() {
            self.stream.state = StreamState::Closed;
            self.after_end_stream();
        }
    }

    /// HPACK-encodes `headers_out` into a HEADERS frame plus as many
    /// CONTINUATION frames as MAX_FRAME_SIZE requires.
    pub(crate) fn send_headers(&mut self, end_stream: bool) -> Result<(), H2Error> {
        let mut block = Vec::new();
        self.encoder.encode(&self.headers_out, &mut block);

        let stream_id = self.stream.id;
        let max_frame = self.remote_settings.max_frame_size as usize;
        let mut chunks = block.chunks(max_frame).peekable();
        let first = chunks.next().unwrap_or(&[]);
        self.send_frame(&Frame::Headers {
            stream_id,
            fragment: first.to_vec(),
            end_stream,
            end_headers: chunks.peek().is_none(),
        });
        while let Some(chunk) = chunks.next() {
            self.send_frame(&Frame::Continuation {
                stream_id,
                fragment: chunk.to_vec(),
                end_headers: chunks.peek().is_none(),
            });
        }

        if end_stream {
            self.stream.send_end_stream()?;
            self.after_end_stream();
        }
        Ok(())
    }

    /// Sends as much of `data_out` as the windows allow, one frame of at
    /// most MAX_FRAME_SIZE at a time. Stops when the window is exhausted;
    /// the next WINDOW_UPDATE or SETTINGS resumes from `processed`.
    pub(crate) fn send_data(&mut self) -> Result<(), H2Error> {
        if !self.stream.can_send() {
            return Ok(());
        }
        let stream_id = self.stream.id;
        let max_frame = self.remote_settings.max_frame_size as usize;

        while self.data_out.remaining() > 0 {
            let n = self
                .remote_window
                .available()
                .min(max_frame)
                .min(self.data_out.remaining());
            if n == 0 {
                debug!(
                    stream_id,
                    processed = self.data_out.processed(),
                    size = self.data_out.size(),
                    "waiting for WINDOW_UPDATE"
                );
                break;
            }

            let start = self.data_out.processed;
            let data = self.data_out.buf[start..start + n].to_vec();
            self.remote_window.consume(n as u32)?;
            self.data_out.processed += n;
            let end_stream = self.data_out.remaining() == 0;
            self.send_frame(&Frame::Data {
                stream_id,
                data,
                end_stream,
            });
            if end_stream {
                self.stream.send_end_stream()?;
                self.after_end_stream();
            }
        }
        Ok(())
    }
}
