//! The HTTP/2 connection state machine.
//!
//! [`Connection`] is sans-I/O: feed it received bytes with
//! [`Connection::recv`] and write out whatever
//! [`Connection::take_pending_send`] returns. It owns everything a
//! connection needs: both settings tables, the single active stream, the
//! header block being reassembled, local and remote flow-control windows,
//! and the HPACK encoder/decoder pair.
//!
//! Errors confined to a stream are answered with RST_STREAM and the
//! connection carries on. Every other error is answered with GOAWAY, the
//! connection is marked closed and the error is returned to the caller.

use std::collections::VecDeque;
use std::mem;

use tracing::{debug, error, trace, warn};

use crate::config::{
    DEFAULT_HEADER_TABLE_SIZE, HEADER_LIST_CAPACITY, HTTP2_MAX_BUFFER_SIZE, HTTP2_MAX_HBF_BUFFER,
};
use crate::error::{ErrorCode, H2Error};
use crate::flowcontrol::{FlowControl, Windows};
use crate::frame::{frame_type, Frame, FrameHeader, CONNECTION_PREFACE, FRAME_HEADER_SIZE};
use crate::handler::{Handler, Request, Response};
use crate::headers::HeaderList;
use crate::hpack::{Decoder, Encoder};
use crate::settings::{settings_id, validate, Settings};
use crate::stream::{Stream, StreamState};

/// Which side of the connection we are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// Body bytes queued for sending, with the offset already sent.
///
/// Sending stops when the flow-control window runs out and resumes from
/// `processed` after a WINDOW_UPDATE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingData {
    pub(crate) buf: Vec<u8>,
    pub(crate) processed: usize,
}

impl OutgoingData {
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.processed
    }

    pub(crate) fn set(&mut self, body: Vec<u8>) {
        self.buf = body;
        self.processed = 0;
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.processed = 0;
    }
}

/// A header block spread over HEADERS and CONTINUATION frames.
#[derive(Debug)]
struct HeaderBlock {
    stream_id: u32,
    end_stream: bool,
    /// Decoded only to keep the HPACK table in sync, then refused.
    refused: bool,
    buf: Vec<u8>,
}

/// One HTTP/2 connection, client or server.
pub struct Connection {
    pub(crate) role: Role,
    pub(crate) local_settings: Settings,
    pub(crate) remote_settings: Settings,
    pub(crate) wait_setting_ack: bool,
    pub(crate) stream: Stream,
    pub(crate) last_open_stream_id: u32,
    /// Highest stream id the peer has used, refused streams included.
    highest_stream_id: u32,
    header_block: Option<HeaderBlock>,
    /// What the peer may still send us.
    pub(crate) local_window: Windows,
    /// What we may still send the peer.
    pub(crate) remote_window: Windows,
    pub(crate) encoder: Encoder,
    decoder: Decoder,
    headers_in: HeaderList,
    pub(crate) headers_out: HeaderList,
    data_in: Vec<u8>,
    pub(crate) data_out: OutgoingData,
    pub(crate) received_goaway: bool,
    pub(crate) sent_goaway: bool,
    pub(crate) closed: bool,
    recv_buf: Vec<u8>,
    preface_pending: bool,
    pub(crate) send_buf: Vec<u8>,
    handler: Option<Box<dyn Handler>>,
    responses: VecDeque<Response>,
}

impl Connection {
    /// Server connection with the default local settings.
    pub fn server(handler: impl Handler + 'static) -> Self {
        Self::server_with_settings(Settings::default(), handler)
    }

    pub fn server_with_settings(settings: Settings, handler: impl Handler + 'static) -> Self {
        Self::new(Role::Server, settings, Some(Box::new(handler)))
    }

    /// Client connection with the default local settings. The preface is
    /// queued at once.
    pub fn client() -> Self {
        Self::client_with_settings(Settings::default())
    }

    pub fn client_with_settings(settings: Settings) -> Self {
        Self::new(Role::Client, settings, None)
    }

    fn new(role: Role, local_settings: Settings, handler: Option<Box<dyn Handler>>) -> Self {
        let remote_settings = Settings::default();
        let mut conn = Self {
            role,
            local_settings,
            remote_settings,
            wait_setting_ack: false,
            stream: Stream::default(),
            last_open_stream_id: 0,
            highest_stream_id: 0,
            header_block: None,
            local_window: Windows::new(local_settings.initial_window_size),
            remote_window: Windows::new(remote_settings.initial_window_size),
            encoder: Encoder::new(remote_settings.header_table_size as usize),
            // The peer encodes against the default table until it ACKs our
            // SETTINGS.
            decoder: Decoder::new(DEFAULT_HEADER_TABLE_SIZE as usize),
            headers_in: HeaderList::new(HEADER_LIST_CAPACITY),
            headers_out: HeaderList::new(HEADER_LIST_CAPACITY),
            data_in: Vec::new(),
            data_out: OutgoingData::default(),
            received_goaway: false,
            sent_goaway: false,
            closed: false,
            recv_buf: Vec::new(),
            preface_pending: role == Role::Server,
            send_buf: Vec::new(),
            handler,
            responses: VecDeque::new(),
        };
        if role == Role::Client {
            conn.send_buf.extend_from_slice(CONNECTION_PREFACE);
        }
        conn.send_settings();
        debug!(?role, "connection created");
        conn
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn local_settings(&self) -> &Settings {
        &self.local_settings
    }

    pub fn remote_settings(&self) -> &Settings {
        &self.remote_settings
    }

    /// True between sending SETTINGS and receiving its ACK.
    pub fn is_waiting_settings_ack(&self) -> bool {
        self.wait_setting_ack
    }

    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn last_open_stream_id(&self) -> u32 {
        self.last_open_stream_id
    }

    pub fn local_window(&self) -> &Windows {
        &self.local_window
    }

    pub fn remote_window(&self) -> &Windows {
        &self.remote_window
    }

    pub fn outgoing_data(&self) -> &OutgoingData {
        &self.data_out
    }

    pub fn received_goaway(&self) -> bool {
        self.received_goaway
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn has_pending_send(&self) -> bool {
        !self.send_buf.is_empty()
    }

    /// Drains the bytes queued for the peer.
    pub fn take_pending_send(&mut self) -> Vec<u8> {
        mem::take(&mut self.send_buf)
    }

    /// Next completed response (client side).
    pub fn poll_response(&mut self) -> Option<Response> {
        self.responses.pop_front()
    }

    /// Feeds received bytes. Partial frames are buffered until complete.
    ///
    /// A connection error queues GOAWAY, closes the connection and is
    /// returned; later calls return [`H2Error::Closed`].
    pub fn recv(&mut self, data: &[u8]) -> Result<(), H2Error> {
        if self.closed {
            return Err(H2Error::Closed);
        }
        self.recv_buf.extend_from_slice(data);

        if self.preface_pending {
            match self.check_preface() {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => return self.fail(e),
            }
        }

        while !self.closed {
            let Some(header) = FrameHeader::from_bytes(&self.recv_buf) else {
                break;
            };
            // Checked before the payload arrives so an oversized frame is
            // never buffered.
            if let Err(e) = self.check_frame_size(&header) {
                return self.fail(e);
            }
            let total = header.total_size();
            if self.recv_buf.len() < total {
                break;
            }
            let frame: Vec<u8> = self.recv_buf.drain(..total).collect();
            if let Err(e) = self.process_frame(&header, &frame[FRAME_HEADER_SIZE..]) {
                self.fail(e)?;
            }
        }
        Ok(())
    }

    /// Ok(true) once the 24-byte preface has been consumed.
    fn check_preface(&mut self) -> Result<bool, H2Error> {
        let n = self.recv_buf.len().min(CONNECTION_PREFACE.len());
        if self.recv_buf[..n] != CONNECTION_PREFACE[..n] {
            return Err(H2Error::Protocol("invalid connection preface".into()));
        }
        if n < CONNECTION_PREFACE.len() {
            return Ok(false);
        }
        self.recv_buf.drain(..CONNECTION_PREFACE.len());
        self.preface_pending = false;
        debug!("connection preface received");
        Ok(true)
    }

    /// Reports an error to the peer. Stream errors return Ok.
    fn fail(&mut self, err: H2Error) -> Result<(), H2Error> {
        if let H2Error::Stream { stream_id, code } = err {
            warn!(stream_id, ?code, "stream error");
            self.send_stream_error(stream_id, code);
            return Ok(());
        }
        match err.code() {
            ErrorCode::InternalError => error!(%err, "connection error"),
            _ => warn!(%err, "connection error"),
        }
        self.send_connection_error(err.code());
        Err(err)
    }

    fn check_frame_size(&self, header: &FrameHeader) -> Result<(), H2Error> {
        if header.length > self.local_settings.max_frame_size {
            return Err(H2Error::FrameSize(format!(
                "{} byte frame exceeds MAX_FRAME_SIZE {}",
                header.length, self.local_settings.max_frame_size
            )));
        }
        Ok(())
    }

    /// Header-only checks that decide between accepting and rejecting a
    /// frame before its payload is looked at.
    fn validate_frame(&self, header: &FrameHeader) -> Result<(), H2Error> {
        if let Some(block) = &self.header_block {
            if header.frame_type != frame_type::CONTINUATION || header.stream_id != block.stream_id
            {
                return Err(H2Error::Protocol(format!(
                    "frame type {:#x} inside header block of stream {}",
                    header.frame_type, block.stream_id
                )));
            }
        }

        let connection_frame = matches!(
            header.frame_type,
            frame_type::SETTINGS | frame_type::PING | frame_type::GOAWAY
        );
        let stream_frame = matches!(
            header.frame_type,
            frame_type::DATA
                | frame_type::HEADERS
                | frame_type::PRIORITY
                | frame_type::RST_STREAM
                | frame_type::PUSH_PROMISE
                | frame_type::CONTINUATION
        );
        if connection_frame && header.stream_id != 0 {
            return Err(H2Error::Protocol(format!(
                "frame type {:#x} on stream {}",
                header.frame_type, header.stream_id
            )));
        }
        if stream_frame && header.stream_id == 0 {
            return Err(H2Error::Protocol(format!(
                "frame type {:#x} on stream 0",
                header.frame_type
            )));
        }

        let len = header.length;
        match header.frame_type {
            frame_type::SETTINGS if header.is_ack() && len != 0 => {
                Err(H2Error::FrameSize("SETTINGS ACK with payload".into()))
            }
            frame_type::SETTINGS if len % 6 != 0 => Err(H2Error::FrameSize(format!(
                "SETTINGS length {len} not a multiple of 6"
            ))),
            frame_type::PING if len != 8 => {
                Err(H2Error::FrameSize(format!("PING length {len}")))
            }
            frame_type::RST_STREAM if len != 4 => {
                Err(H2Error::FrameSize(format!("RST_STREAM length {len}")))
            }
            frame_type::WINDOW_UPDATE if len != 4 => {
                Err(H2Error::FrameSize(format!("WINDOW_UPDATE length {len}")))
            }
            frame_type::PRIORITY if len != 5 => Err(H2Error::Stream {
                stream_id: header.stream_id,
                code: ErrorCode::FrameSizeError,
            }),
            frame_type::CONTINUATION if self.header_block.is_none() => Err(H2Error::Protocol(
                format!("CONTINUATION on stream {} without HEADERS", header.stream_id),
            )),
            _ => Ok(()),
        }
    }

    fn process_frame(&mut self, header: &FrameHeader, payload: &[u8]) -> Result<(), H2Error> {
        self.validate_frame(header)?;
        let frame = Frame::decode(header, payload)?;
        trace!(
            frame = frame.name(),
            stream_id = header.stream_id,
            length = header.length,
            flags = header.flags,
            "recv"
        );

        match frame {
            Frame::Data {
                stream_id,
                data,
                end_stream,
            } => self.on_data(stream_id, header.length, data, end_stream),
            Frame::Headers {
                stream_id,
                fragment,
                end_stream,
                end_headers,
            } => self.on_headers(stream_id, fragment, end_stream, end_headers),
            Frame::Continuation {
                stream_id,
                fragment,
                end_headers,
            } => self.on_continuation(stream_id, fragment, end_headers),
            Frame::Settings { ack, params } => self.on_settings(ack, &params),
            Frame::Ping { ack, data } => {
                if !ack {
                    self.send_ping_ack(data);
                }
                Ok(())
            }
            Frame::GoAway {
                last_stream_id,
                error_code,
                debug_data,
            } => {
                self.on_goaway(last_stream_id, error_code, &debug_data);
                Ok(())
            }
            Frame::WindowUpdate {
                stream_id,
                increment,
            } => self.on_window_update(stream_id, increment),
            Frame::RstStream {
                stream_id,
                error_code,
            } => self.on_rst_stream(stream_id, error_code),
            Frame::PushPromise { stream_id, .. } => Err(H2Error::Protocol(format!(
                "PUSH_PROMISE on stream {stream_id} with push disabled"
            ))),
            Frame::Priority { .. } | Frame::Unknown { .. } => Ok(()),
        }
    }

    /// `length` is the full payload length, padding included, which is what
    /// flow control counts.
    fn on_data(
        &mut self,
        stream_id: u32,
        length: u32,
        data: Vec<u8>,
        end_stream: bool,
    ) -> Result<(), H2Error> {
        // DATA on a stream we no longer track only counts against the
        // connection window.
        self.local_window.connection.consume(length)?;
        if length > 0 {
            self.send_window_update(0, length);
            self.local_window.connection.increase(length)?;
        }

        if stream_id != self.stream.id || !self.stream.can_recv() {
            return Err(self.unexpected_stream_frame(stream_id, "DATA"));
        }
        self.local_window.stream.consume(length)?;
        if self.data_in.len() + data.len() > HTTP2_MAX_BUFFER_SIZE {
            return Err(H2Error::Internal(format!(
                "request body exceeds {HTTP2_MAX_BUFFER_SIZE} bytes"
            )));
        }
        self.data_in.extend_from_slice(&data);

        if end_stream {
            return self.recv_end_stream();
        }
        if length > 0 {
            self.send_window_update(stream_id, length);
            self.local_window.stream.increase(length)?;
        }
        Ok(())
    }

    /// Frames naming a stream other than an open current one: idle streams
    /// are a connection error, closed ones a stream error.
    fn unexpected_stream_frame(&self, stream_id: u32, frame: &str) -> H2Error {
        if stream_id <= self.highest_stream_id {
            H2Error::Stream {
                stream_id,
                code: ErrorCode::StreamClosed,
            }
        } else {
            H2Error::Protocol(format!("{frame} on idle stream {stream_id}"))
        }
    }

    fn on_headers(
        &mut self,
        stream_id: u32,
        fragment: Vec<u8>,
        end_stream: bool,
        end_headers: bool,
    ) -> Result<(), H2Error> {
        let refused = self.accept_headers(stream_id)?;
        let block = HeaderBlock {
            stream_id,
            end_stream,
            refused,
            buf: Vec::new(),
        };
        self.append_fragment(block, fragment, end_headers)
    }

    fn on_continuation(
        &mut self,
        stream_id: u32,
        fragment: Vec<u8>,
        end_headers: bool,
    ) -> Result<(), H2Error> {
        let block = self.header_block.take().ok_or_else(|| {
            H2Error::Protocol(format!("CONTINUATION on stream {stream_id} without HEADERS"))
        })?;
        self.append_fragment(block, fragment, end_headers)
    }

    fn append_fragment(
        &mut self,
        mut block: HeaderBlock,
        fragment: Vec<u8>,
        end_headers: bool,
    ) -> Result<(), H2Error> {
        if block.buf.len() + fragment.len() > HTTP2_MAX_HBF_BUFFER {
            return Err(H2Error::Internal(format!(
                "header block exceeds {HTTP2_MAX_HBF_BUFFER} bytes"
            )));
        }
        block.buf.extend_from_slice(&fragment);
        if end_headers {
            self.finish_header_block(block)
        } else {
            self.header_block = Some(block);
            Ok(())
        }
    }

    /// Decides whether HEADERS on `stream_id` may proceed. Returns true when
    /// the block must be decoded but the stream refused.
    fn accept_headers(&mut self, stream_id: u32) -> Result<bool, H2Error> {
        if stream_id == self.stream.id && !self.stream.is_idle() {
            // Trailers, or the response on the client side.
            if !self.stream.can_recv() {
                return Err(H2Error::Stream {
                    stream_id,
                    code: ErrorCode::StreamClosed,
                });
            }
            return Ok(false);
        }
        if self.role == Role::Client {
            return Err(self.unexpected_stream_frame(stream_id, "HEADERS"));
        }
        if stream_id % 2 == 0 || stream_id <= self.highest_stream_id {
            return Err(H2Error::Protocol(format!(
                "invalid stream id {stream_id} after {}",
                self.highest_stream_id
            )));
        }
        self.highest_stream_id = stream_id;
        if !self.stream.is_idle() {
            // One stream at a time.
            return Ok(true);
        }

        self.reset_stream();
        self.stream = Stream::new(stream_id);
        self.stream.open()?;
        self.last_open_stream_id = stream_id;
        Ok(false)
    }

    fn finish_header_block(&mut self, block: HeaderBlock) -> Result<(), H2Error> {
        if block.refused {
            let mut scratch = HeaderList::new(HEADER_LIST_CAPACITY);
            self.decoder.decode(&block.buf, &mut scratch)?;
            return Err(H2Error::Stream {
                stream_id: block.stream_id,
                code: ErrorCode::RefusedStream,
            });
        }

        self.decoder.decode(&block.buf, &mut self.headers_in)?;
        let size = self.headers_in.total_wire_size();
        if size > self.local_settings.max_header_list_size as usize {
            warn!(size, "header list exceeds MAX_HEADER_LIST_SIZE");
            return Err(H2Error::Stream {
                stream_id: block.stream_id,
                code: ErrorCode::ProtocolError,
            });
        }
        debug!(
            stream_id = block.stream_id,
            count = self.headers_in.count(),
            "header block decoded"
        );

        if block.end_stream {
            return self.recv_end_stream();
        }
        Ok(())
    }

    /// Peer finished its half of the stream.
    fn recv_end_stream(&mut self) -> Result<(), H2Error> {
        self.stream.recv_end_stream()?;
        match self.role {
            Role::Server => self.respond()?,
            Role::Client => self.complete_response()?,
        }
        self.after_end_stream();
        Ok(())
    }

    /// Validates the request, runs the handler and sends its response.
    fn respond(&mut self) -> Result<(), H2Error> {
        let stream_id = self.stream.id;
        let malformed = H2Error::Stream {
            stream_id,
            code: ErrorCode::ProtocolError,
        };
        let required = [":method", ":scheme", ":path"];
        if required.iter().any(|name| self.headers_in.get(name).is_none()) {
            warn!(stream_id, "request lacks required pseudo-headers");
            return Err(malformed);
        }
        if let Err(e) = self.headers_in.validate() {
            warn!(stream_id, %e, "malformed request headers");
            return Err(malformed);
        }

        let request = Request {
            headers: &self.headers_in,
            body: &self.data_in,
        };
        let response = match self.handler.as_mut() {
            Some(handler) => handler.handle(&request),
            None => return Err(H2Error::Internal("server without a handler".into())),
        };
        debug!(stream_id, status = response.status, "response ready");

        let internal = H2Error::Stream {
            stream_id,
            code: ErrorCode::InternalError,
        };
        if response.body.len() > HTTP2_MAX_BUFFER_SIZE {
            error!(stream_id, len = response.body.len(), "response body too large");
            return Err(internal);
        }
        self.headers_out.clear();
        let status = response.status.to_string();
        let built = self.headers_out.set(":status", &status).and_then(|()| {
            response
                .headers
                .iter()
                .try_for_each(|h| self.headers_out.add(&h.name, &h.value))
        });
        if let Err(e) = built {
            error!(stream_id, %e, "response headers do not fit");
            return Err(internal);
        }

        let end_stream = response.body.is_empty();
        self.data_out.set(response.body);
        self.send_headers(end_stream)?;
        self.send_data()
    }

    fn complete_response(&mut self) -> Result<(), H2Error> {
        let stream_id = self.stream.id;
        let status = self
            .headers_in
            .get(":status")
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or(H2Error::Stream {
                stream_id,
                code: ErrorCode::ProtocolError,
            })?;
        let headers = self
            .headers_in
            .iter()
            .filter(|h| !h.name.starts_with(':'))
            .cloned()
            .collect();
        debug!(stream_id, status, "response received");
        self.responses.push_back(Response {
            status,
            headers,
            body: mem::take(&mut self.data_in),
        });
        Ok(())
    }

    fn on_settings(&mut self, ack: bool, params: &[(u16, u32)]) -> Result<(), H2Error> {
        if ack {
            self.wait_setting_ack = false;
            self.decoder
                .set_max_table_size(self.local_settings.header_table_size as usize);
            debug!("settings acknowledged");
            return Ok(());
        }

        for &(id, value) in params {
            validate(id, value)?;
            match id {
                settings_id::INITIAL_WINDOW_SIZE => {
                    // Delta against the value being replaced.
                    let delta =
                        i64::from(value) - i64::from(self.remote_settings.initial_window_size);
                    self.remote_window.stream.adjust(delta)?;
                }
                settings_id::HEADER_TABLE_SIZE => {
                    self.encoder.set_max_table_size(value as usize);
                }
                _ => {}
            }
            if self.remote_settings.apply(id, value)? {
                debug!(id, value, "remote setting applied");
            }
        }
        self.send_settings_ack();
        // A larger window may unblock pending data.
        self.send_data()
    }

    fn on_goaway(&mut self, last_stream_id: u32, error_code: ErrorCode, debug_data: &[u8]) {
        if error_code != ErrorCode::NoError {
            warn!(
                ?error_code,
                last_stream_id,
                reason = %String::from_utf8_lossy(debug_data),
                "peer closed the connection"
            );
            self.closed = true;
            return;
        }
        if self.sent_goaway {
            debug!("peer answered our GOAWAY");
            self.closed = true;
            return;
        }
        debug!(last_stream_id, "GOAWAY received");
        self.received_goaway = true;
        if self.stream.is_idle() || self.stream.id > last_stream_id {
            if !self.stream.is_idle() {
                debug!(stream_id = self.stream.id, "stream beyond GOAWAY dropped");
            }
            self.reset_stream();
            self.send_goaway(ErrorCode::NoError);
            self.closed = true;
        }
    }

    fn on_window_update(&mut self, stream_id: u32, increment: u32) -> Result<(), H2Error> {
        if increment == 0 {
            if stream_id == 0 {
                return Err(H2Error::Protocol("zero WINDOW_UPDATE increment".into()));
            }
            return Err(H2Error::Stream {
                stream_id,
                code: ErrorCode::ProtocolError,
            });
        }

        if stream_id == 0 {
            self.remote_window.connection.increase(increment)?;
        } else if stream_id == self.stream.id && !self.stream.is_idle() {
            if self.remote_window.stream.increase(increment).is_err() {
                return Err(H2Error::Stream {
                    stream_id,
                    code: ErrorCode::FlowControlError,
                });
            }
        } else if stream_id > self.highest_stream_id {
            return Err(H2Error::Protocol(format!(
                "WINDOW_UPDATE on idle stream {stream_id}"
            )));
        }
        // Updates for closed streams are ignored.
        self.send_data()
    }

    fn on_rst_stream(&mut self, stream_id: u32, error_code: ErrorCode) -> Result<(), H2Error> {
        if stream_id == self.stream.id && !self.stream.is_idle() {
            debug!(stream_id, ?error_code, "stream reset by peer");
            self.stream.state = StreamState::Closed;
            self.after_end_stream();
            return Ok(());
        }
        if stream_id > self.highest_stream_id {
            return Err(H2Error::Protocol(format!(
                "RST_STREAM on idle stream {stream_id}"
            )));
        }
        Ok(())
    }

    /// Once the stream is closed: finish the connection after a GOAWAY, or
    /// get ready for the next stream.
    pub(crate) fn after_end_stream(&mut self) {
        if self.stream.state != StreamState::Closed {
            return;
        }
        if self.received_goaway {
            self.reset_stream();
            self.send_goaway(ErrorCode::NoError);
            self.closed = true;
        } else {
            self.reset_stream();
        }
    }

    /// Back to a fresh idle stream with full stream windows.
    pub(crate) fn reset_stream(&mut self) {
        debug!(stream_id = self.stream.id, "stream reset");
        self.stream = Stream::default();
        self.headers_in.clear();
        self.headers_out.clear();
        self.data_in.clear();
        self.data_out.clear();
        self.local_window.stream = FlowControl::new(self.local_settings.initial_window_size);
        self.remote_window.stream = FlowControl::new(self.remote_settings.initial_window_size);
    }

    /// Opens the next client stream and sends `headers` plus `body`.
    ///
    /// Returns the stream id. Only one request may be in flight; completed
    /// responses come out of [`Connection::poll_response`].
    pub fn send_request(&mut self, headers: &HeaderList, body: &[u8]) -> Result<u32, H2Error> {
        if self.closed {
            return Err(H2Error::Closed);
        }
        if self.role != Role::Client {
            return Err(H2Error::Internal("send_request on a server connection".into()));
        }
        if self.received_goaway {
            return Err(H2Error::Protocol("peer is going away".into()));
        }
        if !self.stream.is_idle() {
            return Err(H2Error::Internal(format!(
                "stream {} still in flight",
                self.stream.id
            )));
        }
        if body.len() > HTTP2_MAX_BUFFER_SIZE {
            error!(len = body.len(), "request body too large");
            return Err(H2Error::Internal(format!(
                "request body exceeds {HTTP2_MAX_BUFFER_SIZE} bytes"
            )));
        }

        let stream_id = self.next_stream_id();
        self.reset_stream();
        self.stream = Stream::new(stream_id);
        self.stream.open()?;
        self.last_open_stream_id = stream_id;
        self.highest_stream_id = stream_id;
        self.headers_out = headers.clone();
        self.data_out.set(body.to_vec());

        self.send_headers(body.is_empty())?;
        self.send_data()?;
        Ok(stream_id)
    }

    /// Client streams are odd, starting at 1.
    fn next_stream_id(&self) -> u32 {
        if self.last_open_stream_id == 0 {
            1
        } else {
            self.last_open_stream_id + 2
        }
    }
}
