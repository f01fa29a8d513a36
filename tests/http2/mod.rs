//! HTTP/2 connection integration tests

mod errors;

use h2_embedded::{
    Connection, Frame, FrameHeader, HeaderList, Request, Response, CONNECTION_PREFACE,
    FRAME_HEADER_SIZE,
};

/// `:method GET`, `:scheme http`, `:path /` from the static table.
pub const GET_ROOT: [u8; 3] = [0x82, 0x86, 0x84];

/// Splits a byte stream into decoded frames.
pub fn frames(bytes: &[u8]) -> Vec<Frame> {
    let mut out = Vec::new();
    let mut rest = bytes;
    while let Some(header) = FrameHeader::from_bytes(rest) {
        let total = header.total_size();
        out.push(Frame::decode(&header, &rest[FRAME_HEADER_SIZE..total]).unwrap());
        rest = &rest[total..];
    }
    assert!(rest.is_empty(), "trailing bytes");
    out
}

/// Echoes the request body back, tagging the response with the path.
pub fn echo_server() -> Connection {
    Connection::server(|req: &Request<'_>| {
        Response::new(200)
            .with_header("x-path", req.path().unwrap_or(""))
            .with_body(req.body.to_vec())
    })
}

/// Runs the client half of the handshake against `server`: preface,
/// SETTINGS with `params`, and the ACK of the server's SETTINGS. Drains
/// everything the server queued.
pub fn handshake(server: &mut Connection, params: Vec<(u16, u32)>) {
    let mut input = CONNECTION_PREFACE.to_vec();
    Frame::Settings { ack: false, params }.encode(&mut input);
    Frame::Settings {
        ack: true,
        params: Vec::new(),
    }
    .encode(&mut input);
    server.recv(&input).unwrap();
    assert!(!server.is_waiting_settings_ack());
    server.take_pending_send();
}

pub fn headers_frame(stream_id: u32, fragment: &[u8], end_stream: bool) -> Vec<u8> {
    Frame::Headers {
        stream_id,
        fragment: fragment.to_vec(),
        end_stream,
        end_headers: true,
    }
    .to_vec()
}

pub fn data_frame(stream_id: u32, data: &[u8], end_stream: bool) -> Vec<u8> {
    Frame::Data {
        stream_id,
        data: data.to_vec(),
        end_stream,
    }
    .to_vec()
}

pub fn raw_frame(kind: u8, frame_flags: u8, stream_id: u32, payload: &[u8]) -> Vec<u8> {
    let header = FrameHeader::new(kind, frame_flags, stream_id, payload.len() as u32);
    let mut out = header.to_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

pub fn request_headers(method: &str, path: &str) -> HeaderList {
    let mut headers = HeaderList::new(8);
    headers.add(":method", method).unwrap();
    headers.add(":scheme", "http").unwrap();
    headers.add(":path", path).unwrap();
    headers.add(":authority", "device.local").unwrap();
    headers
}

/// Shuttles bytes between the two ends until neither has anything to say.
pub fn pump(client: &mut Connection, server: &mut Connection) {
    loop {
        let to_server = client.take_pending_send();
        let to_client = server.take_pending_send();
        if to_server.is_empty() && to_client.is_empty() {
            break;
        }
        if !to_server.is_empty() {
            server.recv(&to_server).unwrap();
        }
        if !to_client.is_empty() {
            client.recv(&to_client).unwrap();
        }
    }
}
