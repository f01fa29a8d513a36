//! Blocking I/O loops around [`Connection`].
//!
//! Any `Read + Write` transport works: a `TcpStream`, a serial line, or an
//! in-memory pipe in tests.

use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::connection::Connection;
use crate::error::H2Error;
use crate::handler::Response;
use crate::headers::HeaderList;

/// Read buffer size; one default-sized frame plus its header.
const READ_CHUNK: usize = 16 * 1024 + 9;

/// Serves a connection until the peer hangs up or the connection closes.
///
/// Queued output (including a final GOAWAY) is flushed before an error is
/// returned.
pub fn serve<S: Read + Write>(conn: &mut Connection, io: &mut S) -> Result<(), H2Error> {
    let mut buf = vec![0u8; READ_CHUNK];
    flush(conn, io)?;
    while !conn.is_closed() {
        let Some(n) = read(io, &mut buf)? else {
            debug!("peer closed the transport");
            return Ok(());
        };
        let result = conn.recv(&buf[..n]);
        flush(conn, io)?;
        result?;
    }
    Ok(())
}

/// Sends one request on a client connection and blocks until its response
/// is complete.
pub fn request<S: Read + Write>(
    conn: &mut Connection,
    io: &mut S,
    headers: &HeaderList,
    body: &[u8],
) -> Result<Response, H2Error> {
    conn.send_request(headers, body)?;
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        flush(conn, io)?;
        if let Some(response) = conn.poll_response() {
            return Ok(response);
        }
        if conn.is_closed() {
            return Err(H2Error::Closed);
        }
        let Some(n) = read(io, &mut buf)? else {
            return Err(H2Error::Closed);
        };
        let result = conn.recv(&buf[..n]);
        if result.is_err() {
            flush(conn, io)?;
        }
        result?;
    }
}

/// Writes everything the connection has queued.
pub fn flush<S: Write>(conn: &mut Connection, io: &mut S) -> Result<(), H2Error> {
    let out = conn.take_pending_send();
    if !out.is_empty() {
        io.write_all(&out)?;
        io.flush()?;
    }
    Ok(())
}

/// `None` on end of stream.
fn read<S: Read>(io: &mut S, buf: &mut [u8]) -> Result<Option<usize>, H2Error> {
    loop {
        match io.read(buf) {
            Ok(0) => return Ok(None),
            Ok(n) => return Ok(Some(n)),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
