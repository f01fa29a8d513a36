//! h2-embedded: a small, sans-I/O HTTP/2 stack for constrained devices
//!
//! This crate implements the HTTP/2 connection state machine, the frame
//! codec and HPACK header compression with bounded memory: fixed-capacity
//! header lists, a circular-buffer dynamic table and a single active stream
//! per connection.
//!
//! # Features
//!
//! - **Sans-I/O Design**: feed bytes in, take bytes out; no async runtime
//! - **HPACK**: prefix integers, Huffman strings, static and dynamic tables
//! - **Flow Control**: connection and stream windows in both directions,
//!   with DATA sending that pauses and resumes on WINDOW_UPDATE
//! - **CONTINUATION Assembly**: header blocks are reassembled on receipt
//!   and split on send according to MAX_FRAME_SIZE
//! - **Cargo features**: `huffman` and `dynamic-table`, both on by default
//!
//! # Quick Start
//!
//! ```rust
//! use h2_embedded::{Connection, Request, Response};
//!
//! let mut server = Connection::server(|req: &Request<'_>| match req.path() {
//!     Some("/") => Response::new(200).with_body("hello"),
//!     _ => Response::new(404),
//! });
//!
//! // The server greets the peer with its SETTINGS.
//! let greeting = server.take_pending_send();
//! assert!(!greeting.is_empty());
//!
//! // Bytes from the transport go in through `recv`.
//! server.recv(h2_embedded::CONNECTION_PREFACE).unwrap();
//! ```
//!
//! # Architecture
//!
//! - [`buffer`], [`headers`]: leaf helpers
//! - [`hpack`]: header compression
//! - [`frame`]: the binary framing layer
//! - [`connection`]: dispatch of received frames, stream lifecycle,
//!   settings and flow control; `send` holds the sending half
//! - [`handler`]: the application seam
//! - [`driver`]: blocking loops over any `Read + Write` transport
//!
//! It does NOT provide TLS, server push or stream prioritization.

pub mod buffer;
pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod flowcontrol;
pub mod frame;
pub mod handler;
pub mod headers;
pub mod hpack;
mod send;
pub mod settings;
pub mod stream;

pub use connection::{Connection, OutgoingData, Role};
pub use error::{ErrorCode, FrameError, H2Error, HeaderError, HpackError};
pub use flowcontrol::{FlowControl, Windows};
pub use frame::{flags, frame_type, Frame, FrameHeader, CONNECTION_PREFACE, FRAME_HEADER_SIZE};
pub use handler::{Handler, Request, Response};
pub use headers::{Header, HeaderList};
pub use settings::{settings_id, Settings};
pub use stream::{Stream, StreamState};
