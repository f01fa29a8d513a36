//! Request/response seam between the connection and the application.

use crate::headers::{Header, HeaderList};

/// A complete request: decoded headers plus the reassembled body.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub headers: &'a HeaderList,
    pub body: &'a [u8],
}

impl<'a> Request<'a> {
    pub fn method(&self) -> Option<&'a str> {
        self.headers.get(":method")
    }

    pub fn path(&self) -> Option<&'a str> {
        self.headers.get(":path")
    }

    pub fn scheme(&self) -> Option<&'a str> {
        self.headers.get(":scheme")
    }

    pub fn authority(&self) -> Option<&'a str> {
        self.headers.get(":authority")
    }
}

/// A response, produced by a [`Handler`] on the server side and collected
/// by [`Connection::poll_response`](crate::Connection::poll_response) on the
/// client side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    /// Regular headers only; `:status` is carried by `status`.
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header::new(name, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

/// Produces a response for each completed request.
///
/// Implemented for any `FnMut(&Request) -> Response`, so a closure can
/// serve as a router.
pub trait Handler {
    fn handle(&mut self, request: &Request<'_>) -> Response;
}

impl<F> Handler for F
where
    F: FnMut(&Request<'_>) -> Response,
{
    fn handle(&mut self, request: &Request<'_>) -> Response {
        self(request)
    }
}
