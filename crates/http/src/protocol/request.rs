//! Parsed HTTP request types.
//!
//! A [`Request`] is produced by the [`crate::codec::RequestParser`] and handed read-only
//! to the handler. Nothing here decodes the request-target: it is kept exactly as it
//! appeared on the request line.

use std::borrow::Cow;

use bytes::{Bytes, BytesMut};

use crate::protocol::HeaderTable;

/// The first line of a request: `<method> <target> HTTP/<version>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    request_target: String,
    http_version: String,
}

impl RequestLine {
    pub(crate) fn new(method: String, request_target: String, http_version: String) -> Self {
        Self { method, request_target, http_version }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw request-target, e.g. `/index.html?a=1`.
    pub fn request_target(&self) -> &str {
        &self.request_target
    }

    /// The version number without the `HTTP/` prefix, always `"1.1"` once parsed.
    pub fn http_version(&self) -> &str {
        &self.http_version
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    request_line: RequestLine,
    headers: HeaderTable,
    body: BytesMut,
}

impl Request {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    pub fn method(&self) -> &str {
        self.request_line().method()
    }

    pub fn request_target(&self) -> &str {
        self.request_line().request_target()
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as text, replacing invalid utf-8 sequences.
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }

    /// The declared `Content-Length`, or 0 when missing or not a non-negative integer.
    pub fn content_length(&self) -> usize {
        self.headers.get("Content-Length").and_then(|value| value.trim().parse::<usize>().ok()).unwrap_or(0)
    }

    pub(crate) fn set_request_line(&mut self, request_line: RequestLine) {
        self.request_line = request_line;
    }

    pub(crate) fn headers_mut(&mut self) -> &mut HeaderTable {
        &mut self.headers
    }

    pub(crate) fn body_mut(&mut self) -> &mut BytesMut {
        &mut self.body
    }
}
