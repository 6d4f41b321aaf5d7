//! HTTP request decoder module
//!
//! This module turns raw bytes into a [`Request`]. The bytes may arrive in reads of any
//! size, split anywhere: inside the request line, inside a header line or inside the
//! body.
//!
//! # Components
//!
//! - [`RequestParser`]: the state machine. Each call to [`RequestParser::parse`] receives
//!   the unconsumed part of the caller's buffer and returns how many bytes it consumed;
//!   0 means more input is needed
//! - [`RequestDecoder`]: a [`Decoder`] wrapper that slides the buffer and bounds the
//!   request size, so the parser can be driven by [`FramedRead`]
//! - [`read_request`]: reads exactly one request from an [`AsyncRead`]
//!
//! # State Machine
//!
//! ```text
//! Init --request line--> Headers --blank line--> Body --Content-Length bytes--> Done
//!                                        \------------no body-------------------/
//! ```
//!
//! Any malformed input moves the parser to the `Error` sink state.
//!
//! # Limitations
//!
//! Request bodies are delimited by `Content-Length` only, a chunked request body is
//! not decoded.

use std::cmp;
use std::io;
use std::io::ErrorKind;
use std::mem;

use bytes::{Buf, BytesMut};
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{debug, trace};

use crate::codec::request_line::parse_request_line;
use crate::protocol::{ParseError, Request};

/// Default bound for request line, headers and body together
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Initial capacity of the per-connection read buffer, it grows on demand
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// The phases of request parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Waiting for the request line
    Init,
    /// Reading header lines
    Headers,
    /// Accumulating `Content-Length` body bytes
    Body,
    /// A complete request is available
    Done,
    /// Malformed input was seen, the parser accepts no more input
    Error,
}

/// A re-entrant parser for a single request.
#[derive(Debug)]
pub struct RequestParser {
    state: ParseState,
    request: Request,
}

impl RequestParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParseState::Done
    }

    /// The request as parsed so far.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the request once parsing is done.
    pub fn into_request(self) -> Option<Request> {
        self.is_done().then_some(self.request)
    }

    /// Runs the state machine over `data`, the bytes not consumed by previous calls
    /// followed by any newly read bytes.
    ///
    /// Returns the number of bytes consumed from the front of `data`. The caller must
    /// discard them before the next call. `Ok(0)` in a non terminal state means the
    /// parser needs more input; in the `Done` state further calls always return `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns the error of a malformed request line or header line, after which the
    /// parser is in the `Error` state and every further call fails with
    /// `ParseError::RequestInErrorState`.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut read = 0;

        loop {
            let current = &data[read..];

            match self.state {
                ParseState::Error => return Err(ParseError::RequestInErrorState),

                ParseState::Init => match parse_request_line(current) {
                    Ok(Some((request_line, n))) => {
                        trace!(method = request_line.method(), target = request_line.request_target(), "parsed request line");
                        self.request.set_request_line(request_line);
                        read += n;
                        self.transition(ParseState::Headers);
                    }
                    Ok(None) => break,
                    Err(e) => return Err(self.fail(e)),
                },

                ParseState::Headers => {
                    let (n, done) = match self.request.headers_mut().parse(current) {
                        Ok(result) => result,
                        Err(e) => return Err(self.fail(e)),
                    };
                    read += n;

                    if !done {
                        break;
                    }

                    if self.request.content_length() > 0 {
                        self.transition(ParseState::Body);
                    } else {
                        self.transition(ParseState::Done);
                    }
                }

                ParseState::Body => {
                    let required = self.request.content_length();
                    if required == 0 {
                        self.transition(ParseState::Done);
                        continue;
                    }

                    if current.is_empty() {
                        break;
                    }

                    let body = self.request.body_mut();
                    let remaining = cmp::min(required.saturating_sub(body.len()), current.len());
                    body.extend_from_slice(&current[..remaining]);
                    read += remaining;

                    if body.len() >= required {
                        self.transition(ParseState::Done);
                    }
                }

                ParseState::Done => break,
            }
        }

        Ok(read)
    }

    /// Moves the parser to the `Error` state, returning `e` for propagation.
    pub(crate) fn fail(&mut self, e: ParseError) -> ParseError {
        debug!(from = ?self.state, cause = %e, "request parse failed");
        self.state = ParseState::Error;
        e
    }

    fn take_request(&mut self) -> Request {
        mem::take(&mut self.request)
    }

    fn transition(&mut self, to: ParseState) {
        trace!(from = ?self.state, ?to, "request parser transition");
        self.state = to;
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self { state: ParseState::Init, request: Request::new() }
    }
}

/// A [`Decoder`] yielding one [`Request`] per connection.
///
/// The read buffer grows as needed, but the bytes belonging to the request (consumed
/// plus still buffered) must stay within `max_request_size`, otherwise decoding fails
/// with `ParseError::TooLargeRequest`.
#[derive(Debug)]
pub struct RequestDecoder {
    parser: RequestParser,
    consumed: usize,
    max_request_size: usize,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_max_request_size(max_request_size: usize) -> Self {
        Self { parser: RequestParser::new(), consumed: 0, max_request_size }
    }

    pub fn state(&self) -> ParseState {
        self.parser.state()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_max_request_size(DEFAULT_MAX_REQUEST_SIZE)
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode the request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: the request is complete, its bytes are removed from `src`
    /// - `Ok(None)`: need more data, or the request was already yielded
    /// - `Err(_)`: the request is malformed or too large
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.parser.is_done() {
            return Ok(None);
        }

        let n = self.parser.parse(&src[..])?;
        src.advance(n);
        self.consumed += n;

        let done = self.parser.is_done();
        let current_size = if done { self.consumed } else { self.consumed + src.len() };
        if current_size > self.max_request_size {
            return Err(self.parser.fail(ParseError::too_large_request(current_size, self.max_request_size)));
        }

        if done {
            debug!(size = self.consumed, "decoded request");
            return Ok(Some(self.parser.take_request()));
        }

        Ok(None)
    }

    /// A stream that ends before the request is complete is an I/O error, never a
    /// partial request.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.parser.is_done() {
            return Ok(None);
        }

        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None => Err(self.parser.fail(ParseError::io(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("stream closed in {:?} state after {} bytes", self.parser.state(), self.consumed + src.len()),
            )))),
        }
    }
}

/// Reads one request from `reader` with the default limits.
///
/// # Errors
///
/// Fails with the parse error of a malformed request, or with `ParseError::Io` when the
/// read fails or the stream ends before the request is complete.
pub async fn read_request<R>(reader: R) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    read_request_with(reader, RequestDecoder::new(), DEFAULT_READ_BUFFER_CAPACITY).await
}

/// Reads one request from `reader` using `decoder` and an initial buffer of `capacity` bytes.
///
/// # Errors
///
/// See [`read_request`].
pub async fn read_request_with<R>(reader: R, decoder: RequestDecoder, capacity: usize) -> Result<Request, ParseError>
where
    R: AsyncRead + Unpin,
{
    let mut framed_read = FramedRead::with_capacity(reader, decoder, capacity);
    match framed_read.next().await {
        Some(result) => result,
        None => Err(ParseError::io(io::Error::new(ErrorKind::UnexpectedEof, "stream closed before a request was read"))),
    }
}
