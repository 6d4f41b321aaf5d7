//! HTTP codec module for decoding requests and encoding responses
//!
//! This module provides streaming HTTP message processing on raw bytes. Nothing here
//! relies on a third-party HTTP parser: the request side is a small state machine that
//! tolerates input split at any byte, the response side formats status lines, header
//! sections and chunked framing.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestParser`]: re-entrant state machine over the unconsumed bytes
//!   - [`RequestDecoder`]: drives the parser as a [`tokio_util::codec::Decoder`], with a
//!     bound on the total request size
//!   - [`read_request`]: reads one request from an `AsyncRead`
//!   - header line parsing via [`HeaderTable::parse`](crate::protocol::HeaderTable::parse)
//!
//! - Response handling:
//!   - [`ResponseEncoder`]: encodes the [`ResponsePart`](crate::protocol::ResponsePart)s
//!     written by a handler
//!   - header encoding via [`HeaderEncoder`], chunked framing via [`ChunkedEncoder`]
//!
//! # Example
//!
//! ```
//! use raw_http::codec::RequestParser;
//!
//! let mut parser = RequestParser::new();
//! let data = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
//!
//! // the first read only delivered part of the request line
//! assert_eq!(parser.parse(&data[..5]).unwrap(), 0);
//!
//! let consumed = parser.parse(data).unwrap();
//! assert_eq!(consumed, data.len());
//!
//! let request = parser.into_request().unwrap();
//! assert_eq!(request.headers().get("host"), Some("localhost"));
//! ```

mod body;
mod header;
mod request_decoder;
mod request_line;
mod response_encoder;

pub use body::ChunkedEncoder;
pub use header::HeaderEncoder;
pub use request_decoder::{
    DEFAULT_MAX_REQUEST_SIZE, DEFAULT_READ_BUFFER_CAPACITY, ParseState, RequestDecoder, RequestParser, read_request, read_request_with,
};
pub use response_encoder::ResponseEncoder;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// Position of the first `\r\n` in `data`.
#[inline]
pub(crate) fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(CRLF.len()).position(|window| window == CRLF)
}
