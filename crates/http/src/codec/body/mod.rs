//! HTTP body framing for responses
//!
//! - [`ChunkedEncoder`]: implements `Transfer-Encoding: chunked` framing (RFC 9112, section 7.1)
//!
//! Plain bodies need no framing, the `Content-Length` header chosen by the handler
//! delimits them. Request bodies are accumulated directly by the
//! [`RequestParser`](crate::codec::RequestParser).

mod chunked_encoder;

pub use chunked_encoder::ChunkedEncoder;
