//! Core HTTP protocol types.
//!
//! This module holds the values that flow between the codec, the connection and the
//! user handler:
//!
//! - [`HeaderTable`]: ordered, case-insensitive header fields
//! - [`Request`] / [`RequestLine`]: a fully parsed request
//! - [`StatusCode`]: the closed set of response codes the writer can emit
//! - [`ResponsePart`] / [`PayloadItem`]: the pieces of an outgoing response
//! - [`HttpError`], [`ParseError`], [`SendError`]: error types for each direction

mod message;
pub use message::PayloadItem;
pub use message::ResponsePart;

mod headers;
pub use headers::HeaderTable;
pub use headers::Iter;

mod request;
pub use request::Request;
pub use request::RequestLine;

mod status;
pub use status::StatusCode;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
