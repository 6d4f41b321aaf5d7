//! HTTP header processing module for encoding and decoding header sections
//!
//! # Components
//!
//! - [`HeaderTable::parse`](crate::protocol::HeaderTable::parse): incremental parsing of
//!   request header lines, with validation of field names and duplicate folding
//! - [`HeaderEncoder`]: serializes a header table, used for response headers and trailers

mod header_decoder;
mod header_encoder;

pub(crate) use header_decoder::is_token_char;
pub use header_encoder::HeaderEncoder;
