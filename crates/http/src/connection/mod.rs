//! HTTP connection handling module
//!
//! Every connection carries exactly one request: [`HttpConnection`] reads it, hands it to
//! the [`Handler`](crate::handler::Handler) together with a [`ResponseWriter`], then
//! flushes and closes. There is no keep-alive and no pipelining.

mod http_connection;
mod response_writer;

pub use http_connection::{ConnectionConfig, HttpConnection};
pub use response_writer::{ResponseWriter, default_headers};
