//! TCP server running the accept loop
//!
//! [`Server::serve`] binds a port and returns as soon as the listener is ready; every
//! accepted connection is served on its own task by an
//! [`HttpConnection`](crate::connection::HttpConnection). [`Server::close`] stops
//! accepting and releases the port.

mod http_server;
mod server_builder;

pub use http_server::{Server, ServerError};
pub use server_builder::{ServerBuilder, ShutdownPolicy};
