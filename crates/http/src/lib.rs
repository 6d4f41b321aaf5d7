//! A from-scratch HTTP/1.1 server over raw TCP byte streams
//!
//! Requests are parsed by a small re-entrant state machine that accepts input split at
//! any byte boundary. Responses are written part by part by the handler: status line,
//! headers, then either a length-delimited body or chunks followed by trailers.
//!
//! Each connection carries exactly one request. After the handler returns, the response
//! is flushed and the connection is closed.
//!
//! # Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use raw_http::connection::{ResponseWriter, default_headers};
//! use raw_http::handler::Handler;
//! use raw_http::protocol::{Request, StatusCode};
//! use raw_http::server::Server;
//! use tokio::io::AsyncWrite;
//! use tracing::error;
//!
//! struct HelloWorld;
//!
//! #[async_trait]
//! impl<W> Handler<W> for HelloWorld
//! where
//!     W: AsyncWrite + Unpin + Send,
//! {
//!     async fn call(&self, writer: &mut ResponseWriter<W>, _request: &Request) {
//!         let body = b"Hello World!\r\n";
//!         let result = async {
//!             writer.write_status_line(StatusCode::Ok).await?;
//!             writer.write_headers(&default_headers(body.len())).await?;
//!             writer.write_body(body).await
//!         };
//!         if let Err(e) = result.await {
//!             error!(cause = %e, "failed to write response");
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = match Server::serve(8080, HelloWorld).await {
//!         Ok(server) => server,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let _ = tokio::signal::ctrl_c().await;
//!     let _ = server.close().await;
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: request, header table, status codes and error types
//! - [`codec`]: request parsing and response encoding on raw bytes
//! - [`connection`]: one request per connection, [`connection::ResponseWriter`]
//! - [`handler`]: the [`handler::Handler`] trait
//! - [`server`]: listener, accept loop and shutdown
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type of a connection
//! - [`protocol::ParseError`]: Request parsing errors, answered with `400 Bad Request`
//!   unless the cause is I/O
//! - [`protocol::SendError`]: Response writing errors
//! - [`server::ServerError`]: Bind and shutdown errors
//!
//! # Limitations
//!
//! - HTTP/1.1 only, no keep-alive, no pipelining
//! - No chunked request bodies, a request body is delimited by `Content-Length`
//! - No TLS support (use a reverse proxy for HTTPS)
//! - A request is limited to [`codec::DEFAULT_MAX_REQUEST_SIZE`] bytes unless configured

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
