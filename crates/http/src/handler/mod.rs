//! Request handler abstraction
//!
//! A [`Handler`] receives the parsed [`Request`] together with the [`ResponseWriter`] of
//! its connection and writes the whole response itself: status line, headers, body.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::connection::ResponseWriter;
use crate::protocol::Request;

/// Writes the response for one request.
///
/// The handler owns the response: whatever it writes reaches the client as is. Once it
/// returns, the connection flushes the writer and closes. A handler that writes nothing
/// produces an empty reply.
#[async_trait]
pub trait Handler<W>: Send + Sync
where
    W: AsyncWrite + Unpin + Send,
{
    async fn call(&self, writer: &mut ResponseWriter<W>, request: &Request);
}

#[async_trait]
impl<W, H> Handler<W> for Arc<H>
where
    W: AsyncWrite + Unpin + Send,
    H: Handler<W> + ?Sized,
{
    async fn call(&self, writer: &mut ResponseWriter<W>, request: &Request) {
        (**self).call(writer, request).await
    }
}

/// A [`Handler`] backed by an async function, see [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<W, F> Handler<W> for HandlerFn<F>
where
    W: AsyncWrite + Unpin + Send,
    F: for<'a> Fn(&'a mut ResponseWriter<W>, &'a Request) -> futures::future::BoxFuture<'a, ()> + Send + Sync,
{
    async fn call(&self, writer: &mut ResponseWriter<W>, request: &Request) {
        (self.f)(writer, request).await
    }
}

/// Wraps a function returning a boxed future into a [`Handler`].
///
/// ```
/// use futures::FutureExt;
/// use raw_http::connection::{ResponseWriter, default_headers};
/// use raw_http::handler::{Handler, make_handler};
/// use raw_http::protocol::{Request, StatusCode};
///
/// fn not_found<W>() -> impl Handler<W>
/// where
///     W: tokio::io::AsyncWrite + Unpin + Send,
/// {
///     make_handler(|writer: &mut ResponseWriter<W>, _request: &Request| {
///         async move {
///             let _ = writer.write_status_line(StatusCode::NotFound).await;
///             let _ = writer.write_headers(&default_headers(0)).await;
///         }
///         .boxed()
///     })
/// }
/// ```
pub fn make_handler<W, F>(f: F) -> HandlerFn<F>
where
    W: AsyncWrite + Unpin + Send,
    F: for<'a> Fn(&'a mut ResponseWriter<W>, &'a Request) -> futures::future::BoxFuture<'a, ()> + Send + Sync,
{
    HandlerFn { f }
}
