use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::select;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::connection::{ConnectionConfig, HttpConnection};
use crate::handler::Handler;
use crate::server::{ServerBuilder, ShutdownPolicy};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("address must be set")]
    MissingAddress,
    #[error("can't bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("accept loop failed: {source}")]
    AcceptLoop {
        #[from]
        source: JoinError,
    },
}

/// A running server.
///
/// Dropping it stops the accept loop as well, [`close`](Self::close) additionally waits
/// until the listener is released.
#[derive(Debug)]
pub struct Server {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    accept_loop: Mutex<Option<JoinHandle<()>>>,
    connections: TaskTracker,
    shutdown_policy: ShutdownPolicy,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Listens on every interface at `port` with the default limits.
    pub async fn serve<H>(port: u16, handler: H) -> Result<Server, ServerError>
    where
        H: Handler<OwnedWriteHalf> + 'static,
    {
        Self::builder().port(port).serve(handler).await
    }

    pub(crate) async fn start<H>(
        address: SocketAddr,
        config: ConnectionConfig,
        shutdown_policy: ShutdownPolicy,
        handler: Arc<H>,
    ) -> Result<Server, ServerError>
    where
        H: Handler<OwnedWriteHalf> + 'static,
    {
        let tcp_listener = TcpListener::bind(address).await.map_err(|source| ServerError::Bind { addr: address, source })?;
        let local_addr = tcp_listener.local_addr()?;
        info!(%local_addr, "start listening");

        let shutdown = CancellationToken::new();
        let connections = TaskTracker::new();
        let accept_loop = tokio::spawn(accept_loop(tcp_listener, handler, config, shutdown.clone(), connections.clone()));

        Ok(Server { local_addr, shutdown, accept_loop: Mutex::new(Some(accept_loop)), connections, shutdown_policy })
    }

    /// The address actually bound, useful after listening on port `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.connections.len()
    }

    /// Stops accepting connections and releases the listening socket.
    ///
    /// Once this returns, new connection attempts are refused. Connections already
    /// accepted are waited for only under [`ShutdownPolicy::Drain`]. Calling it again is
    /// harmless.
    pub async fn close(&self) -> Result<(), ServerError> {
        self.shutdown.cancel();

        // concurrent callers queue here until the listener is gone
        let mut accept_loop = self.accept_loop.lock().await;
        if let Some(handle) = accept_loop.as_mut() {
            let result = handle.await;
            *accept_loop = None;
            result?;
            info!(local_addr = %self.local_addr, "server closed");
        }
        drop(accept_loop);

        if self.shutdown_policy == ShutdownPolicy::Drain {
            self.connections.close();
            debug!(active = self.connections.len(), "waiting for in-flight connections");
            self.connections.wait().await;
        }
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn accept_loop<H>(
    tcp_listener: TcpListener,
    handler: Arc<H>,
    config: ConnectionConfig,
    shutdown: CancellationToken,
    connections: TaskTracker,
) where
    H: Handler<OwnedWriteHalf> + 'static,
{
    loop {
        let accepted = select! {
            biased;
            () = shutdown.cancelled() => break,
            accepted = tcp_listener.accept() => accepted,
        };

        let (tcp_stream, remote_addr) = match accepted {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        if let Err(e) = tcp_stream.set_nodelay(true) {
            warn!(cause = %e, %remote_addr, "failed to set TCP_NODELAY");
        }

        let handler = Arc::clone(&handler);

        connections.spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let connection = HttpConnection::with_config(reader, writer, config);
            match connection.process(handler.as_ref()).await {
                Ok(()) => {
                    info!(%remote_addr, "finished process, connection shutdown");
                }
                Err(e) => {
                    error!(%remote_addr, cause = %e, "service has error, connection shutdown");
                }
            }
        });
    }

    debug!("accept loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ResponseWriter, default_headers};
    use crate::protocol::{Request, StatusCode};
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::{Notify, mpsc};
    use tokio::time::timeout;

    struct Hello;

    #[async_trait]
    impl<W> Handler<W> for Hello
    where
        W: AsyncWrite + Unpin + Send,
    {
        async fn call(&self, writer: &mut ResponseWriter<W>, request: &Request) {
            let (status, body) = match request.request_target() {
                "/yourproblem" => (StatusCode::BadRequest, "Your problem is not my problem\n"),
                _ => (StatusCode::Ok, "All good, frfr\n"),
            };
            writer.write_status_line(status).await.unwrap();
            writer.write_headers(&default_headers(body.len())).await.unwrap();
            writer.write_body(body.as_bytes()).await.unwrap();
        }
    }

    struct EmptyHtml;

    #[async_trait]
    impl<W> Handler<W> for EmptyHtml
    where
        W: AsyncWrite + Unpin + Send,
    {
        async fn call(&self, writer: &mut ResponseWriter<W>, _request: &Request) {
            let mut headers = default_headers(0);
            headers.set("Content-Type", "text/html");
            writer.write_status_line(StatusCode::Ok).await.unwrap();
            writer.write_headers(&headers).await.unwrap();
        }
    }

    /// Signals when a request arrives, then holds it until released.
    struct Gate {
        started: mpsc::UnboundedSender<()>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl<W> Handler<W> for Gate
    where
        W: AsyncWrite + Unpin + Send,
    {
        async fn call(&self, writer: &mut ResponseWriter<W>, _request: &Request) {
            let _ = self.started.send(());
            self.release.notified().await;
            writer.write_status_line(StatusCode::Ok).await.unwrap();
            writer.write_headers(&default_headers(0)).await.unwrap();
        }
    }

    async fn local_server<H>(handler: H, shutdown_policy: ShutdownPolicy) -> Server
    where
        H: Handler<OwnedWriteHalf> + 'static,
    {
        Server::builder()
            .address("127.0.0.1:0".parse().unwrap())
            .shutdown_policy(shutdown_policy)
            .serve(handler)
            .await
            .unwrap()
    }

    async fn round_trip(addr: SocketAddr, request: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn exact_response_then_eof() {
        let server = local_server(EmptyHtml, ShutdownPolicy::Immediate).await;

        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        stream.write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        assert_eq!(response, b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n");

        let mut extra = [0u8; 1];
        assert_eq!(stream.read(&mut extra).await.unwrap(), 0);

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn serves_a_request() {
        let server = local_server(Hello, ShutdownPolicy::Immediate).await;

        let response = round_trip(server.local_addr(), b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert_eq!(
            response,
            "HTTP/1.1 200 OK\r\nContent-Length: 15\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nAll good, frfr\n"
        );

        let response = round_trip(server.local_addr(), b"GET /yourproblem HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\nContent-Length: 31\r\n"));
        assert!(response.ends_with("\r\n\r\nYour problem is not my problem\n"));

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let server = local_server(Hello, ShutdownPolicy::Immediate).await;

        let response = round_trip(server.local_addr(), b"GET / HTTP/1.0\r\n\r\n").await;
        assert_eq!(response, "HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n");

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_connections() {
        let server = local_server(Hello, ShutdownPolicy::Immediate).await;
        let addr = server.local_addr();

        let clients: Vec<_> = (0..8).map(|_| tokio::spawn(round_trip(addr, b"GET / HTTP/1.1\r\n\r\n"))).collect();
        for client in clients {
            assert!(client.await.unwrap().ends_with("All good, frfr\n"));
        }

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn bind_conflict() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = Server::builder().address(addr).serve(Hello).await;
        assert!(matches!(result, Err(ServerError::Bind { addr: a, .. }) if a == addr));
    }

    #[tokio::test]
    async fn missing_address() {
        let result = Server::builder().serve(Hello).await;
        assert!(matches!(result, Err(ServerError::MissingAddress)));
    }

    #[tokio::test]
    async fn close_refuses_new_connections() {
        let server = local_server(Hello, ShutdownPolicy::Immediate).await;
        let addr = server.local_addr();

        server.close().await.unwrap();
        server.close().await.unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn in_flight_connection_survives_close() {
        let (started, mut started_rx) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        let server = local_server(Gate { started, release: Arc::clone(&release) }, ShutdownPolicy::Immediate).await;

        let client = tokio::spawn(round_trip(server.local_addr(), b"GET / HTTP/1.1\r\n\r\n"));
        started_rx.recv().await.unwrap();
        assert_eq!(server.active_connections(), 1);

        server.close().await.unwrap();
        release.notify_one();

        assert!(client.await.unwrap().starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[tokio::test]
    async fn drain_waits_for_in_flight_connection() {
        let (started, mut started_rx) = mpsc::unbounded_channel();
        let release = Arc::new(Notify::new());
        let server = local_server(Gate { started, release: Arc::clone(&release) }, ShutdownPolicy::Drain).await;

        let client = tokio::spawn(round_trip(server.local_addr(), b"GET / HTTP/1.1\r\n\r\n"));
        started_rx.recv().await.unwrap();

        assert!(timeout(Duration::from_millis(100), server.close()).await.is_err());

        release.notify_one();
        server.close().await.unwrap();
        assert_eq!(server.active_connections(), 0);
        assert!(client.await.unwrap().starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[tokio::test]
    async fn serve_on_ephemeral_port() {
        let server = Server::serve(0, EmptyHtml).await.unwrap();
        assert!(server.local_addr().ip().is_unspecified());
        assert_ne!(server.local_addr().port(), 0);

        let addr = SocketAddr::from(([127, 0, 0, 1], server.local_addr().port()));
        let response = round_trip(addr, b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        assert_eq!(response, "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n");

        server.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_close_calls_both_wait_for_listener() {
        let server = local_server(Hello, ShutdownPolicy::Immediate).await;
        let addr = server.local_addr();

        let (first, second) = tokio::join!(
            async {
                server.close().await.unwrap();
                TcpStream::connect(addr).await.is_err()
            },
            async {
                server.close().await.unwrap();
                TcpStream::connect(addr).await.is_err()
            },
        );

        assert!(first);
        assert!(second);
    }
}
