//! Demo server with canned HTML pages and a chunked proxy to httpbin.org
//!
//! Stops on Ctrl-C or SIGTERM.
//!
//! ```text
//! cargo run --example httpserver -- --port 42069
//! curl -v --raw localhost:42069/httpbin/stream/10
//! ```

use async_trait::async_trait;
use clap::Parser;
use raw_http::connection::{ResponseWriter, default_headers};
use raw_http::handler::Handler;
use raw_http::protocol::{HeaderTable, Request, SendError, StatusCode};
use raw_http::server::Server;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWrite;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const BAD_REQUEST_PAGE: &str = "<html>
  <head>
    <title>400 Bad Request</title>
  </head>
  <body>
    <h1>Bad Request</h1>
    <p>Your request honestly kinda sucked.</p>
  </body>
</html>";

const INTERNAL_ERROR_PAGE: &str = "<html>
  <head>
    <title>500 Internal Server Error</title>
  </head>
  <body>
    <h1>Internal Server Error</h1>
    <p>Okay, you know what? This one is on me.</p>
  </body>
</html>";

const OK_PAGE: &str = "<html>
  <head>
    <title>200 OK</title>
  </head>
  <body>
    <h1>Success!</h1>
    <p>Your request was an absolute banger.</p>
  </body>
</html>";

const HTTPBIN_PREFIX: &str = "/httpbin/";

#[derive(Parser, Debug)]
#[command(about = "HTTP/1.1 demo server")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value_t = 42069)]
    port: u16,

    /// Upstream for the /httpbin/ routes
    #[arg(long, default_value = "https://httpbin.org")]
    httpbin: String,
}

struct DemoHandler {
    client: reqwest::Client,
    httpbin: String,
}

impl DemoHandler {
    async fn html<W>(writer: &mut ResponseWriter<W>, status: StatusCode, page: &str) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut headers = default_headers(page.len());
        headers.set("Content-Type", mime::TEXT_HTML.as_ref());

        writer.write_status_line(status).await?;
        writer.write_headers(&headers).await?;
        writer.write_body(page.as_bytes()).await?;
        Ok(())
    }

    async fn proxy<W>(&self, writer: &mut ResponseWriter<W>, path: &str) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let url = format!("{}/{}", self.httpbin.trim_end_matches('/'), path);
        let mut upstream = match self.client.get(&url).send().await {
            Ok(upstream) => upstream,
            Err(e) => {
                warn!(cause = %e, url, "upstream request failed");
                return Self::html(writer, StatusCode::InternalServerError, INTERNAL_ERROR_PAGE).await;
            }
        };

        let mut headers = default_headers(0);
        headers.remove("Content-Length");
        headers.set("Transfer-Encoding", "chunked");
        headers.append("Trailer", "X-Content-SHA256");
        headers.append("Trailer", "X-Content-Length");

        writer.write_status_line(StatusCode::Ok).await?;
        writer.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut content_length = 0;
        loop {
            match upstream.chunk().await {
                Ok(Some(chunk)) => {
                    writer.write_chunked_body(&chunk).await?;
                    hasher.update(&chunk);
                    content_length += chunk.len();
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(cause = %e, url, "upstream body interrupted");
                    break;
                }
            }
        }
        writer.write_chunked_body_done().await?;

        let mut trailers = HeaderTable::new();
        trailers.set("X-Content-SHA256", hex::encode(hasher.finalize()));
        trailers.set("X-Content-Length", content_length.to_string());
        writer.write_trailers(&trailers).await?;

        info!(url, content_length, "proxied upstream response");
        Ok(())
    }
}

#[async_trait]
impl<W> Handler<W> for DemoHandler
where
    W: AsyncWrite + Unpin + Send,
{
    async fn call(&self, writer: &mut ResponseWriter<W>, request: &Request) {
        let target = request.request_target();
        info!(method = request.method(), target, "request");

        let result = match target {
            "/badRequest" => Self::html(writer, StatusCode::BadRequest, BAD_REQUEST_PAGE).await,
            "/internalErr" => Self::html(writer, StatusCode::InternalServerError, INTERNAL_ERROR_PAGE).await,
            _ => match target.strip_prefix(HTTPBIN_PREFIX) {
                Some(path) if path.starts_with("stream") => self.proxy(writer, path).await,
                _ => Self::html(writer, StatusCode::Ok, OK_PAGE).await,
            },
        };

        if let Err(e) = result {
            error!(cause = %e, target, "failed to write response");
        }
    }
}

/// Waits for Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(cause = %e, "can't listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!(cause = %e, "can't listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c"),
        () = terminate => info!("received SIGTERM"),
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let args = Args::parse();
    let handler = DemoHandler { client: reqwest::Client::new(), httpbin: args.httpbin };

    let server = match Server::serve(args.port, handler).await {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, port = args.port, "bind server error");
            return;
        }
    };
    info!(local_addr = %server.local_addr(), "server started");

    shutdown_signal().await;

    match server.close().await {
        Ok(()) => info!("server gracefully stopped"),
        Err(e) => error!(cause = %e, "server stopped with error"),
    }
}
