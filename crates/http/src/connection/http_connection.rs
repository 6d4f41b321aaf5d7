use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info};

use crate::codec::{DEFAULT_MAX_REQUEST_SIZE, DEFAULT_READ_BUFFER_CAPACITY, RequestDecoder, read_request_with};
use crate::connection::{ResponseWriter, default_headers};
use crate::handler::Handler;
use crate::protocol::{HttpError, StatusCode};

/// Per-connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Upper bound on the bytes one request may occupy, request line and body included
    pub max_request_size: usize,
    /// Initial capacity of the read buffer, it grows on demand up to `max_request_size`
    pub read_buffer_capacity: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { max_request_size: DEFAULT_MAX_REQUEST_SIZE, read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY }
    }
}

/// Serves exactly one request on a connection, then closes it.
///
/// * a parsed request goes to the handler, which writes the response
/// * a malformed request is answered with `400 Bad Request`
/// * an I/O failure or a stream that ends mid-request closes without any response
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpConnection<R, W> {
    reader: R,
    writer: ResponseWriter<W>,
    config: ConnectionConfig,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ConnectionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: ConnectionConfig) -> Self {
        Self { reader, writer: ResponseWriter::new(writer), config }
    }

    pub async fn process<H>(mut self, handler: &H) -> Result<(), HttpError>
    where
        H: Handler<W> + ?Sized,
    {
        let decoder = RequestDecoder::with_max_request_size(self.config.max_request_size);
        let request = match read_request_with(&mut self.reader, decoder, self.config.read_buffer_capacity).await {
            Ok(request) => request,
            Err(e) if e.is_io() => {
                info!(cause = %e, "can't read a whole request, break this connection down");
                return Err(e.into());
            }
            Err(e) => {
                error!(cause = %e, "can't parse request, send bad request");
                self.send_bad_request().await?;
                return Err(e.into());
            }
        };

        debug!(method = request.method(), target = request.request_target(), "receive request");
        handler.call(&mut self.writer, &request).await;

        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    async fn send_bad_request(&mut self) -> Result<(), HttpError> {
        self.writer.write_status_line(StatusCode::BadRequest).await?;
        self.writer.write_headers(&default_headers(0)).await?;
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}
