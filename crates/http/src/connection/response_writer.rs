use crate::codec::ResponseEncoder;
use crate::protocol::{HeaderTable, PayloadItem, ResponsePart, SendError, StatusCode};
use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::trace;

/// Initial size of the scratch buffer parts are encoded into before hitting the socket
const INIT_BUFFER_SIZE: usize = 4 * 1024;

/// Builds the baseline response headers, in this order:
///
/// ```text
/// Content-Length: <content_length>
/// Content-Type: text/plain
/// Connection: close
/// ```
///
/// Handlers are expected to adjust them, e.g. replace `Content-Type`, or remove
/// `Content-Length` when switching to chunked framing.
pub fn default_headers(content_length: usize) -> HeaderTable {
    let mut headers = HeaderTable::with_capacity(3);
    headers.set("Content-Length", content_length.to_string());
    headers.set("Content-Type", mime::TEXT_PLAIN.as_ref());
    headers.set("Connection", "close");
    headers
}

/// Writes a response to the connection, one part at a time.
///
/// The writer does not check the order of the calls. A well formed response is a status
/// line, then the headers, then either a plain body or chunks followed by
/// [`write_chunked_body_done`](Self::write_chunked_body_done) and the trailers.
///
/// The status line and the header section are held in the buffer and leave together with
/// the first body write, or on [`flush`](Self::flush).
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
    buffer: BytesMut,
    encoder: ResponseEncoder,
    announced_trailers: Vec<String>,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, INIT_BUFFER_SIZE)
    }

    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(buffer_size), encoder: ResponseEncoder::new(), announced_trailers: Vec::new() }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Returns the sink, bytes still held in the buffer are discarded: flush first.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), SendError> {
        self.send(ResponsePart::StatusLine(status)).await
    }

    /// Writes the status line for a numeric code.
    ///
    /// # Errors
    ///
    /// Returns `SendError::UnrecognizedStatusCode` without writing anything when `code` is
    /// not one of the supported [`StatusCode`]s.
    pub async fn write_status_code(&mut self, code: u16) -> Result<(), SendError> {
        let status = StatusCode::try_from(code)?;
        self.write_status_line(status).await
    }

    /// Writes every header as `<name>: <value>\r\n` in insertion order, then the blank line.
    ///
    /// Names listed in a `Trailer` header are remembered for [`write_trailers`](Self::write_trailers).
    pub async fn write_headers(&mut self, headers: &HeaderTable) -> Result<(), SendError> {
        if !self.encoder.is_chunked_finish()
            && let Some(trailer) = headers.get("Trailer")
        {
            self.announced_trailers = trailer.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_owned).collect();
        }

        self.send(ResponsePart::Headers(headers)).await
    }

    /// Writes `body` verbatim and returns the number of bytes written.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, SendError> {
        self.send(ResponsePart::Body(body)).await?;
        Ok(body.len())
    }

    /// Writes `chunk` framed as `<hex size>\r\n<chunk>\r\n` and returns its size.
    ///
    /// An empty chunk writes nothing and returns 0, it does not end the body: that is
    /// the job of [`write_chunked_body_done`](Self::write_chunked_body_done).
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<usize, SendError> {
        if chunk.is_empty() {
            return Ok(0);
        }

        self.send(ResponsePart::Chunk(PayloadItem::Chunk(chunk))).await?;
        Ok(chunk.len())
    }

    /// Writes the terminal `0\r\n` chunk and returns the number of bytes written.
    ///
    /// The message is not complete yet: the trailer section, possibly empty, must follow
    /// through [`write_trailers`](Self::write_trailers) or [`write_headers`](Self::write_headers).
    pub async fn write_chunked_body_done(&mut self) -> Result<usize, SendError> {
        let before = self.encoder.is_chunked_finish();
        self.send(ResponsePart::Chunk(PayloadItem::Eof)).await?;
        Ok(if before { 0 } else { b"0\r\n".len() })
    }

    /// Writes the trailer section after a chunked body.
    ///
    /// # Errors
    ///
    /// Returns `SendError::UndeclaredTrailer` without writing anything when a trailer
    /// name was not announced in the `Trailer` response header.
    pub async fn write_trailers(&mut self, trailers: &HeaderTable) -> Result<(), SendError> {
        if let Some((name, _)) =
            trailers.iter().find(|(name, _)| !self.announced_trailers.iter().any(|announced| announced.eq_ignore_ascii_case(name)))
        {
            return Err(SendError::undeclared_trailer(name));
        }

        self.send(ResponsePart::Headers(trailers)).await
    }

    /// Writes out anything held in the buffer, then flushes the sink.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        self.write_buffer().await?;
        Ok(self.writer.flush().await?)
    }

    /// Flushes and shuts down the write side of the connection.
    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.write_buffer().await?;
        Ok(self.writer.shutdown().await?)
    }

    async fn send(&mut self, part: ResponsePart<'_>) -> Result<(), SendError> {
        let hold = match part {
            ResponsePart::StatusLine(_) => true,
            ResponsePart::Headers(_) => !self.encoder.is_chunked_finish(),
            ResponsePart::Body(_) | ResponsePart::Chunk(_) => false,
        };

        self.encoder.encode(part, &mut self.buffer)?;
        if hold {
            return Ok(());
        }
        self.write_buffer().await
    }

    async fn write_buffer(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        trace!(size = self.buffer.len(), "write response bytes");
        let result = self.writer.write_all(&self.buffer).await;
        self.buffer.clear();
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Decodes a chunked body with `httparse`: returns the payload, the trailers and the bytes left.
    fn decode_chunked(mut data: &[u8]) -> (Vec<u8>, HeaderTable, &[u8]) {
        let mut payload = Vec::new();
        loop {
            let httparse::Status::Complete((size_end, size)) = httparse::parse_chunk_size(data).unwrap() else {
                panic!("incomplete chunk size line");
            };
            let size = usize::try_from(size).unwrap();
            data = &data[size_end..];
            if size == 0 {
                break;
            }
            payload.extend_from_slice(&data[..size]);
            assert_eq!(&data[size..size + 2], b"\r\n");
            data = &data[size + 2..];
        }

        let mut trailers = HeaderTable::new();
        let (n, done) = trailers.parse(data).unwrap();
        assert!(done);
        (payload, trailers, &data[n..])
    }

    async fn written(mut writer: ResponseWriter<Vec<u8>>) -> String {
        writer.flush().await.unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    /// Records every `poll_write` call separately.
    #[derive(Default)]
    struct WriteLog {
        writes: Vec<Vec<u8>>,
    }

    impl AsyncWrite for WriteLog {
        fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            self.writes.push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn default_headers_order() {
        let headers = default_headers(12);
        let pairs: Vec<_> = headers.iter().collect();

        assert_eq!(pairs, vec![("Content-Length", "12"), ("Content-Type", "text/plain"), ("Connection", "close")]);
    }

    #[tokio::test]
    async fn plain_response() {
        let mut writer = ResponseWriter::new(Vec::new());
        let body = b"<h1>Success!</h1>";

        let mut headers = default_headers(body.len());
        headers.set("Content-Type", "text/html");

        writer.write_status_line(StatusCode::Ok).await.unwrap();
        writer.write_headers(&headers).await.unwrap();
        assert_eq!(writer.write_body(body).await.unwrap(), body.len());

        assert_eq!(
            written(writer).await,
            "HTTP/1.1 200 OK\r\nContent-Length: 17\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<h1>Success!</h1>"
        );
    }

    #[tokio::test]
    async fn unrecognized_status_code_writes_nothing() {
        let mut writer = ResponseWriter::new(Vec::new());

        let result = writer.write_status_code(418).await;
        assert!(matches!(result, Err(SendError::UnrecognizedStatusCode(418))));

        writer.write_status_code(404).await.unwrap();
        assert_eq!(written(writer).await, "HTTP/1.1 404 Not Found\r\n");
    }

    #[tokio::test]
    async fn empty_chunk_is_noop() {
        let mut writer = ResponseWriter::new(Vec::new());

        assert_eq!(writer.write_chunked_body(b"").await.unwrap(), 0);
        assert!(writer.get_mut().is_empty());
    }

    #[tokio::test]
    async fn chunked_round_trip() {
        let mut writer = ResponseWriter::new(Vec::new());
        let pieces: [&[u8]; 4] = [b"Hello", b", ", &[b'x'; 300], b"world"];

        let mut headers = default_headers(0);
        headers.remove("Content-Length");
        headers.set("Transfer-Encoding", "chunked");
        headers.append("Trailer", "X-Content-SHA256");
        headers.append("Trailer", "X-Content-Length");

        writer.write_status_line(StatusCode::Ok).await.unwrap();
        writer.write_headers(&headers).await.unwrap();
        for piece in pieces {
            assert_eq!(writer.write_chunked_body(piece).await.unwrap(), piece.len());
        }
        assert_eq!(writer.write_chunked_body_done().await.unwrap(), 3);

        let expected: Vec<u8> = pieces.concat();
        let mut trailers = HeaderTable::new();
        trailers.set("X-Content-SHA256", "abc123");
        trailers.set("X-Content-Length", expected.len().to_string());
        writer.write_trailers(&trailers).await.unwrap();

        let output = writer.into_inner();
        let head_end = output.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
        let head = std::str::from_utf8(&output[..head_end]).unwrap();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nConnection: close\r\nTransfer-Encoding: chunked\r\n"));
        assert!(head.contains("Trailer: X-Content-SHA256,X-Content-Length\r\n"));

        let (payload, decoded_trailers, rest) = decode_chunked(&output[head_end..]);
        assert_eq!(payload, expected);
        assert_eq!(decoded_trailers.get("x-content-sha256"), Some("abc123"));
        assert_eq!(decoded_trailers.get("X-Content-Length"), Some("312"));
        assert_eq!(expected.len(), 312);
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn undeclared_trailer_is_rejected() {
        let mut writer = ResponseWriter::new(Vec::new());

        let mut headers = HeaderTable::new();
        headers.set("Transfer-Encoding", "chunked");
        headers.set("Trailer", "X-Checksum");
        writer.write_headers(&headers).await.unwrap();
        writer.write_chunked_body(b"data").await.unwrap();
        writer.write_chunked_body_done().await.unwrap();
        let before = writer.get_mut().len();

        let mut trailers = HeaderTable::new();
        trailers.set("x-checksum", "1");
        trailers.set("X-Other", "2");
        let result = writer.write_trailers(&trailers).await;

        assert!(matches!(result, Err(SendError::UndeclaredTrailer { name }) if name == "X-Other"));
        assert_eq!(writer.get_mut().len(), before);

        trailers.remove("X-Other");
        writer.write_trailers(&trailers).await.unwrap();
        assert!(written(writer).await.ends_with("4\r\ndata\r\n0\r\nx-checksum: 1\r\n\r\n"));
    }

    #[tokio::test]
    async fn empty_trailer_section() {
        let mut writer = ResponseWriter::new(Vec::new());

        writer.write_chunked_body(b"abc").await.unwrap();
        writer.write_chunked_body_done().await.unwrap();
        writer.write_trailers(&HeaderTable::new()).await.unwrap();

        assert_eq!(written(writer).await, "3\r\nabc\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn head_leaves_with_first_body_write() {
        let mut writer = ResponseWriter::new(WriteLog::default());

        writer.write_status_line(StatusCode::Ok).await.unwrap();
        writer.write_headers(&default_headers(2)).await.unwrap();
        assert!(writer.get_mut().writes.is_empty());

        writer.write_body(b"ok").await.unwrap();
        writer.flush().await.unwrap();

        let writes = &writer.get_mut().writes;
        assert_eq!(writes.len(), 1);
        assert!(writes[0].starts_with(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n"));
        assert!(writes[0].ends_with(b"\r\n\r\nok"));
    }

    #[tokio::test]
    async fn chunks_are_written_as_they_come() {
        let mut writer = ResponseWriter::new(WriteLog::default());

        writer.write_status_line(StatusCode::Ok).await.unwrap();
        writer.write_headers(&HeaderTable::from_iter([("Transfer-Encoding", "chunked")])).await.unwrap();
        writer.write_chunked_body(b"first").await.unwrap();
        assert_eq!(writer.get_mut().writes.len(), 1);

        writer.write_chunked_body(b"second").await.unwrap();
        writer.write_chunked_body_done().await.unwrap();
        writer.write_headers(&HeaderTable::new()).await.unwrap();

        let writes = &writer.get_mut().writes;
        assert_eq!(writes.len(), 4);
        assert!(writes[0].ends_with(b"\r\n\r\n5\r\nfirst\r\n"));
        assert_eq!(writes[1], b"6\r\nsecond\r\n");
        assert_eq!(writes[2], b"0\r\n");
        assert_eq!(writes[3], b"\r\n");
    }

    #[tokio::test]
    async fn flush_writes_a_lone_head() {
        let mut writer = ResponseWriter::new(WriteLog::default());

        writer.write_status_line(StatusCode::NotFound).await.unwrap();
        writer.write_headers(&default_headers(0)).await.unwrap();
        writer.shutdown().await.unwrap();

        let writes = &writer.get_mut().writes;
        assert_eq!(writes.len(), 1);
        assert!(writes[0].starts_with(b"HTTP/1.1 404 Not Found\r\n"));
    }
}
