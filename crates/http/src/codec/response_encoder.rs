use crate::codec::body::ChunkedEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{ResponsePart, SendError, StatusCode};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

/// Encodes the parts of a response into wire bytes.
///
/// The encoder does not enforce the order of the parts: status line, headers and body
/// are written exactly as the handler emits them.
#[derive(Debug)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
    chunked_encoder: ChunkedEncoder,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns true once the terminal `0` chunk has been encoded
    pub fn is_chunked_finish(&self) -> bool {
        self.chunked_encoder.is_finish()
    }
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder, chunked_encoder: ChunkedEncoder::new() }
    }
}

impl Encoder<ResponsePart<'_>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: ResponsePart<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            ResponsePart::StatusLine(status) => {
                encode_status_line(status, dst);
                Ok(())
            }
            ResponsePart::Headers(headers) => self.header_encoder.encode(headers, dst),
            ResponsePart::Body(bytes) => {
                dst.extend_from_slice(bytes);
                Ok(())
            }
            ResponsePart::Chunk(payload_item) => self.chunked_encoder.encode(payload_item, dst),
        }
    }
}

fn encode_status_line(status: StatusCode, dst: &mut BytesMut) {
    let reason = status.reason_phrase();
    dst.reserve(b"HTTP/1.1 200 \r\n".len() + reason.len());
    dst.put_slice(b"HTTP/1.1 ");
    dst.put_slice(status_code_bytes(status));
    dst.put_u8(b' ');
    dst.put_slice(reason.as_bytes());
    dst.put_slice(b"\r\n");
}

fn status_code_bytes(status: StatusCode) -> &'static [u8] {
    match status {
        StatusCode::Ok => b"200",
        StatusCode::Created => b"201",
        StatusCode::BadRequest => b"400",
        StatusCode::Unauthorized => b"401",
        StatusCode::Forbidden => b"403",
        StatusCode::NotFound => b"404",
        StatusCode::InternalServerError => b"500",
    }
}
