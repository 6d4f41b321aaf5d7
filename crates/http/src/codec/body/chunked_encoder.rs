use crate::protocol::{PayloadItem, SendError};
use bytes::{BufMut, BytesMut};
use std::io::Write;

use tokio_util::codec::Encoder;
use tracing::warn;

/// Encoder for `Transfer-Encoding: chunked` bodies.
///
/// Each data chunk is framed as `<hex size>\r\n<data>\r\n`. The end of the body is the
/// bare `0\r\n` line: the trailer section (possibly empty) and its closing blank line are
/// written separately by the header encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    send_size: usize,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false, send_size: 0 }
    }

    /// Returns true once the terminal chunk has been written
    pub fn is_finish(&self) -> bool {
        self.eof
    }

    /// Total payload bytes framed so far, excluding chunk headers
    pub fn send_size(&self) -> usize {
        self.send_size
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<PayloadItem<'_>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<'_>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            warn!(is_eof = item.is_eof(), "chunked body already finished, ignore payload item");
            return Ok(());
        }

        match item {
            // a zero sized chunk would be read as the end of the body
            PayloadItem::Chunk(bytes) if bytes.is_empty() => Ok(()),
            PayloadItem::Chunk(bytes) => {
                dst.reserve(bytes.len() + 20);
                write!(helper::Writer(dst), "{:x}\r\n", bytes.len())?;
                dst.put_slice(bytes);
                dst.put_slice(b"\r\n");
                self.send_size += bytes.len();
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.put_slice(b"0\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
