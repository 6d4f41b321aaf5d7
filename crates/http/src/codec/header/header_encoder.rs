//! Serialization of a [`HeaderTable`] into header lines.
//!
//! Every pair is written as `<name>: <value>\r\n` in insertion order and the section is
//! closed by a blank `\r\n`. The same format is used for the header section of a response
//! and for the trailer section after a chunked body.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::{HeaderTable, SendError};

/// Encoder for header sections implementing the [`Encoder`] trait.
#[derive(Debug)]
pub struct HeaderEncoder;

impl Encoder<&HeaderTable> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, headers: &HeaderTable, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let size = headers.iter().map(|(name, value)| name.len() + value.len() + 4).sum::<usize>() + 2;
        dst.reserve(size);

        for (name, value) in headers {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
