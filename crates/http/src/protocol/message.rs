use crate::protocol::{HeaderTable, StatusCode};

/// One piece of an outgoing response, in the order a handler emits them.
///
/// The encoder turns each part into wire bytes independently, so the same
/// [`HeaderTable`] serialization serves both the header section and the trailers.
#[derive(Debug, Clone, Copy)]
pub enum ResponsePart<'a> {
    /// `HTTP/1.1 <code> <reason>\r\n`
    StatusLine(StatusCode),
    /// Header lines followed by the blank line; also used for trailers
    Headers(&'a HeaderTable),
    /// Raw body bytes, written verbatim
    Body(&'a [u8]),
    /// Data of a chunked body
    Chunk(PayloadItem<'a>),
}

/// An item of a chunked body: either a data chunk or the terminal zero chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadItem<'a> {
    /// A chunk of payload data
    Chunk(&'a [u8]),
    /// Marks the end of the chunked payload, trailers may follow
    Eof,
}

impl PayloadItem<'_> {
    /// Returns true if this item represents the end of the payload stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains chunk data
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }
}
