//! Incremental parser for the header section of a request.
//!
//! The parser works one `name: value\r\n` line at a time and keeps no state of its own:
//! whatever could not be consumed stays in the caller's buffer and is offered again on
//! the next call, once more bytes have been read.
//!
//! # Field line rules
//!
//! - the field name must be a non-empty token: letters, digits or one of ``!#$%&'*+-.^_`|~``
//! - no whitespace is allowed between the name and the colon, nor before the name
//! - the value is trimmed of surrounding whitespace and must be valid utf-8
//! - a repeated name is folded into the first one as `first,second`

use tracing::trace;

use crate::codec::{CRLF, find_crlf};
use crate::ensure;
use crate::protocol::{HeaderTable, ParseError};

impl HeaderTable {
    /// Parses as many complete header lines as `data` holds, starting at offset 0.
    ///
    /// # Returns
    ///
    /// - `Ok((n, false))`: `n` bytes of complete lines were consumed, the next line is not
    ///   complete yet (`n` may be 0)
    /// - `Ok((n, true))`: the terminating blank line was reached and consumed
    /// - `Err(ParseError)`: a line is malformed; nothing is consumed and the table is
    ///   left untouched
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidHeader` if a line has no colon, an empty or
    /// whitespace-padded name, a name with a non-token character, or a non utf-8 value.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), ParseError> {
        let mut read = 0;
        let mut done = false;
        let mut fields = Vec::new();

        while let Some(index) = find_crlf(&data[read..]) {
            if index == 0 {
                read += CRLF.len();
                done = true;
                break;
            }

            fields.push(parse_field_line(&data[read..read + index])?);
            read += index + CRLF.len();
        }

        for (name, value) in fields {
            self.append(name, value);
        }

        trace!(consumed = read, done, "parsed header lines");
        Ok((read, done))
    }
}

fn parse_field_line(line: &[u8]) -> Result<(&str, &str), ParseError> {
    let colon = line.iter().position(|b| *b == b':').ok_or_else(|| ParseError::invalid_header("missing colon in field line"))?;

    let name = &line[..colon];
    ensure!(!name.is_empty(), ParseError::invalid_header("empty field name"));
    ensure!(
        !name.iter().any(|b| b.is_ascii_whitespace()),
        ParseError::invalid_header("whitespace between field name and colon")
    );
    ensure!(name.iter().all(|b| is_token_char(*b)), ParseError::invalid_header("invalid character in field name"));

    // token chars are plain ascii, so this only fails on a broken invariant above
    let name = std::str::from_utf8(name).map_err(|e| ParseError::invalid_header(e.to_string()))?;
    let value = std::str::from_utf8(line[colon + 1..].trim_ascii())
        .map_err(|e| ParseError::invalid_header(format!("field value is not valid utf-8: {e}")))?;

    Ok((name, value))
}

/// `tchar` from RFC 9110, section 5.6.2.
pub(crate) fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
