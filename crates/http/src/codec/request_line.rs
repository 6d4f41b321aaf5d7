//! Parsing of the request line: `<method> SP <request-target> SP HTTP/1.1 CRLF`.

use crate::codec::header::is_token_char;
use crate::codec::{CRLF, find_crlf};
use crate::ensure;
use crate::protocol::{ParseError, RequestLine};

/// Parses the request line at the start of `data`.
///
/// # Returns
///
/// - `Ok(Some((line, n)))`: the line was complete, `n` counts it together with its CRLF
/// - `Ok(None)`: no CRLF yet, more data is needed
/// - `Err(ParseError)`: the line is complete but malformed
pub(crate) fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(index) = find_crlf(data) else {
        return Ok(None);
    };

    let line = &data[..index];
    let parts: Vec<&[u8]> = line.split(|b| *b == b' ').collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(ParseError::malformed_request_line(format!("expect 3 parts, found {}", parts.len())));
    };

    ensure!(!method.is_empty() && method.iter().all(|b| is_token_char(*b)), ParseError::malformed_request_line("invalid method"));
    ensure!(
        !target.is_empty() && !target.iter().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()),
        ParseError::malformed_request_line("invalid request-target")
    );

    let mut version_parts = version.split(|b| *b == b'/');
    let http_version = match (version_parts.next(), version_parts.next(), version_parts.next()) {
        (Some(b"HTTP"), Some(number @ b"1.1"), None) => number,
        _ => return Err(ParseError::unsupported_version(String::from_utf8_lossy(version))),
    };

    let target = std::str::from_utf8(target).map_err(|_e| ParseError::malformed_request_line("request-target is not valid utf-8"))?;

    let request_line = RequestLine::new(
        String::from_utf8_lossy(method).into_owned(),
        target.to_owned(),
        String::from_utf8_lossy(http_version).into_owned(),
    );

    Ok(Some((request_line, index + CRLF.len())))
}
