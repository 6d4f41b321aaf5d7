use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed request-line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("unsupported http version: {0:?}")]
    UnsupportedVersion(String),

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("request in error state")]
    RequestInErrorState,

    #[error("request size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeRequest { current_size: usize, max_size: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_request_line<S: ToString>(str: S) -> Self {
        Self::MalformedRequestLine { reason: str.to_string() }
    }

    pub fn unsupported_version<S: ToString>(str: S) -> Self {
        Self::UnsupportedVersion(str.to_string())
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn too_large_request(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeRequest { current_size, max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Whether the failure came from the transport rather than from the request bytes.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("unrecognized status code: {0}")]
    UnrecognizedStatusCode(u16),

    #[error("trailer {name} was not announced in the Trailer header")]
    UndeclaredTrailer { name: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn undeclared_trailer<S: ToString>(str: S) -> Self {
        Self::UndeclaredTrailer { name: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
