//! Error types for request dispatch.
//!
//! # Design
//! Each fallible stage of a dispatch has its own variant so callers can tell
//! a malformed target from a network failure from a truncated body. Transport
//! failures keep the underlying error as their source; `is_timeout` is the
//! only classification layered on top of it.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Errors returned by the terminal dispatch methods of `Request`.
#[derive(Debug, Error)]
pub enum Error {
    /// The target address could not be parsed as an absolute URL.
    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The per-dispatch client could not be constructed.
    #[error("client initialization failed: {0}")]
    ClientInit(#[source] Box<dyn StdError + Send + Sync>),

    /// The method, a header, or the URI was rejected while assembling the
    /// wire request.
    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The round trip failed before a response head arrived.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The response body could not be read to the end.
    #[error("reading response body failed: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the dispatch failed because its deadline expired.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Transport(err) => err.is_timeout(),
            Error::Io(err) => err.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A network or protocol failure reported by a `Transport`.
#[derive(Debug)]
pub struct TransportError {
    timeout: bool,
    source: Box<dyn StdError + Send + Sync>,
}

impl TransportError {
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            timeout: false,
            source: source.into(),
        }
    }

    /// Wrap `source` and mark the failure as an expired deadline.
    pub fn timeout(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            timeout: true,
            source: source.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.source
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timeout {
            write!(f, "timed out: {}", self.source)
        } else {
            fmt::Display::fmt(&self.source, f)
        }
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        let timeout = match &err {
            ureq::Error::Timeout(_) => true,
            ureq::Error::Io(io) => io.kind() == std::io::ErrorKind::TimedOut,
            _ => false,
        };
        Self {
            timeout,
            source: Box::new(err),
        }
    }
}
