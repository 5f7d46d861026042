//! The transport seam.
//!
//! # Design
//! A dispatch hands a fully assembled `WireRequest` to a `Transport` and gets
//! back the response head plus an unread body stream. Everything above the
//! seam (cookies, headers, capture, hooks) is shared by every transport, so
//! a mock transport exercises the same pipeline as the network one.
//!
//! The request body is an `Option` so a bodiless request stays bodiless all
//! the way to the wire instead of turning into a zero-length payload.
//!
//! A transport performs exactly one exchange. Redirects are returned as
//! responses and followed by the client, which owns the cookie jar.
//!
//! `round_trip_within` bounds any transport, including a caller's override,
//! by running the exchange on a worker thread and giving up at the deadline.
//! An abandoned exchange finishes in the background and its result is
//! dropped.

use std::io::{self, Cursor, Read};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, TransportError};

/// A request as handed to a transport.
pub type WireRequest = http::Request<Option<Vec<u8>>>;

/// A response head with its body still unread. Dropping the body releases
/// the underlying connection.
pub type WireResponse = http::Response<Box<dyn Read>>;

/// Executes one request/response exchange.
pub trait Transport: Send + Sync {
    fn round_trip(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(WireRequest) -> Result<WireResponse, TransportError> + Send + Sync,
{
    fn round_trip(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        self(request)
    }
}

/// Network transport backed by a `ureq::Agent` built for a single dispatch.
///
/// Non-2xx statuses are returned as responses, not errors, and so are 3xx
/// statuses: `ureq` never follows a redirect itself. `ureq`'s own cookie
/// handling is not used; cookies come from the dispatch's `Jar`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` bounds the whole exchange, from connect to the last body
    /// byte. `proxy` is a proxy URL such as `http://localhost:3128`.
    pub fn new(timeout: Option<Duration>, proxy: Option<&str>) -> Result<Self, Error> {
        let proxy = proxy
            .map(ureq::Proxy::new)
            .transpose()
            .map_err(|e| Error::ClientInit(Box::new(e)))?;
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .max_redirects(0)
            .proxy(proxy)
            .build()
            .new_agent();
        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn round_trip(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let (parts, body) = request.into_parts();
        debug!(method = %parts.method, uri = %parts.uri, "sending over network");
        let response = match body {
            Some(bytes) => self.agent.run(http::Request::from_parts(parts, &bytes[..])),
            None => self.agent.run(http::Request::from_parts(parts, ())),
        }?;
        let (parts, body) = response.into_parts();
        let reader: Box<dyn Read> = Box::new(body.into_reader());
        Ok(http::Response::from_parts(parts, reader))
    }
}

/// Run `request` through `transport`, failing with a timeout error once
/// `deadline` passes. The deadline covers the response body too: the body is
/// read in full before this returns.
pub fn round_trip_within(
    transport: &Arc<dyn Transport>,
    request: WireRequest,
    deadline: Instant,
) -> Result<WireResponse, TransportError> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(TransportError::timeout("deadline exceeded before sending"));
    }

    let (tx, rx) = mpsc::channel();
    let transport = Arc::clone(transport);
    thread::Builder::new()
        .name("gozzle-exchange".to_string())
        .spawn(move || {
            let outcome = transport.round_trip(request).map(|response| {
                let (parts, mut body) = response.into_parts();
                let mut bytes = Vec::new();
                let failure = body.read_to_end(&mut bytes).err();
                (parts, bytes, failure)
            });
            // The receiver is gone once the deadline has passed.
            let _ = tx.send(outcome);
        })
        .map_err(TransportError::new)?;

    match rx.recv_timeout(remaining) {
        Ok(outcome) => {
            let (parts, bytes, failure) = outcome?;
            let body: Box<dyn Read> = Box::new(Buffered {
                bytes: Cursor::new(bytes),
                failure,
            });
            Ok(http::Response::from_parts(parts, body))
        }
        Err(RecvTimeoutError::Timeout) => {
            debug!(timeout = ?remaining, "exchange abandoned at deadline");
            Err(TransportError::timeout("deadline exceeded"))
        }
        Err(RecvTimeoutError::Disconnected) => {
            Err(TransportError::new("transport ended without a response"))
        }
    }
}

/// A body read ahead of time. A read failure is replayed after the bytes
/// that arrived before it.
struct Buffered {
    bytes: Cursor<Vec<u8>>,
    failure: Option<io::Error>,
}

impl Read for Buffered {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.bytes.read(buf)?;
        if n == 0 && !buf.is_empty() {
            if let Some(failure) = self.failure.take() {
                return Err(failure);
            }
        }
        Ok(n)
    }
}
