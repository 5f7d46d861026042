//! Captured responses.
//!
//! # Design
//! A `Response` is built only after the whole body has been read, so it is
//! a plain value: no open stream, no link back into the transport. The body
//! stream is owned by `capture` and dropped before it returns on every path,
//! which releases the connection even when the read fails midway.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cookie::{response_cookies, Cookie};
use crate::error::{Error, Result};
use crate::header::{self, Headers};
use crate::trace::DebugHandler;
use crate::transport::WireResponse;

/// The request state a response was produced from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl fmt::Display for Sent {
    /// The request body as text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}

/// An HTTP response with its body fully read.
#[derive(Debug, Clone)]
pub struct Response {
    request: Sent,
    status: StatusCode,
    headers: HeaderMap,
    cookies: Vec<Cookie<'static>>,
    body: Vec<u8>,
}

impl Response {
    /// Read `wire` to the end and build the response, then hand it to
    /// `hook` if one is registered.
    pub(crate) fn capture(
        request: Sent,
        wire: WireResponse,
        hook: Option<&DebugHandler>,
    ) -> Result<Self> {
        let (parts, mut stream) = wire.into_parts();
        let mut body = Vec::new();
        stream.read_to_end(&mut body)?;
        drop(stream);

        let response = Response {
            request,
            status: parts.status,
            cookies: response_cookies(&parts.headers),
            headers: parts.headers,
            body,
        };
        debug!(
            status = response.status.as_u16(),
            bytes = response.body.len(),
            "response captured"
        );

        if let Some(hook) = hook {
            hook(&response);
        }
        Ok(response)
    }

    /// What was sent to produce this response.
    pub fn request(&self) -> &Sent {
        &self.request
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of the header `name`, if present and valid text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// One value per header name; repeated headers keep their first value.
    pub fn headers_map(&self) -> BTreeMap<String, String> {
        header::flatten(&self.headers)
    }

    /// Cookies set by the server, in header order.
    pub fn cookies(&self) -> &[Cookie<'static>] {
        &self.cookies
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Error::Deserialization)
    }
}

impl fmt::Display for Response {
    /// The response body as text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}
