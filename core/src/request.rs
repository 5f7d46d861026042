//! The request builder and dispatcher.
//!
//! # Design
//! `Request` is a mutable builder: configuration methods take `&mut self`
//! and return it for chaining. The terminal methods (`send`, `body`, `json`,
//! `form`) take a snapshot of the current state, build a fresh `Client`,
//! run one exchange and capture the response. A builder can be dispatched
//! again; each dispatch sees whatever was changed in between.
//!
//! Stages run in a fixed order and stop at the first failure: client
//! construction (URL, jar, transport), wire request assembly, round trip,
//! body read, hook.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::config::{timeout_from_secs, Options};
use crate::cookie::Cookie;
use crate::error::{Error, Result};
use crate::header::{Headers, CONTENT_TYPE, REFERER, USER_AGENT};
use crate::response::{Response, Sent};
use crate::trace::{span_handler, DebugHandler, TraceSpan};
use crate::transport::{Transport, WireRequest};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A single HTTP request under construction.
pub struct Request {
    method: String,
    url: String,
    headers: Headers,
    cookies: Vec<Cookie<'static>>,
    body: Vec<u8>,
    debug: Option<DebugHandler>,
    options: Options,
}

impl Request {
    /// A builder for `method` on `url` carrying only the default
    /// `User-Agent`. The URL is not validated until dispatch.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            cookies: Vec::new(),
            body: Vec::new(),
            debug: None,
            options: Options::default(),
        }
    }

    /// Timeout in whole seconds for the whole exchange; `0` clears it.
    pub fn timeout(&mut self, secs: u64) -> &mut Self {
        self.options.timeout = timeout_from_secs(secs);
        self
    }

    /// Replace the network transport, e.g. with a mock.
    pub fn transport(&mut self, transport: impl Transport + 'static) -> &mut Self {
        self.options.transport = Some(Arc::new(transport));
        self
    }

    /// Route the network transport through the proxy at `url`.
    pub fn proxy(&mut self, url: impl Into<String>) -> &mut Self {
        self.options.proxy = Some(url.into());
        self
    }

    /// Replace all per-call options at once.
    pub fn options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    pub fn header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.set(name, value);
        self
    }

    /// Set every header in `headers`, overwriting existing values.
    pub fn headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.headers.extend(headers);
        self
    }

    pub fn user_agent(&mut self, user_agent: &str) -> &mut Self {
        self.header(USER_AGENT, user_agent)
    }

    pub fn referer(&mut self, referer: &str) -> &mut Self {
        self.header(REFERER, referer)
    }

    /// Attach a cookie. Cookies are not deduplicated; the jar decides which
    /// of them are sent.
    pub fn cookie(&mut self, cookie: Cookie<'static>) -> &mut Self {
        self.cookies.push(cookie);
        self
    }

    /// Call `handler` with every captured response. Replaces any previous
    /// debug or trace hook.
    pub fn debug(&mut self, handler: impl Fn(&Response) + Send + 'static) -> &mut Self {
        self.debug = Some(Box::new(handler));
        self
    }

    /// Record every exchange as a `gozzle` event on `span`. Replaces any
    /// previous debug or trace hook.
    pub fn trace(&mut self, span: impl TraceSpan + Send + 'static) -> &mut Self {
        self.debug = Some(span_handler(span));
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current headers, one value per name.
    pub fn get_headers(&self) -> BTreeMap<String, String> {
        self.headers.to_map()
    }

    /// Set the body and dispatch.
    pub fn body(&mut self, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.body = body.into();
        self.send()
    }

    /// Send `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<Response> {
        self.header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        let body = serde_json::to_vec(value).map_err(Error::Serialization)?;
        self.body(body)
    }

    /// Send `pairs` as an urlencoded form body, in the order given.
    pub fn form<I, K, V>(&mut self, pairs: I) -> Result<Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
        self.body(encode_form(pairs))
    }

    /// Dispatch with the current body.
    pub fn send(&mut self) -> Result<Response> {
        let mut client = Client::new(&self.url, &self.cookies, &self.options)?;
        let sent = self.snapshot();
        let wire = sent.to_wire(client.url().as_str())?;
        debug!(method = %sent.method, url = %client.url(), bytes = sent.body.len(), "dispatching request");
        let response = client.execute(wire)?;
        Response::capture(sent, response, self.debug.as_ref())
    }

    fn snapshot(&self) -> Sent {
        Sent {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

impl Sent {
    /// Assemble the wire request. An empty body is sent as no body at all.
    pub(crate) fn to_wire(&self, uri: &str) -> Result<WireRequest> {
        let mut builder = http::Request::builder()
            .method(self.method.as_str())
            .uri(uri);
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value);
        }
        let body = (!self.body.is_empty()).then(|| self.body.clone());
        Ok(builder.body(body)?)
    }
}

impl fmt::Display for Request {
    /// The request body as text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.body))
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("body_len", &self.body.len())
            .field("debug", &self.debug.is_some())
            .field("options", &self.options)
            .finish()
    }
}

/// `application/x-www-form-urlencoded` serialization of `pairs`.
pub fn encode_form<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}
