//! The client built for a single dispatch.
//!
//! # Design
//! `Client` pairs a fresh `Jar` with a transport and lives only as long as
//! one dispatch. Nothing is shared between dispatches: no connection pool
//! and no cookie jar, so cookies received by one dispatch are never sent by
//! the next unless the caller attaches them again.
//!
//! Redirects are followed here rather than in the transport, so every hop
//! gets the jar's cookies for its own URL and every hop's `Set-Cookie`
//! headers land in the jar. The timeout is one deadline for the whole
//! dispatch, redirects included, whichever transport runs it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION};
use http::{Method, StatusCode, Version};
use tracing::debug;
use url::Url;

use crate::config::Options;
use crate::cookie::{Cookie, Jar};
use crate::error::{Error, Result, TransportError};
use crate::transport::{self, Transport, UreqTransport, WireRequest, WireResponse};

/// Redirect hops followed before a dispatch gives up.
pub const MAX_REDIRECTS: usize = 10;

pub struct Client {
    url: Url,
    jar: Jar,
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl Client {
    /// Build the client for a dispatch to `target`: an empty jar, the parsed
    /// target, the accumulated `cookies` scoped to it, and the transport
    /// described by `options`.
    pub fn new(target: &str, cookies: &[Cookie<'static>], options: &Options) -> Result<Self> {
        let mut jar = Jar::new();
        let url = Url::parse(target).map_err(|source| Error::Url {
            url: target.to_string(),
            source,
        })?;
        jar.set_cookies(&url, cookies);

        let transport: Arc<dyn Transport> = match &options.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(UreqTransport::new(options.timeout, options.proxy.as_deref())?),
        };
        Ok(Self {
            url,
            jar,
            transport,
            timeout: options.timeout,
        })
    }

    /// The parsed target this client was built for.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Run `request`, following redirects. Each hop carries the jar cookies
    /// that match its URL, and each response's cookies are remembered.
    pub fn execute(&mut self, request: WireRequest) -> Result<WireResponse> {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        let mut hop = Hop::from_request(request);
        let mut url = self.url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let request = hop.to_request(&url, self.jar.header_for(&url))?;
            let response = match deadline {
                Some(deadline) => transport::round_trip_within(&self.transport, request, deadline)?,
                None => self.transport.round_trip(request)?,
            };
            debug!(%url, status = response.status().as_u16(), "response head received");
            self.jar.store_response(&url, response.headers());

            let Some(next) = redirect_target(&url, &response)? else {
                return Ok(response);
            };
            debug!(from = %url, to = %next, "following redirect");
            hop.redirect(response.status(), &self.url, &next);
            url = next;
        }
        Err(TransportError::new(format!("stopped after {MAX_REDIRECTS} redirects")).into())
    }
}

/// The parts of the caller's request that are replayed on every hop.
struct Hop {
    method: Method,
    version: Version,
    headers: HeaderMap,
    cookie: Option<HeaderValue>,
    body: Option<Vec<u8>>,
}

impl Hop {
    fn from_request(request: WireRequest) -> Self {
        let (mut parts, body) = request.into_parts();
        let cookie = parts.headers.remove(COOKIE);
        Self {
            method: parts.method,
            version: parts.version,
            headers: parts.headers,
            cookie,
            body,
        }
    }

    /// The wire request for `url`. The caller's `Cookie` header comes first,
    /// then the jar's cookies for `url`.
    fn to_request(&self, url: &Url, jar_cookies: Option<String>) -> Result<WireRequest> {
        let mut request = http::Request::builder()
            .method(self.method.clone())
            .uri(url.as_str())
            .version(self.version)
            .body(self.body.clone())?;
        *request.headers_mut() = self.headers.clone();

        let explicit = self.cookie.as_ref().and_then(|v| v.to_str().ok());
        let value = match (explicit, jar_cookies) {
            (Some(existing), Some(cookies)) => Some(format!("{existing}; {cookies}")),
            (Some(existing), None) => Some(existing.to_string()),
            (None, cookies) => cookies,
        };
        if let Some(value) = value {
            let value = HeaderValue::from_str(&value).map_err(http::Error::from)?;
            request.headers_mut().insert(COOKIE, value);
        }
        Ok(request)
    }

    /// Rewrite the replayed request after a `status` redirect from `origin`'s
    /// dispatch to `next`.
    fn redirect(&mut self, status: StatusCode, origin: &Url, next: &Url) {
        if !matches!(status, StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT) {
            if self.method != Method::GET && self.method != Method::HEAD {
                self.method = Method::GET;
            }
            self.body = None;
            self.headers.remove(CONTENT_TYPE);
            self.headers.remove(CONTENT_LENGTH);
        }
        if !same_site(origin, next) {
            self.headers.remove(AUTHORIZATION);
            self.cookie = None;
        }
    }
}

/// Where a redirect response points, or `None` when it should be returned
/// as is.
fn redirect_target(url: &Url, response: &WireResponse) -> Result<Option<Url>> {
    let followed = matches!(
        response.status(),
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    let location = match response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) {
        Some(location) if followed && !location.is_empty() => location,
        _ => return Ok(None),
    };
    url.join(location).map(Some).map_err(|source| Error::Url {
        url: location.to_string(),
        source,
    })
}

/// Whether headers set for `origin` may follow a redirect to `next`: the
/// same host or one of its subdomains.
fn same_site(origin: &Url, next: &Url) -> bool {
    match (origin.host_str(), next.host_str()) {
        (Some(origin), Some(next)) => {
            next.eq_ignore_ascii_case(origin)
                || next
                    .to_ascii_lowercase()
                    .ends_with(&format!(".{}", origin.to_ascii_lowercase()))
        }
        _ => false,
    }
}
