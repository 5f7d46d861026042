//! Per-dispatch cookie jar.
//!
//! # Design
//! Scoping (domain/path matching, expiry, `Secure`) is delegated to
//! `cookie_store`. On top of it the jar refuses `Domain` attributes naming a
//! public suffix, using the list compiled into `psl`: a cookie for `co.uk`
//! must never be sent to every site under it. As with browsers, a cookie
//! whose domain is a public suffix equal to the request host is kept as a
//! host-only cookie.

use cookie_store::CookieStore;
use http::header::SET_COOKIE;
use http::HeaderMap;
use tracing::debug;
use url::Url;

pub use cookie::Cookie;

/// A cookie store that lives for exactly one dispatch.
#[derive(Debug, Default)]
pub struct Jar {
    store: CookieStore,
}

impl Jar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cookies` as if `url` had set them. Cookies the scoping rules
    /// reject are dropped.
    pub fn set_cookies(&mut self, url: &Url, cookies: &[Cookie<'static>]) {
        for cookie in cookies {
            let Some(cookie) = admit(cookie, url) else {
                debug!(cookie = cookie.name(), %url, "cookie domain is a public suffix, dropped");
                continue;
            };
            if let Err(error) = self.store.insert_raw(&cookie, url) {
                debug!(cookie = cookie.name(), %url, %error, "cookie rejected by jar");
            }
        }
    }

    /// Store every `Set-Cookie` found in a response received from `url`.
    pub fn store_response(&mut self, url: &Url, headers: &HeaderMap) {
        let cookies = response_cookies(headers);
        self.set_cookies(url, &cookies);
    }

    /// The `Cookie` header value to send to `url`, if any cookie matches.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let pairs: Vec<String> = self
            .store
            .get_request_values(url)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

/// Parse every well-formed `Set-Cookie` header. Malformed ones are skipped.
pub fn response_cookies(headers: &HeaderMap) -> Vec<Cookie<'static>> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| Cookie::parse(raw.to_string()).ok())
        .collect()
}

/// Apply the public-suffix rule to a cookie set for `url`.
fn admit(cookie: &Cookie<'static>, url: &Url) -> Option<Cookie<'static>> {
    let Some(domain) = cookie.domain() else {
        return Some(cookie.clone());
    };
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    if !is_public_suffix(&domain) {
        return Some(cookie.clone());
    }
    let host = url.host_str()?.to_ascii_lowercase();
    if host != domain {
        return None;
    }
    let mut host_only = cookie.clone();
    host_only.unset_domain();
    Some(host_only)
}

fn is_public_suffix(domain: &str) -> bool {
    psl::suffix_str(domain) == Some(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn host_only_cookie_goes_back_to_its_host() {
        let mut jar = Jar::new();
        let target = url("https://example.com/x");
        jar.set_cookies(&target, &[Cookie::new("session", "abc")]);
        assert_eq!(jar.header_for(&target).as_deref(), Some("session=abc"));
        assert_eq!(jar.header_for(&url("https://other.org/")), None);
    }

    #[test]
    fn domain_cookie_reaches_subdomains() {
        let mut jar = Jar::new();
        let cookie = Cookie::build(("id", "7")).domain("example.com").path("/").build();
        jar.set_cookies(&url("https://example.com/"), &[cookie]);
        assert_eq!(jar.header_for(&url("https://api.example.com/v1")).as_deref(), Some("id=7"));
        assert_eq!(jar.header_for(&url("https://example.org/")), None);
    }

    #[test]
    fn cookie_for_foreign_domain_is_dropped() {
        let mut jar = Jar::new();
        let cookie = Cookie::build(("id", "7")).domain("example.com").build();
        jar.set_cookies(&url("https://other.org/"), &[cookie]);
        assert_eq!(jar.header_for(&url("https://example.com/")), None);
        assert_eq!(jar.header_for(&url("https://other.org/")), None);
    }

    #[test]
    fn public_suffix_domain_is_refused() {
        let mut jar = Jar::new();
        let cookie = Cookie::build(("tracker", "1")).domain("co.uk").build();
        jar.set_cookies(&url("https://shop.co.uk/"), &[cookie]);
        assert_eq!(jar.header_for(&url("https://shop.co.uk/")), None);
        assert_eq!(jar.header_for(&url("https://bank.co.uk/")), None);
    }

    #[test]
    fn public_suffix_equal_to_host_becomes_host_only() {
        let mut jar = Jar::new();
        let cookie = Cookie::build(("a", "b")).domain("co.uk").build();
        jar.set_cookies(&url("https://co.uk/"), &[cookie]);
        assert_eq!(jar.header_for(&url("https://co.uk/")).as_deref(), Some("a=b"));
        assert_eq!(jar.header_for(&url("https://shop.co.uk/")), None);
    }

    #[test]
    fn response_cookies_skip_malformed_values() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, "session=abc; Path=/".parse().unwrap());
        headers.append(SET_COOKIE, "theme=dark".parse().unwrap());
        headers.append(SET_COOKIE, "=".parse().unwrap());
        let cookies = response_cookies(&headers);
        let names: Vec<&str> = cookies.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["session", "theme"]);
        assert_eq!(cookies[0].path(), Some("/"));
    }
}
