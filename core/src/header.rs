//! The request header store.
//!
//! # Design
//! Names are canonicalized on the way in (`user-agent` becomes
//! `User-Agent`), so a plain ordered map gives case-insensitive
//! last-write-wins semantics and a deterministic wire order. Values are
//! validated only when the wire request is assembled, which keeps every
//! chainable setter infallible.

use std::collections::BTreeMap;

use http::HeaderMap;

/// `User-Agent` sent with every request unless the caller overrides it.
pub const DEFAULT_USER_AGENT: &str = concat!("Gozzle/", env!("CARGO_PKG_VERSION"));

pub const USER_AGENT: &str = "User-Agent";
pub const REFERER: &str = "Referer";
pub const CONTENT_TYPE: &str = "Content-Type";

/// Case-insensitive, single-valued header map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    /// A store holding only the default `User-Agent`.
    pub fn new() -> Self {
        let mut headers = Self::empty();
        headers.set(USER_AGENT, DEFAULT_USER_AGENT);
        headers
    }

    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Set `name` to `value`, replacing any previous value for the name.
    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(canonical_name(name), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&canonical_name(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Plain name to value copy of the store.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries.clone()
    }
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name.as_ref(), value.as_ref());
        }
    }
}

/// Canonical MIME form of a header name: the first letter and every letter
/// following a hyphen are upper-cased, the rest lower-cased. Names holding
/// anything other than token characters are returned unchanged.
pub fn canonical_name(name: &str) -> String {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Flatten a multi-valued map to one value per name. The first value wins;
/// values that are not visible ASCII are skipped.
pub fn flatten(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for name in headers.keys() {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            out.insert(canonical_name(name.as_str()), value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_holds_only_the_default_user_agent() {
        let headers = Headers::new();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("user-agent"), Some(DEFAULT_USER_AGENT));
        assert!(DEFAULT_USER_AGENT.starts_with("Gozzle/"));
    }

    #[test]
    fn set_is_case_insensitive_last_write_wins() {
        let mut headers = Headers::empty();
        headers.set("x-token", "one");
        headers.set("X-TOKEN", "two");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-Token"), Some("two"));
    }

    #[test]
    fn extend_overwrites_existing_names() {
        let mut headers = Headers::new();
        headers.extend([("user-agent", "custom/2"), ("accept", "*/*")]);
        assert_eq!(headers.get(USER_AGENT), Some("custom/2"));
        assert_eq!(headers.get("Accept"), Some("*/*"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn canonical_name_forms() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("X-FORWARDED-FOR"), "X-Forwarded-For");
        assert_eq!(canonical_name("etag"), "Etag");
        assert_eq!(canonical_name("bad name"), "bad name");
    }

    #[test]
    fn flatten_keeps_first_value() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", "a=1".parse().unwrap());
        map.append("set-cookie", "b=2".parse().unwrap());
        map.insert("content-length", "3".parse().unwrap());
        let flat = flatten(&map);
        assert_eq!(flat.get("Set-Cookie").map(String::as_str), Some("a=1"));
        assert_eq!(flat.get("Content-Length").map(String::as_str), Some("3"));
    }
}
