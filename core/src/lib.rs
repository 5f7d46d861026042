//! Fluent, blocking HTTP requests.
//!
//! # Overview
//! A `Request` collects a method, a URL, headers, cookies, a body and
//! per-call options, then performs exactly one exchange per terminal call
//! and returns a fully read `Response`.
//!
//! ```no_run
//! let response = gozzle::post("https://example.com/api")
//!     .timeout(10)
//!     .header("Accept", "application/json")
//!     .json(&serde_json::json!({ "name": "gozzle" }))?;
//! println!("{} {}", response.status(), response.text());
//! # Ok::<(), gozzle::Error>(())
//! ```
//!
//! # Design
//! - Every dispatch builds its own client and cookie jar; nothing is pooled
//!   or shared between requests.
//! - The network sits behind the `Transport` trait, so a closure can stand in
//!   for it in tests. The timeout bounds whichever transport runs.
//! - Redirects are followed by the client, which sends the jar's cookies on
//!   every hop.
//! - Hooks (`debug`, `trace`) run synchronously once per successful
//!   dispatch; a panicking hook unwinds through the dispatch call.

pub mod client;
pub mod config;
pub mod cookie;
pub mod error;
pub mod header;
pub mod request;
pub mod response;
pub mod trace;
pub mod transport;

pub use crate::config::Options;
pub use crate::cookie::Cookie;
pub use crate::error::{Error, Result, TransportError};
pub use crate::header::DEFAULT_USER_AGENT;
pub use crate::request::Request;
pub use crate::response::{Response, Sent};
pub use crate::trace::{DebugHandler, TraceSpan};
pub use crate::transport::{Transport, UreqTransport, WireRequest, WireResponse};

/// Start a request with an arbitrary method.
pub fn new(method: impl Into<String>, url: impl Into<String>) -> Request {
    Request::new(method, url)
}

pub fn get(url: impl Into<String>) -> Request {
    Request::new("GET", url)
}

pub fn post(url: impl Into<String>) -> Request {
    Request::new("POST", url)
}

pub fn put(url: impl Into<String>) -> Request {
    Request::new("PUT", url)
}

pub fn delete(url: impl Into<String>) -> Request {
    Request::new("DELETE", url)
}
