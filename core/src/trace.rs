//! Debug and trace hooks.
//!
//! A hook is called once per successful dispatch with the captured
//! `Response`. The trace hook is an ordinary debug hook that records the
//! exchange as an event on a span.

use tracing::Level;

use crate::response::Response;

/// Callback invoked with every captured response.
pub type DebugHandler = Box<dyn Fn(&Response) + Send>;

/// Name of the event recorded by the trace hook.
pub const EVENT_NAME: &str = "gozzle";

/// A span that can record a named event carrying string attributes.
pub trait TraceSpan {
    fn add_event(&self, name: &str, attributes: &[(&'static str, String)]);
}

impl TraceSpan for tracing::Span {
    fn add_event(&self, name: &str, attributes: &[(&'static str, String)]) {
        tracing::event!(
            parent: self,
            Level::INFO,
            event = name,
            request = attribute(attributes, "request"),
            response = attribute(attributes, "response"),
            "http exchange"
        );
    }
}

fn attribute<'a>(attributes: &'a [(&'static str, String)], key: &str) -> &'a str {
    attributes
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
        .unwrap_or_default()
}

/// Build a debug hook that adds one `gozzle` event to `span` with the
/// request and response string forms as `request` and `response`.
pub fn span_handler<S>(span: S) -> DebugHandler
where
    S: TraceSpan + Send + 'static,
{
    Box::new(move |response: &Response| {
        span.add_event(
            EVENT_NAME,
            &[
                ("request", response.request().to_string()),
                ("response", response.to_string()),
            ],
        );
    })
}
