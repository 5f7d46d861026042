//! Per-call client options.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::transport::Transport;

/// Environment variable holding a default timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "GOZZLE_TIMEOUT";

/// Environment variable holding a default proxy URL.
pub const PROXY_ENV: &str = "GOZZLE_PROXY";

/// Configuration applied to the client built for each dispatch.
#[derive(Clone, Default)]
pub struct Options {
    /// Deadline for the whole exchange. `None` leaves the exchange unbounded.
    pub timeout: Option<Duration>,
    /// Replaces the network transport. The timeout still bounds the
    /// exchange; the proxy is ignored.
    pub transport: Option<Arc<dyn Transport>>,
    /// Proxy URL for the network transport.
    pub proxy: Option<String>,
}

impl Options {
    /// Options seeded from `GOZZLE_TIMEOUT` and `GOZZLE_PROXY`. Unset, empty,
    /// or unparsable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = lookup(TIMEOUT_ENV).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) => timeout_from_secs(secs),
            Err(error) => {
                warn!(value = %raw, %error, "ignoring {TIMEOUT_ENV}");
                None
            }
        });
        let proxy = lookup(PROXY_ENV).filter(|p| !p.trim().is_empty());
        Self {
            timeout,
            transport: None,
            proxy,
        }
    }
}

/// Zero seconds means no explicit timeout.
pub(crate) fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("timeout", &self.timeout)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("proxy", &self.proxy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_are_empty() {
        let options = Options::from_lookup(lookup(&[]));
        assert!(options.timeout.is_none());
        assert!(options.proxy.is_none());
        assert!(options.transport.is_none());
    }

    #[test]
    fn reads_timeout_and_proxy() {
        let options = Options::from_lookup(lookup(&[
            (TIMEOUT_ENV, " 5 "),
            (PROXY_ENV, "http://localhost:3128"),
        ]));
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.proxy.as_deref(), Some("http://localhost:3128"));
    }

    #[test]
    fn zero_or_garbage_timeout_is_ignored() {
        assert!(Options::from_lookup(lookup(&[(TIMEOUT_ENV, "0")])).timeout.is_none());
        assert!(Options::from_lookup(lookup(&[(TIMEOUT_ENV, "soon")])).timeout.is_none());
        assert!(Options::from_lookup(lookup(&[(PROXY_ENV, "  ")])).proxy.is_none());
    }
}
