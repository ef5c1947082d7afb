// ── Runtime session configuration ──
//
// Describes *how* to talk to a peripheral: endpoint, timing, and the
// tunnel agent address. Built by the embedding layer and handed to
// `Session` -- core never reads config files.

use std::time::Duration;

use url::Url;

use attendly_api::tunnel::DEFAULT_AGENT_URL;

/// Configuration for a single peripheral session.
///
/// All timing values carry production defaults; tests shrink them.
/// The request timeout is intentionally longer than the poll interval
/// but bounded, so a hung peripheral degrades to repeated timeouts
/// rather than stacking in-flight requests.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Peripheral base address (scheme + host[:port], no path).
    /// `None` until the user configures one or tunnel discovery finds
    /// a public URL.
    pub endpoint: Option<Url>,
    /// Per-request timeout for every network call.
    pub request_timeout: Duration,
    /// Live-notification polling interval while scanning mode is on.
    pub poll_interval: Duration,
    /// How long a delivered live event stays displayed before it is
    /// auto-acknowledged.
    pub display_window: Duration,
    /// Grace delay before the one-shot registry reload that follows an
    /// accepted enrollment.
    pub enroll_grace: Duration,
    /// Interval between tunnel agent probes.
    pub tunnel_probe_interval: Duration,
    /// Management address of the local tunnel agent.
    pub tunnel_agent_url: Url,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout: Duration::from_secs(4),
            poll_interval: Duration::from_millis(500),
            display_window: Duration::from_secs(5),
            enroll_grace: Duration::from_secs(10),
            tunnel_probe_interval: Duration::from_secs(10),
            tunnel_agent_url: Url::parse(DEFAULT_AGENT_URL)
                .expect("default agent URL is valid"),
        }
    }
}
