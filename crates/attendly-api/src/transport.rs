// Shared transport configuration for building reqwest::Client instances.
//
// Both the peripheral client and the tunnel agent client share timeout
// settings through this module, avoiding duplicated builder logic. The
// request timeout is deliberately independent of (and longer than) the
// notification polling interval so a hung peripheral degrades to
// repeated timeouts instead of stacking in-flight requests.

use std::time::Duration;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Per-request timeout applied to every call.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("attendly/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
