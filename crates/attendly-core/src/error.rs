// ── Core error types ──
//
// User-facing errors from attendly-core. Consumers never see raw
// reqwest failures; the `From<attendly_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.
//
// Propagation policy: `Config`, `InvalidSlot`, and `Disconnected` are
// rejected synchronously before any network call and never retried.
// Failures on user-initiated one-shots (enroll, delete, mode toggle,
// connection test) are surfaced to the caller with local state left
// unchanged. Failures on background tasks (tunnel probe, notification
// poll, enrollment reconciliation) are logged and swallowed; the task
// simply tries again on its next scheduled tick.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid fingerprint id {id}: must be between 1 and 127")]
    InvalidSlot { id: u8 },

    // ── State errors ─────────────────────────────────────────────────
    #[error("Not connected to the peripheral -- run a connection test first")]
    Disconnected,

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach peripheral at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Peripheral did not respond within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Peripheral rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<attendly_api::Error> for CoreError {
    fn from(err: attendly_api::Error) -> Self {
        match err {
            // Timeouts are classified by the api crate (with the
            // configured budget attached); what remains here is either
            // a rejected response or a network-level failure.
            attendly_api::Error::Transport(ref e) => {
                if let Some(status) = e.status() {
                    CoreError::Api {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            attendly_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            attendly_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            attendly_api::Error::Api { status, message } => CoreError::Api { status, message },
            attendly_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
