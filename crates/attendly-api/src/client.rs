// Peripheral HTTP client
//
// Wraps `reqwest::Client` with endpoint-relative URL construction and
// firmware-tolerant error extraction. The firmware is a tiny embedded
// HTTP server: success bodies are minimal JSON, failure bodies carry a
// human message under either an `error` or a `message` key depending
// on the handler.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{DeviceStatus, FingerprintsResponse, NotificationPoll};

/// Raw HTTP client for the attendance peripheral.
///
/// One instance per endpoint; the session layer rebuilds it whenever
/// the endpoint changes. All methods are thin request/response
/// wrappers -- state machines and reconciliation live in
/// `attendly-core`.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl DeviceClient {
    /// Create a new client for the peripheral at `base_url`.
    ///
    /// `base_url` is scheme + host[:port] with no path, e.g.
    /// `http://192.168.43.201` or `https://abc123.ngrok.io`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// The peripheral base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Reachability probe. Any 2xx means the peripheral is up; the
    /// diagnostic body is returned for display but never required.
    pub async fn status(&self) -> Result<DeviceStatus, Error> {
        self.get("status").await
    }

    /// Full registry snapshot from `GET /fingerprints`.
    pub async fn list_fingerprints(&self) -> Result<FingerprintsResponse, Error> {
        self.get("fingerprints").await
    }

    /// Begin an asynchronous fingerprint capture for `id`.
    ///
    /// A 2xx only means the peripheral accepted the request and is
    /// waiting for a finger on the sensor -- completion happens
    /// out-of-band and cannot be awaited.
    pub async fn enroll(&self, id: u8) -> Result<(), Error> {
        self.post_ack("enroll", &serde_json::json!({ "id": id }))
            .await
    }

    /// Delete the fingerprint stored in slot `id` (synchronous on the
    /// peripheral).
    pub async fn delete(&self, id: u8) -> Result<(), Error> {
        self.post_ack("delete", &serde_json::json!({ "id": id }))
            .await
    }

    /// Toggle attendance-scanning mode.
    pub async fn set_mode(&self, active: bool) -> Result<(), Error> {
        self.post_ack("attendance", &serde_json::json!({ "mode": active }))
            .await
    }

    /// Poll for at most one pending live event plus the recent log.
    pub async fn poll_notifications(&self) -> Result<NotificationPoll, Error> {
        self.get("live-notifications").await
    }

    /// Acknowledge the current live event so the peripheral stops
    /// redelivering it.
    pub async fn clear_notification(&self) -> Result<(), Error> {
        self.post_ack("clear-notification", &serde_json::json!({}))
            .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a GET request and deserialize the body.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.endpoint_url(path)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        parse_body(resp).await
    }

    /// Send a POST request with a JSON body, expecting an ack-only
    /// response (body ignored beyond status checking).
    async fn post_ack(&self, path: &str, body: &serde_json::Value) -> Result<(), Error> {
        let url = self.endpoint_url(path)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        Err(api_error(status.as_u16(), &read_text(resp).await?))
    }

    /// Classify a send failure, attaching the configured per-request
    /// timeout so the message can say how long the peripheral was
    /// given to answer.
    fn request_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(e)
        }
    }
}

/// Check the status and deserialize a 2xx body, or extract the
/// firmware's failure message from a non-2xx body.
async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = read_text(resp).await?;

    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

async fn read_text(resp: reqwest::Response) -> Result<String, Error> {
    resp.text().await.map_err(Error::Transport)
}

/// Firmware failure bodies are `{"error": ...}` in current builds and
/// `{"message": ...}` in older ones; fall back to the raw body.
fn api_error(status: u16, body: &str) -> Error {
    #[derive(Deserialize)]
    struct FailureBody {
        error: Option<String>,
        message: Option<String>,
    }

    let message = serde_json::from_str::<FailureBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_owned()
            }
        });

    Error::Api { status, message }
}
