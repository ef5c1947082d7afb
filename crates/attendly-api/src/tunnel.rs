// Tunnel agent client
//
// Talks to the management API of a locally running tunnel agent
// (ngrok-compatible: `GET /api/tunnels`). In the common case no agent
// is running at all, so connection failures here are an expected
// outcome, not an error the caller should surface.

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{TunnelDescriptor, TunnelList};

/// Default management address of a locally running tunnel agent.
pub const DEFAULT_AGENT_URL: &str = "http://127.0.0.1:4040";

/// Client for the local tunnel agent's management API.
pub struct TunnelAgentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TunnelAgentClient {
    /// Create a client for the agent at `base_url`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// List all active tunnels.
    pub async fn list_tunnels(&self) -> Result<Vec<TunnelDescriptor>, Error> {
        let url = self.base_url.join("api/tunnels")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let list: TunnelList =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;

        Ok(list.tunnels)
    }

    /// The tunnel to advertise: the HTTPS one if present, else the
    /// first, else `None` when no tunnels are active.
    pub async fn active_tunnel(&self) -> Result<Option<TunnelDescriptor>, Error> {
        let tunnels = self.list_tunnels().await?;
        Ok(select_tunnel(tunnels))
    }
}

/// Prefer the encrypting tunnel when the agent exposes both an http
/// and an https forwarder for the same upstream.
fn select_tunnel(tunnels: Vec<TunnelDescriptor>) -> Option<TunnelDescriptor> {
    if let Some(https) = tunnels.iter().find(|t| t.proto == "https") {
        return Some(https.clone());
    }
    tunnels.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tunnel(proto: &str, url: &str) -> TunnelDescriptor {
        TunnelDescriptor {
            public_url: url.to_owned(),
            proto: proto.to_owned(),
        }
    }

    #[test]
    fn prefers_https_tunnel() {
        let picked = select_tunnel(vec![
            tunnel("http", "http://a.ngrok.io"),
            tunnel("https", "https://a.ngrok.io"),
        ]);
        assert_eq!(picked, Some(tunnel("https", "https://a.ngrok.io")));
    }

    #[test]
    fn falls_back_to_first_tunnel() {
        let picked = select_tunnel(vec![
            tunnel("tcp", "tcp://a.ngrok.io:4040"),
            tunnel("http", "http://a.ngrok.io"),
        ]);
        assert_eq!(picked, Some(tunnel("tcp", "tcp://a.ngrok.io:4040")));
    }

    #[test]
    fn empty_list_yields_none() {
        assert_eq!(select_tunnel(Vec::new()), None);
    }
}
