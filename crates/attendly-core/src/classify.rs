// ── Transport classification ──
//
// Pure endpoint inspection, no I/O. The result is advisory: it drives
// UI hints like "open in browser", never the correctness of requests.

/// How the configured endpoint reaches the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Bare IP or hostname on the local network, plain HTTP.
    Local,
    /// Public forwarding endpoint (encrypting scheme or a known
    /// tunnel provider).
    Tunneled,
}

/// Hostname fragments of known tunnel providers.
const TUNNEL_MARKERS: &[&str] = &["ngrok", "cloudflare", "tunnel", "lhr.life"];

/// Classify an endpoint address as local or tunneled.
///
/// An endpoint is tunneled if it uses an encrypting scheme or matches
/// a known tunnel-provider fragment; everything else is local.
pub fn classify(endpoint: &str) -> Transport {
    if endpoint.starts_with("https://") || TUNNEL_MARKERS.iter().any(|m| endpoint.contains(m)) {
        Transport::Tunneled
    } else {
        Transport::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lan_addresses_are_local() {
        assert_eq!(classify("http://192.168.43.201"), Transport::Local);
        assert_eq!(classify("http://192.168.1.50:8080"), Transport::Local);
        assert_eq!(classify("http://esp8266.lan"), Transport::Local);
    }

    #[test]
    fn encrypting_scheme_is_tunneled() {
        assert_eq!(classify("https://device.example.com"), Transport::Tunneled);
    }

    #[test]
    fn known_providers_are_tunneled() {
        assert_eq!(classify("http://abc123.ngrok.io"), Transport::Tunneled);
        assert_eq!(
            classify("http://reader.trycloudflare.com"),
            Transport::Tunneled
        );
        assert_eq!(classify("http://foo.tunnel.example"), Transport::Tunneled);
        assert_eq!(classify("http://xyz.lhr.life"), Transport::Tunneled);
    }
}
