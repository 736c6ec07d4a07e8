//! Chat server endpoint configuration.

/// Where the session connection dials.
///
/// The scheme is fixed to plaintext `ws://`; the protocol has no
/// built-in upgrade to an encrypted variant.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// WebSocket endpoint path.
    pub path: String,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            path: "/ws".to_string(),
        }
    }
}

impl Endpoint {
    /// Create an endpoint with the default path.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// The full WebSocket URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_default() {
        let endpoint = Endpoint::default();
        assert_eq!(endpoint.url(), "ws://127.0.0.1:8080/ws");
    }

    #[test]
    fn test_endpoint_url() {
        let endpoint = Endpoint::new("chat.example.com", 9001);
        assert_eq!(endpoint.url(), "ws://chat.example.com:9001/ws");
    }
}
