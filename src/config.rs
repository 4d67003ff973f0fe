use crate::tls::TlsOptions;
use std::time::Duration;

/// Default port for plaintext SSAP connections
pub const DEFAULT_PORT: u16 = 3000;

/// Default port for TLS SSAP connections
pub const DEFAULT_SECURE_PORT: u16 = 3001;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for connecting to a webOS TV
///
/// # Example
///
/// ```no_run
/// use webostv::ClientConfig;
///
/// let config = ClientConfig::new("192.168.1.50")
///     .secure(true)
///     .client_key("previously-issued-key");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname or IP address of the TV
    pub host: String,
    /// Port override; defaults to 3000 (plaintext) or 3001 (TLS)
    pub port: Option<u16>,
    /// Use a TLS WebSocket connection (`wss://`)
    pub secure: bool,
    /// Client key from a previous pairing, if any
    pub client_key: Option<String>,
    /// TLS options used when `secure` is set
    pub tls: TlsOptions,
    /// Deadline applied to each request
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a configuration for a plaintext connection to `host`
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            secure: false,
            client_key: None,
            tls: TlsOptions::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Toggle TLS (`wss://host:3001/`)
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Override the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Supply a client key issued by a previous pairing
    pub fn client_key(mut self, key: impl Into<String>) -> Self {
        self.client_key = Some(key.into());
        self
    }

    /// Supply TLS options (pinned certificate, custom connector, ...)
    pub fn tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    /// Override the per-request timeout (default 60s)
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Effective port after applying defaults
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.secure {
            DEFAULT_SECURE_PORT
        } else {
            DEFAULT_PORT
        })
    }

    /// WebSocket URL for this endpoint
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}/", scheme, self.host, self.effective_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_url_defaults_to_port_3000() {
        let config = ClientConfig::new("192.168.1.50");
        assert_eq!(config.url(), "ws://192.168.1.50:3000/");
    }

    #[test]
    fn secure_url_defaults_to_port_3001() {
        let config = ClientConfig::new("192.168.1.50").secure(true);
        assert_eq!(config.url(), "wss://192.168.1.50:3001/");
    }

    #[test]
    fn explicit_port_overrides_default() {
        let config = ClientConfig::new("localhost").port(8080);
        assert_eq!(config.url(), "ws://localhost:8080/");
    }
}
