use crate::error::{Result, WebOsError};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::net::TcpStream;

const BEGIN_CERT: &str = "-----BEGIN CERTIFICATE-----";
const END_CERT: &str = "-----END CERTIFICATE-----";

/// TLS options for reaching a TV over `wss://`
///
/// webOS TVs present self-signed certificates, so the usual choices are a
/// certificate pinned via [`extract_certificate`], or an explicit opt-out of
/// verification for lab use. Precedence when building the connector:
/// explicit connector, then pinned certificate file, then system trust.
#[derive(Clone)]
pub struct TlsOptions {
    connector: Option<native_tls::TlsConnector>,
    cert_file: Option<PathBuf>,
    verify: bool,
}

impl TlsOptions {
    pub fn new() -> Self {
        Self {
            connector: None,
            cert_file: None,
            verify: true,
        }
    }

    /// Use a fully custom TLS connector; overrides everything else
    pub fn with_connector(mut self, connector: native_tls::TlsConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Pin the TV's certificate from a PEM file saved by
    /// [`extract_certificate`]
    pub fn with_cert_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_file = Some(path.into());
        self
    }

    /// Disable certificate and hostname verification entirely
    ///
    /// Only for explicit opt-in; anyone on the network can impersonate the
    /// TV under this setting.
    pub fn danger_accept_invalid(mut self) -> Self {
        self.verify = false;
        self
    }

    pub(crate) fn is_pinned(&self) -> bool {
        self.cert_file.is_some()
    }

    /// Build the connector according to the precedence rules
    pub(crate) fn build(&self) -> Result<native_tls::TlsConnector> {
        if let Some(connector) = &self.connector {
            return Ok(connector.clone());
        }

        let mut builder = native_tls::TlsConnector::builder();
        if let Some(path) = &self.cert_file {
            let pem = std::fs::read(path)?;
            let cert = native_tls::Certificate::from_pem(&pem)
                .map_err(|e| WebOsError::InvalidCertificate(e.to_string()))?;
            builder.add_root_certificate(cert);
            builder.disable_built_in_roots(true);
            // Self-signed TV certificates do not name the TV's address
            builder.danger_accept_invalid_hostnames(true);
        } else if !self.verify {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        Ok(builder.build()?)
    }
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TlsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsOptions")
            .field("connector", &self.connector.is_some())
            .field("cert_file", &self.cert_file)
            .field("verify", &self.verify)
            .finish()
    }
}

/// Fetch the TV's certificate in PEM form
///
/// Opens a non-verifying TLS session to `host:port`, retrieves the peer's
/// DER certificate, and returns it PEM-encoded, optionally persisting it to
/// `out_path` for later pinning.
pub async fn extract_certificate(
    host: &str,
    port: u16,
    out_path: Option<&Path>,
) -> Result<String> {
    let der = peer_certificate_der(host, port).await?;
    let pem = der_to_pem(&der);
    if let Some(path) = out_path {
        tokio::fs::write(path, &pem).await?;
        tracing::info!("Saved certificate for {}:{} to {}", host, port, path.display());
    }
    Ok(pem)
}

/// Compare a stored PEM certificate against the live peer
///
/// The stored PEM is reparsed to its DER bytes first, so whitespace and
/// line-wrapping differences do not matter; the comparison itself is
/// byte-for-byte. A stored file that no longer parses compares unequal.
pub async fn verify_certificate(path: &Path, host: &str, port: u16) -> Result<bool> {
    let stored = tokio::fs::read_to_string(path).await?;
    let stored_der = match pem_to_der(&stored) {
        Ok(der) => der,
        Err(_) => return Ok(false),
    };
    let live_der = peer_certificate_der(host, port).await?;
    Ok(stored_der == live_der)
}

async fn peer_certificate_der(host: &str, port: u16) -> Result<Vec<u8>> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;
    let connector = tokio_native_tls::TlsConnector::from(connector);

    let stream = TcpStream::connect((host, port)).await?;
    let tls = connector.connect(host, stream).await?;
    let cert = tls
        .get_ref()
        .peer_certificate()?
        .ok_or_else(|| WebOsError::InvalidCertificate("peer presented no certificate".to_string()))?;
    Ok(cert.to_der()?)
}

fn der_to_pem(der: &[u8]) -> String {
    let encoded = BASE64.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / 64 + 64);
    pem.push_str(BEGIN_CERT);
    pem.push('\n');
    let mut rest = encoded.as_str();
    while !rest.is_empty() {
        let (line, tail) = rest.split_at(rest.len().min(64));
        pem.push_str(line);
        pem.push('\n');
        rest = tail;
    }
    pem.push_str(END_CERT);
    pem.push('\n');
    pem
}

fn pem_to_der(pem: &str) -> Result<Vec<u8>> {
    let start = pem
        .find(BEGIN_CERT)
        .ok_or_else(|| WebOsError::InvalidCertificate("missing BEGIN marker".to_string()))?
        + BEGIN_CERT.len();
    let stop = pem[start..]
        .find(END_CERT)
        .map(|offset| start + offset)
        .ok_or_else(|| WebOsError::InvalidCertificate("missing END marker".to_string()))?;

    let body: String = pem[start..stop].chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(body.as_bytes())
        .map_err(|e| WebOsError::InvalidCertificate(e.to_string()))
}
