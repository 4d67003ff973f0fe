use crate::config::{ClientConfig, DEFAULT_SECURE_PORT};
use crate::error::Result;
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const SSDP_ADDR: &str = "239.255.255.250:1900";
const SSDP_MX: u8 = 3;
const ST_WEBOS: &str = "urn:lge-com:service:webos-second-screen:1";
const ST_FALLBACK: &str = "urn:schemas-upnp-org:device:MediaRenderer:1";

/// Default window for collecting SSDP responses
pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_secs(3);

/// A TV found on the local network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTv {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl DiscoveredTv {
    /// Connection configuration for this TV
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.host)
            .secure(self.secure)
            .port(self.port)
    }
}

/// Discover webOS TVs via SSDP M-SEARCH
///
/// Broadcasts to the SSDP multicast group with the webOS second-screen
/// search target (plus a MediaRenderer fallback for older firmware) and
/// collects unicast responses for `window`. Responses are deduplicated by
/// host. Runs entirely in user space; no privileged sockets.
///
/// # Example
///
/// ```no_run
/// use webostv::{discover, DEFAULT_DISCOVERY_WINDOW};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     for tv in discover(DEFAULT_DISCOVERY_WINDOW).await? {
///         println!("Found TV at {}", tv.host);
///     }
///     Ok(())
/// }
/// ```
pub async fn discover(window: Duration) -> Result<Vec<DiscoveredTv>> {
    let socket = create_ssdp_socket()?;

    for st in [ST_WEBOS, ST_FALLBACK] {
        let msearch = format!(
            "M-SEARCH * HTTP/1.1\r\n\
             HOST: {}\r\n\
             MAN: \"ssdp:discover\"\r\n\
             MX: {}\r\n\
             ST: {}\r\n\
             \r\n",
            SSDP_ADDR, SSDP_MX, st
        );
        socket.send_to(msearch.as_bytes(), SSDP_ADDR).await?;
        tracing::debug!("Sent M-SEARCH for {}", st);
    }

    let mut found = Vec::new();
    let mut seen = HashSet::new();
    let deadline = tokio::time::Instant::now() + window;
    let mut buf = [0u8; 2048];

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, addr))) => {
                let response = String::from_utf8_lossy(&buf[..len]);
                tracing::debug!("SSDP response from {} ({} bytes)", addr, len);
                if let Some(host) = parse_ssdp_host(&response) {
                    if seen.insert(host.clone()) {
                        tracing::info!("Discovered TV at {}", host);
                        found.push(DiscoveredTv {
                            host,
                            port: DEFAULT_SECURE_PORT,
                            secure: true,
                        });
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("Socket error during discovery: {}", e);
                break;
            }
            Err(_) => break,
        }
    }

    tracing::info!("Discovery complete, found {} TV(s)", found.len());
    Ok(found)
}

fn create_ssdp_socket() -> Result<UdpSocket> {
    let socket = socket2::Socket::new(
        socket2::Domain::IPV4,
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )?;
    socket.set_reuse_address(true)?;

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&addr.into())?;
    socket.set_multicast_ttl_v4(2)?;
    socket.set_nonblocking(true)?;

    Ok(UdpSocket::from_std(socket.into())?)
}

/// Pull the host out of an SSDP response's LOCATION header
fn parse_ssdp_host(response: &str) -> Option<String> {
    let location = response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("location") {
            Some(value.trim())
        } else {
            None
        }
    })?;
    host_from_url(location)
}

fn host_from_url(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = rest.split(['/', '?']).next()?;
    let host = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    let host = host.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}
