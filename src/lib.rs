//! Rust library for controlling LG webOS televisions
//!
//! This library provides an async API for discovering and controlling LG
//! webOS TVs over their SSAP WebSocket protocol. It supports:
//!
//! - SSDP discovery of TVs on the local network
//! - Pairing with the TV (one-time on-screen prompt, reusable client key)
//! - Media, system, application, channel, and input-source control
//! - Live subscriptions to volume, mute, channel, and power changes
//! - TLS connections with certificate pinning for self-signed TV certs
//! - The secondary low-latency pointer/button socket
//!
//! # Quick Start
//!
//! ```no_run
//! use webostv::{ClientConfig, WebOsTv};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tv = WebOsTv::connect(ClientConfig::new("192.168.1.50")).await?;
//!
//!     // First contact: the TV shows a prompt the user must accept.
//!     // Persist the returned key to skip the prompt on later runs.
//!     let client_key = tv.pair().await?;
//!     println!("Client key: {}", client_key);
//!
//!     tv.media().set_volume(15).await?;
//!     tv.system().notify("Paired!").await?;
//!
//!     // Watch volume changes until we are done
//!     tv.media()
//!         .subscribe_get_volume(|event| async move {
//!             if let Ok(value) = event {
//!                 println!("Volume changed: {:?}", value);
//!             }
//!         })
//!         .await?;
//!
//!     tv.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Discovery
//!
//! ```no_run
//! use webostv::{discover, WebOsTv, DEFAULT_DISCOVERY_WINDOW};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     for found in discover(DEFAULT_DISCOVERY_WINDOW).await? {
//!         println!("TV at {}", found.host);
//!         let tv = WebOsTv::connect(found.config()).await?;
//!         let key = tv.pair().await?;
//!         println!("Paired, key: {}", key);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Discovery**: SSDP M-SEARCH for TVs on the LAN
//! - **Client**: connection ownership and pre-built control objects
//! - **Controls**: typed command surface derived from a declarative registry
//! - **Connection**: WebSocket multiplexing, pairing, subscriptions
//! - **Protocol**: SSAP envelope structures and the pairing manifest
//! - **TLS**: certificate extraction and pinning for `wss://`

mod client;
mod command;
mod config;
mod connection;
mod controls;
mod discovery;
mod error;
mod model;
mod pointer;
mod protocol;
mod subscription;
mod tls;

// Public exports
pub use client::WebOsTv;
pub use command::CommandValue;
pub use config::{ClientConfig, DEFAULT_PORT, DEFAULT_SECURE_PORT};
pub use connection::{Connection, ConnectionState, Pairing, PairingStatus};
pub use controls::{
    ApplicationControl, InputControl, MediaControl, SourceControl, SystemControl, TvControl,
};
pub use discovery::{discover, DiscoveredTv, DEFAULT_DISCOVERY_WINDOW};
pub use error::{Result, WebOsError};
pub use model::{Application, AudioOutputSource, InputSource};
pub use pointer::PointerSocket;
pub use tls::{extract_certificate, verify_certificate, TlsOptions};
