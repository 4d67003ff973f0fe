use crate::config::ClientConfig;
use crate::connection::{Connection, Pairing, PairingStatus};
use crate::controls::{
    ApplicationControl, InputControl, MediaControl, SourceControl, SystemControl, TvControl,
};
use crate::error::{Result, WebOsError};
use std::sync::Arc;

/// High-level client for a webOS TV
///
/// Owns the connection plus one control object per SSAP service area. The
/// controls borrow the shared connection, so everything multiplexes over a
/// single WebSocket.
pub struct WebOsTv {
    config: ClientConfig,
    connection: Arc<Connection>,
    media: MediaControl,
    system: SystemControl,
    application: ApplicationControl,
    tv: TvControl,
    source: SourceControl,
    input: InputControl,
}

impl WebOsTv {
    /// Connect to the TV described by `config`
    ///
    /// The connection is open afterwards but commands stay gated until
    /// pairing completes; call [`WebOsTv::pair`] or drive
    /// [`WebOsTv::register`] yourself.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use webostv::{ClientConfig, WebOsTv};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let tv = WebOsTv::connect(ClientConfig::new("192.168.1.50")).await?;
    ///     let client_key = tv.pair().await?;
    ///     println!("Store this for next time: {}", client_key);
    ///
    ///     tv.media().set_volume(20).await?;
    ///     tv.system().notify("Hello from Rust").await?;
    ///     tv.close().await;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let connection = Arc::new(Connection::connect(&config).await?);

        Ok(Self {
            media: MediaControl::new(connection.clone()),
            system: SystemControl::new(connection.clone()),
            application: ApplicationControl::new(connection.clone()),
            tv: TvControl::new(connection.clone()),
            source: SourceControl::new(connection.clone()),
            input: InputControl::new(connection.clone()),
            connection,
            config,
        })
    }

    pub fn media(&self) -> &MediaControl {
        &self.media
    }

    pub fn system(&self) -> &SystemControl {
        &self.system
    }

    pub fn application(&self) -> &ApplicationControl {
        &self.application
    }

    pub fn tv(&self) -> &TvControl {
        &self.tv
    }

    pub fn source(&self) -> &SourceControl {
        &self.source
    }

    pub fn input(&self) -> &InputControl {
        &self.input
    }

    /// The underlying connection, for raw requests
    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Start pairing and hand the sequence to the caller
    ///
    /// Use this instead of [`WebOsTv::pair`] when you want to surface the
    /// on-screen prompt to a user before the second stage resolves.
    pub async fn register(&self) -> Result<Pairing> {
        self.connection
            .register(self.config.client_key.as_deref())
            .await
    }

    /// Drive pairing to completion and return the client key
    ///
    /// The key is stable for this manifest; persist it and put it into
    /// [`ClientConfig::client_key`] to skip the prompt next time.
    pub async fn pair(&self) -> Result<String> {
        let mut pairing = self.register().await?;
        while let Some(status) = pairing.next().await {
            match status? {
                PairingStatus::Prompted => {
                    tracing::info!("Please accept the pairing prompt on the TV");
                }
                PairingStatus::Registered { client_key } => return Ok(client_key),
            }
        }
        Err(WebOsError::RegistrationFailed(
            "pairing ended without a client key".to_string(),
        ))
    }

    /// Close the connection; idempotent
    pub async fn close(&self) {
        self.connection.close().await;
    }
}
