use thiserror::Error;

/// Result type for webOS TV operations
pub type Result<T> = std::result::Result<T, WebOsError>;

/// Errors that can occur when interacting with a webOS TV
#[derive(Error, Debug)]
pub enum WebOsError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation attempted on a connection that is not open
    #[error("Not connected")]
    NotConnected,

    /// Operation attempted before pairing completed
    #[error("Not registered with the TV")]
    NotRegistered,

    /// Connection was closed unexpectedly
    #[error("Connection closed")]
    ConnectionClosed,

    /// Request timed out waiting for a response
    #[error("Request timeout")]
    Timeout,

    /// A command argument was rejected before being sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The TV reported a command failure
    #[error("Command failed: {message}")]
    CommandFailed {
        /// Numeric error code from the TV, when present
        code: Option<i64>,
        /// Error text from the TV
        message: String,
    },

    /// The response payload did not have the expected shape
    #[error("Response validation failed: {0}")]
    ValidationFailed(String),

    /// Pairing was rejected by the TV or the user
    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    /// A subscription for this command is already active
    #[error("Already subscribed: {0}")]
    AlreadySubscribed(String),

    /// No active subscription for this command
    #[error("Not subscribed: {0}")]
    NotSubscribed(String),

    /// The command does not support subscriptions
    #[error("Not subscribable: {0}")]
    NotSubscribable(String),

    /// The pinned certificate does not match the live peer
    #[error("Certificate mismatch")]
    CertificateMismatch,

    /// A certificate could not be parsed or encoded
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Invalid or unexpected response from the TV
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
