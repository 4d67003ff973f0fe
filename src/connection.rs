use crate::config::ClientConfig;
use crate::error::{Result, WebOsError};
use crate::protocol::{registration_payload, Envelope, MessageKind};
use crate::subscription::SubscriptionEntry;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, tungstenite::Message, Connector,
};

const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Lifecycle of a connection
///
/// `Open` means the socket is up but the TV has not accepted a pairing yet;
/// only register traffic is allowed until `Registered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Prompted,
    Registered,
    Closing,
    Closed,
}

/// Status values yielded while pairing with the TV
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingStatus {
    /// The TV is showing the on-screen prompt; waiting for the user
    Prompted,
    /// Pairing accepted; the key is valid for future connections
    Registered { client_key: String },
}

/// A pending slot waiting for inbound frames with a given id
///
/// General requests are strictly single-shot. Registration is the one
/// exchange where the TV reuses an id across two replies, so its slot stays
/// parked until the pairing finishes.
enum PendingSlot {
    Single(oneshot::Sender<Envelope>),
    Registration(mpsc::UnboundedSender<Envelope>),
}

struct Inner {
    /// Pending requests and the in-flight registration, keyed by envelope id
    pending: HashMap<String, PendingSlot>,
    /// Live subscriptions keyed by their UUID
    subscriptions: HashMap<String, SubscriptionEntry>,
    /// Queue feeding the writer task; `None` once the connection is down
    ws_tx: Option<mpsc::UnboundedSender<Message>>,
    next_request_id: u64,
    state: ConnectionState,
}

impl Inner {
    fn allocate_id(&mut self) -> String {
        self.next_request_id += 1;
        self.next_request_id.to_string()
    }

    fn queue_frame(&self, envelope: &Envelope) -> Result<()> {
        let tx = self.ws_tx.as_ref().ok_or(WebOsError::ConnectionClosed)?;
        let json = serde_json::to_string(envelope)?;
        tracing::debug!("Sending: {}", json);
        tx.send(Message::Text(json))
            .map_err(|_| WebOsError::ConnectionClosed)
    }

    fn ensure_registered(&self) -> Result<()> {
        match self.state {
            ConnectionState::Registered => Ok(()),
            ConnectionState::Closing | ConnectionState::Closed => Err(WebOsError::NotConnected),
            _ => Err(WebOsError::NotRegistered),
        }
    }
}

/// Low-level connection to a webOS TV
///
/// Owns the WebSocket, multiplexes requests and subscriptions over it, and
/// runs the pairing handshake. One reader task consumes the socket; writes
/// go through a FIFO queue so frames never interleave.
pub struct Connection {
    inner: Arc<Mutex<Inner>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    request_timeout: Duration,
    tls: Option<native_tls::TlsConnector>,
}

impl Connection {
    /// Open the WebSocket described by `config`
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let url = config.url();
        tracing::info!("Connecting to {}", url);

        let tls = if config.secure {
            Some(config.tls.build()?)
        } else {
            None
        };

        let connect_result = match tls.clone() {
            Some(connector) => {
                connect_async_tls_with_config(
                    url.as_str(),
                    None,
                    false,
                    Some(Connector::NativeTls(connector)),
                )
                .await
            }
            None => connect_async(url.as_str()).await,
        };

        let (ws_stream, _) = connect_result.map_err(|err| {
            if config.tls.is_pinned()
                && matches!(err, tokio_tungstenite::tungstenite::Error::Tls(_))
            {
                WebOsError::CertificateMismatch
            } else {
                err.into()
            }
        })?;
        let (mut write, mut read) = ws_stream.split();

        let (ws_tx, mut ws_rx) = mpsc::unbounded_channel::<Message>();
        let inner = Arc::new(Mutex::new(Inner {
            pending: HashMap::new(),
            subscriptions: HashMap::new(),
            ws_tx: Some(ws_tx),
            next_request_id: 0,
            state: ConnectionState::Open,
        }));

        // Writer task: drains the queue in FIFO order
        tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        // Reader task: the only consumer of the socket
        let inner_clone = inner.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        Self::route_frame(&inner_clone, &text).await;
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("WebSocket connection closed by TV");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            Self::teardown(&inner_clone).await;
        });

        Ok(Self {
            inner,
            reader: Mutex::new(Some(reader)),
            request_timeout: config.request_timeout,
            tls,
        })
    }

    /// Current lifecycle state
    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    /// TLS connector in use, if any; the pointer socket reuses it
    pub(crate) fn tls_connector(&self) -> Option<native_tls::TlsConnector> {
        self.tls.clone()
    }

    /// Route one inbound frame to a pending request, the in-flight
    /// registration, or a live subscription; unmatched frames are dropped
    async fn route_frame(inner: &Arc<Mutex<Inner>>, text: &str) {
        tracing::debug!("Received: {}", text);

        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Received invalid JSON: {}", e);
                return;
            }
        };
        let Some(id) = envelope.id.clone() else {
            tracing::debug!("Dropping frame without id");
            return;
        };

        // Look up the route under the lock, deliver outside it so a slow
        // subscription callback never blocks senders.
        let routed = {
            let mut inner = inner.lock().await;
            match inner.pending.remove(&id) {
                Some(PendingSlot::Single(tx)) => {
                    if tx.send(envelope).is_err() {
                        tracing::debug!("Response for {} arrived after caller went away", id);
                    }
                    None
                }
                Some(PendingSlot::Registration(tx)) => {
                    // Re-park: registration is the one exchange that gets a
                    // second reply on the same id
                    if tx.send(envelope).is_ok() {
                        inner
                            .pending
                            .insert(id.clone(), PendingSlot::Registration(tx));
                    }
                    None
                }
                None => match inner.subscriptions.get(&id) {
                    Some(entry) => Some((entry.clone(), envelope)),
                    None => {
                        tracing::debug!("Dropping frame with unmatched id {}", id);
                        None
                    }
                },
            }
        };

        if let Some((entry, envelope)) = routed {
            if envelope.kind == MessageKind::Error {
                (entry.handler)(Err(WebOsError::CommandFailed {
                    code: None,
                    message: envelope.error_message(),
                }))
                .await;
            } else {
                entry.deliver(envelope.payload.unwrap_or(Value::Null)).await;
            }
        }
    }

    /// Fail everything outstanding exactly once and mark the connection closed
    async fn teardown(inner: &Arc<Mutex<Inner>>) {
        let subscriptions = {
            let mut inner = inner.lock().await;
            if inner.state == ConnectionState::Closed {
                return;
            }
            inner.state = ConnectionState::Closed;
            inner.ws_tx = None;
            // Dropping the pending senders fails their awaiters
            inner.pending.clear();
            inner
                .subscriptions
                .drain()
                .map(|(_, entry)| entry)
                .collect::<Vec<_>>()
        };
        for entry in subscriptions {
            entry.deliver_closed().await;
        }
    }

    /// Send a request and wait for the response payload
    ///
    /// Allocating the id, parking the waiter, and queueing the frame happen
    /// under one lock, so the reader cannot observe a response for an id it
    /// does not know about.
    pub async fn send_request(&self, uri: &str, payload: Option<Value>) -> Result<Value> {
        let (id, rx) = {
            let mut inner = self.inner.lock().await;
            inner.ensure_registered()?;

            let id = inner.allocate_id();
            let (tx, rx) = oneshot::channel();
            inner.pending.insert(id.clone(), PendingSlot::Single(tx));

            let envelope = Envelope::outbound(id.clone(), MessageKind::Request, Some(uri), payload);
            if let Err(e) = inner.queue_frame(&envelope) {
                inner.pending.remove(&id);
                return Err(e);
            }
            (id, rx)
        };

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(envelope)) => match envelope.kind {
                MessageKind::Error => Err(WebOsError::CommandFailed {
                    code: None,
                    message: envelope.error_message(),
                }),
                _ => Ok(envelope.payload.unwrap_or(Value::Null)),
            },
            Ok(Err(_)) => Err(WebOsError::ConnectionClosed),
            Err(_) => {
                let mut inner = self.inner.lock().await;
                inner.pending.remove(&id);
                Err(WebOsError::Timeout)
            }
        }
    }

    /// Register a subscription and send its `subscribe` frame
    ///
    /// `subscription_id` becomes the envelope id for the subscribe, every
    /// event, and the eventual unsubscribe; that is how the TV correlates
    /// them.
    pub(crate) async fn subscribe(
        &self,
        subscription_id: String,
        entry: SubscriptionEntry,
        payload: Value,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.ensure_registered()?;

        let envelope = Envelope::outbound(
            subscription_id.clone(),
            MessageKind::Subscribe,
            Some(entry.uri.as_str()),
            Some(payload),
        );
        inner.subscriptions.insert(subscription_id.clone(), entry);
        if let Err(e) = inner.queue_frame(&envelope) {
            inner.subscriptions.remove(&subscription_id);
            return Err(e);
        }
        Ok(())
    }

    /// Drop a subscription; the unsubscribe frame is fire-and-forget
    pub(crate) async fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .subscriptions
            .remove(subscription_id)
            .ok_or_else(|| WebOsError::NotSubscribed(subscription_id.to_string()))?;

        let envelope = Envelope::outbound(
            subscription_id.to_string(),
            MessageKind::Unsubscribe,
            Some(entry.uri.as_str()),
            Some(Value::Object(serde_json::Map::new())),
        );
        let _ = inner.queue_frame(&envelope);
        Ok(())
    }

    pub(crate) async fn has_subscription(&self, subscription_id: &str) -> bool {
        self.inner
            .lock()
            .await
            .subscriptions
            .contains_key(subscription_id)
    }

    /// Start the pairing handshake
    ///
    /// Returns a [`Pairing`] sequence the caller drives; nothing past the
    /// initial register frame happens until [`Pairing::next`] is awaited, so
    /// the caller can surface the on-screen prompt before the second stage
    /// resolves. A `client_key` from an earlier pairing lets the TV skip the
    /// prompt.
    pub async fn register(&self, client_key: Option<&str>) -> Result<Pairing> {
        let (id, rx) = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                ConnectionState::Open | ConnectionState::Registered => {}
                ConnectionState::Prompted => {
                    return Err(WebOsError::RegistrationFailed(
                        "pairing already in progress".to_string(),
                    ))
                }
                _ => return Err(WebOsError::NotConnected),
            }

            let id = inner.allocate_id();
            let (tx, rx) = mpsc::unbounded_channel();
            inner.pending.insert(id.clone(), PendingSlot::Registration(tx));

            let envelope = Envelope::outbound(
                id.clone(),
                MessageKind::Register,
                None,
                Some(registration_payload(client_key)),
            );
            if let Err(e) = inner.queue_frame(&envelope) {
                inner.pending.remove(&id);
                return Err(e);
            }
            (id, rx)
        };

        Ok(Pairing {
            id,
            rx,
            inner: self.inner.clone(),
            stage_timeout: self.request_timeout,
            done: false,
        })
    }

    /// Close the connection
    ///
    /// Idempotent; fails all outstanding requests with `ConnectionClosed`
    /// and notifies every live subscription exactly once.
    pub async fn close(&self) {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == ConnectionState::Closed {
                return;
            }
            inner.state = ConnectionState::Closing;
            if let Some(tx) = &inner.ws_tx {
                let _ = tx.send(Message::Close(None));
            }
        }

        if let Some(mut handle) = self.reader.lock().await.take() {
            if timeout(CLOSE_GRACE, &mut handle).await.is_err() {
                handle.abort();
            }
        }
        Self::teardown(&self.inner).await;
    }
}

/// The caller-driven pairing sequence
///
/// Yields [`PairingStatus::Prompted`] while the TV waits for the user, then
/// [`PairingStatus::Registered`] carrying the client key. A TV that
/// recognizes a stored key may go straight to `Registered`; both paths are
/// accepted. Any other reply ends the sequence with `RegistrationFailed`.
pub struct Pairing {
    id: String,
    rx: mpsc::UnboundedReceiver<Envelope>,
    inner: Arc<Mutex<Inner>>,
    stage_timeout: Duration,
    done: bool,
}

impl Pairing {
    /// Await the next pairing status; `None` once the sequence has ended
    pub async fn next(&mut self) -> Option<Result<PairingStatus>> {
        if self.done {
            return None;
        }

        let envelope = match timeout(self.stage_timeout, self.rx.recv()).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                self.done = true;
                return Some(Err(WebOsError::ConnectionClosed));
            }
            Err(_) => {
                self.done = true;
                self.inner.lock().await.pending.remove(&self.id);
                return Some(Err(WebOsError::Timeout));
            }
        };

        let pairing_type = envelope
            .payload
            .as_ref()
            .and_then(|p| p.get("pairingType"))
            .and_then(Value::as_str);

        match envelope.kind {
            MessageKind::Response if pairing_type == Some("PROMPT") => {
                let mut inner = self.inner.lock().await;
                if inner.state == ConnectionState::Open {
                    inner.state = ConnectionState::Prompted;
                }
                Some(Ok(PairingStatus::Prompted))
            }
            MessageKind::Registered => {
                self.done = true;
                let client_key = envelope
                    .payload
                    .as_ref()
                    .and_then(|p| p.get("client-key"))
                    .and_then(Value::as_str)
                    .map(str::to_string);

                let mut inner = self.inner.lock().await;
                inner.pending.remove(&self.id);
                match client_key {
                    Some(client_key) => {
                        if inner.state != ConnectionState::Closed {
                            inner.state = ConnectionState::Registered;
                        }
                        tracing::info!("Registered with the TV");
                        Some(Ok(PairingStatus::Registered { client_key }))
                    }
                    None => Some(Err(WebOsError::RegistrationFailed(
                        "registered response without client-key".to_string(),
                    ))),
                }
            }
            _ => {
                self.done = true;
                let mut inner = self.inner.lock().await;
                inner.pending.remove(&self.id);
                if inner.state == ConnectionState::Prompted {
                    inner.state = ConnectionState::Open;
                }
                let reason = match envelope.kind {
                    MessageKind::Error => envelope.error_message(),
                    other => format!("unexpected {:?} reply during pairing", other),
                };
                Some(Err(WebOsError::RegistrationFailed(reason)))
            }
        }
    }
}
