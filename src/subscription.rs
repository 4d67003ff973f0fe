use crate::command::{CommandValue, Transform, Validator};
use crate::error::{Result, WebOsError};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Callback invoked for every event of one subscription
///
/// Receives the validated and transformed payload, or the error when
/// validation fails or the connection goes away. Callbacks are awaited
/// serially per subscription, in the order events arrive from the TV.
pub type SubscriptionHandler =
    Arc<dyn Fn(Result<CommandValue>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure into a [`SubscriptionHandler`]
pub fn handler<F, Fut>(callback: F) -> SubscriptionHandler
where
    F: Fn(Result<CommandValue>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| Box::pin(callback(event)))
}

/// One live subscription in the connection-global registry
///
/// Keyed by its UUID, which is also the envelope id of the subscribe frame,
/// of every inbound event, and of the eventual unsubscribe.
#[derive(Clone)]
pub(crate) struct SubscriptionEntry {
    pub uri: String,
    pub validate: Validator,
    pub transform: Option<Transform>,
    pub handler: SubscriptionHandler,
}

impl SubscriptionEntry {
    /// Run validator then transform, and hand the outcome to the callback
    pub(crate) async fn deliver(&self, payload: Value) {
        let outcome = match (self.validate)(&payload) {
            Ok(()) => match self.transform {
                Some(transform) => transform(payload),
                None => Ok(CommandValue::Payload(payload)),
            },
            Err(err) => Err(err),
        };
        (self.handler)(outcome).await;
    }

    /// Tell the callback the connection went away; fired exactly once
    pub(crate) async fn deliver_closed(&self) {
        (self.handler)(Err(WebOsError::ConnectionClosed)).await;
    }
}
