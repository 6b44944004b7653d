//! Change notifier
//!
//! A registry of live subscriber channels. The creation path publishes a
//! `paymentCreated` event after a successful insert; delivery is
//! best-effort and at-most-once, with no persistence or replay for
//! subscribers that were disconnected at broadcast time. The event is a
//! hint to refresh, not a state-carrying message.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::json;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::domain::Payment;

/// Shared fan-out hub. Cheap to clone; all clones share one registry.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    subscribers: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<Message>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber and hand back its id plus the receiving end
    /// of its channel.
    pub async fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers.write().await.insert(id, tx);
        tracing::debug!("subscriber {} connected", id);
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: &Uuid) {
        if self.subscribers.write().await.remove(id).is_some() {
            tracing::debug!("subscriber {} disconnected", id);
        }
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }

    /// Broadcast a `paymentCreated` event to every current subscriber.
    /// Closed channels are pruned; a failed send never surfaces to the
    /// caller that created the payment.
    pub async fn publish_payment_created(&self, payment: &Payment) {
        let payload = match serde_json::to_string(&json!({
            "event": "paymentCreated",
            "data": payment,
        })) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("failed to encode paymentCreated event: {}", e);
                return;
            }
        };

        let subscribers = self.subscribers.read().await;
        let mut dead = Vec::new();

        for (id, tx) in subscribers.iter() {
            if tx.send(Message::Text(payload.clone())).is_err() {
                dead.push(*id);
            }
        }

        let delivered = subscribers.len() - dead.len();
        drop(subscribers);

        tracing::debug!(
            "paymentCreated id={} delivered to {} subscriber(s)",
            payment.id,
            delivered
        );

        for id in dead {
            self.unsubscribe(&id).await;
        }
    }
}
