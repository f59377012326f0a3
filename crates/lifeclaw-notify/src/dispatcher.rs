//! Notification dispatcher — the only component that touches both the
//! subscription store and the push transport.

use std::sync::Arc;

use lifeclaw_core::error::{PushError, Result};
use lifeclaw_core::traits::{PushTransport, SubscriptionStore};
use lifeclaw_core::types::PushMessage;

/// What happened to one delivery attempt. Transient failures still count as
/// handled — the next sweep retries whatever condition still holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    /// Owner has no subscription — not an error.
    NoSubscription,
    /// Destination permanently invalid; subscription purged.
    Purged,
    /// Transient failure, logged and dropped.
    Dropped,
}

pub struct Dispatcher {
    subscriptions: Arc<dyn SubscriptionStore>,
    transport: Arc<dyn PushTransport>,
}

impl Dispatcher {
    pub fn new(subscriptions: Arc<dyn SubscriptionStore>, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            subscriptions,
            transport,
        }
    }

    /// Register an owner's push destination. One per owner — newest wins.
    pub async fn subscribe(&self, owner_id: &str, destination: &serde_json::Value) -> Result<()> {
        self.subscriptions
            .upsert_subscription(owner_id, destination)
            .await?;
        tracing::info!("📬 Push subscription registered for {owner_id}");
        Ok(())
    }

    pub async fn unsubscribe(&self, owner_id: &str) -> Result<()> {
        self.subscriptions.delete_subscription(owner_id).await
    }

    /// Deliver one message to one owner.
    pub async fn deliver(&self, owner_id: &str, message: &PushMessage) -> Result<DeliveryStatus> {
        let Some(subscription) = self.subscriptions.get_subscription(owner_id).await? else {
            tracing::debug!("No push subscription for {owner_id} — skipping");
            return Ok(DeliveryStatus::NoSubscription);
        };

        match self
            .transport
            .send(&subscription.destination, message)
            .await
        {
            Ok(()) => {
                tracing::info!("📣 Push sent to {owner_id}: {}", message.title);
                Ok(DeliveryStatus::Delivered)
            }
            Err(PushError::Gone) => {
                // Self-heal: purge so future sweeps stop attempting delivery
                self.subscriptions.delete_subscription(owner_id).await?;
                tracing::info!("🧹 Purged dead push subscription for {owner_id}");
                Ok(DeliveryStatus::Purged)
            }
            Err(PushError::Transient(reason)) => {
                tracing::warn!("⚠️ Push to {owner_id} failed (will retry next sweep): {reason}");
                Ok(DeliveryStatus::Dropped)
            }
        }
    }

    /// Deliver to many owners; one owner's failure never blocks the rest.
    pub async fn broadcast(&self, owner_ids: &[String], message: &PushMessage) -> usize {
        let mut delivered = 0;
        for owner_id in owner_ids {
            match self.deliver(owner_id, message).await {
                Ok(DeliveryStatus::Delivered) => delivered += 1,
                Ok(_) => {}
                Err(e) => tracing::warn!("⚠️ Broadcast to {owner_id} failed: {e}"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lifeclaw_store::SqliteStore;
    use std::sync::Mutex;

    /// Transport double: scripted outcomes, records every send.
    struct ScriptedTransport {
        outcome: fn() -> std::result::Result<(), PushError>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(outcome: fn() -> std::result::Result<(), PushError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PushTransport for ScriptedTransport {
        async fn send(
            &self,
            _destination: &serde_json::Value,
            message: &PushMessage,
        ) -> std::result::Result<(), PushError> {
            self.sent.lock().unwrap().push(message.title.clone());
            (self.outcome)()
        }
    }

    fn message() -> PushMessage {
        PushMessage {
            title: "Urgent: Overdue Obligation".into(),
            body: "Renew Passport is 2 days overdue".into(),
            data: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_no_subscription_is_noop() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let transport = ScriptedTransport::new(|| Ok(()));
        let dispatcher = Dispatcher::new(store, transport.clone());

        let status = dispatcher.deliver("u1", &message()).await.unwrap();
        assert_eq!(status, DeliveryStatus::NoSubscription);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_success() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let transport = ScriptedTransport::new(|| Ok(()));
        let dispatcher = Dispatcher::new(store.clone(), transport.clone());

        dispatcher
            .subscribe("u1", &serde_json::json!({"endpoint": "https://push.example"}))
            .await
            .unwrap();
        let status = dispatcher.deliver("u1", &message()).await.unwrap();
        assert_eq!(status, DeliveryStatus::Delivered);
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_purges_subscription() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let transport = ScriptedTransport::new(|| Err(PushError::Gone));
        let dispatcher = Dispatcher::new(store.clone(), transport.clone());

        dispatcher
            .subscribe("u1", &serde_json::json!({"endpoint": "https://push.example"}))
            .await
            .unwrap();

        let status = dispatcher.deliver("u1", &message()).await.unwrap();
        assert_eq!(status, DeliveryStatus::Purged);

        // Next attempt finds no subscription — a no-op, not an error
        let status = dispatcher.deliver("u1", &message()).await.unwrap();
        assert_eq!(status, DeliveryStatus::NoSubscription);
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_subscription() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let transport =
            ScriptedTransport::new(|| Err(PushError::Transient("endpoint 503".into())));
        let dispatcher = Dispatcher::new(store.clone(), transport.clone());

        dispatcher
            .subscribe("u1", &serde_json::json!({"endpoint": "https://push.example"}))
            .await
            .unwrap();

        let status = dispatcher.deliver("u1", &message()).await.unwrap();
        assert_eq!(status, DeliveryStatus::Dropped);

        // Subscription survives for the next sweep to retry
        let status = dispatcher.deliver("u1", &message()).await.unwrap();
        assert_eq!(status, DeliveryStatus::Dropped);
        assert_eq!(transport.sent.lock().unwrap().len(), 2);
    }
}
