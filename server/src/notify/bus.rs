//! Realtime event bus
//!
//! ```text
//! OrderService ──▶ publish() ──▶ broadcast::Sender ──┬──▶ ws client (store)
//!                                                    ├──▶ ws client (runner)
//!                                                    └──▶ ws client (...)
//! ```
//!
//! Subscribers that fall behind lose messages (broadcast lag) rather than
//! applying backpressure to order processing. Connected clients are
//! tracked in a DashMap keyed by connection id so handlers can report who
//! is online.

use dashmap::DashMap;
use shared::message::BusMessage;
use std::sync::Arc;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// Metadata about one connected websocket client
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    pub connection_id: String,
    /// Principal id (store or runner id) the connection authenticated as
    pub principal_id: String,
    pub role: String,
    pub connected_at: chrono::DateTime<chrono::Utc>,
}

/// Broadcast bus for realtime order events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusMessage>,
    clients: Arc<DashMap<String, ConnectedClient>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Publish an event to all connected subscribers. Returns the number
    /// of receivers; zero receivers is not an error.
    pub fn publish(&self, message: BusMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    pub fn register(&self, client: ConnectedClient) {
        self.clients.insert(client.connection_id.clone(), client);
    }

    pub fn unregister(&self, connection_id: &str) {
        self.clients.remove(connection_id);
    }

    pub fn connected_clients(&self) -> Vec<ConnectedClient> {
        self.clients.iter().map(|e| e.value().clone()).collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let sent = bus.publish(BusMessage {
            event: EventKind::OrderCreated,
            message: "New order".into(),
            order_id: Some("o1".into()),
            payload: None,
        });
        assert_eq!(sent, 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.order_id.as_deref(), Some("o1"));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        let sent = bus.publish(BusMessage {
            event: EventKind::OrderCancelled,
            message: "Cancelled".into(),
            order_id: Some("o1".into()),
            payload: None,
        });
        assert_eq!(sent, 0);
    }

    #[test]
    fn test_client_registry() {
        let bus = EventBus::new();
        bus.register(ConnectedClient {
            connection_id: "c1".into(),
            principal_id: "runner-1".into(),
            role: "runner".into(),
            connected_at: chrono::Utc::now(),
        });
        assert_eq!(bus.connected_clients().len(), 1);
        bus.unregister("c1");
        assert!(bus.connected_clients().is_empty());
    }
}
