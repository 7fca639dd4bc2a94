use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use super::messages::WebSocketMessage;

/// Maps connection ids to outbound message channels. The socket task for
/// each connection drains its receiver; everything else just addresses
/// players by id.
pub struct ConnectionManager {
    senders: RwLock<HashMap<String, mpsc::UnboundedSender<String>>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a connection and returns the receiving half of its
    /// outbound channel.
    pub async fn register(&self, connection_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders
            .write()
            .await
            .insert(connection_id.to_string(), sender);
        debug!(connection_id = %connection_id, "Connection registered");
        receiver
    }

    pub async fn unregister(&self, connection_id: &str) {
        self.senders.write().await.remove(connection_id);
        debug!(connection_id = %connection_id, "Connection unregistered");
    }

    /// Sends a message to one connection. Messages to unknown or closed
    /// connections are dropped silently; the player is simply offline.
    pub async fn send_to(&self, connection_id: &str, message: &WebSocketMessage) {
        let senders = self.senders.read().await;
        match senders.get(connection_id) {
            Some(sender) => {
                if sender.send(message.to_json()).is_err() {
                    debug!(connection_id = %connection_id, "Outbound channel closed");
                }
            }
            None => {
                debug!(connection_id = %connection_id, "No connection for outbound message");
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websockets::messages::MessageType;

    #[tokio::test]
    async fn test_register_send_receive() {
        let manager = ConnectionManager::new();
        let mut receiver = manager.register("conn-1").await;

        let msg = WebSocketMessage::error("test");
        manager.send_to("conn-1", &msg).await;

        let received = receiver.recv().await.unwrap();
        let parsed: WebSocketMessage = serde_json::from_str(&received).unwrap();
        assert_eq!(parsed.message_type, MessageType::Error);
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_silent() {
        let manager = ConnectionManager::new();
        manager.send_to("nobody", &WebSocketMessage::error("x")).await;
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let manager = ConnectionManager::new();
        let mut receiver = manager.register("conn-1").await;
        manager.unregister("conn-1").await;

        manager.send_to("conn-1", &WebSocketMessage::error("x")).await;
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_reregister_replaces_channel() {
        let manager = ConnectionManager::new();
        let mut old_receiver = manager.register("conn-1").await;
        let mut new_receiver = manager.register("conn-1").await;

        manager.send_to("conn-1", &WebSocketMessage::error("x")).await;

        assert!(old_receiver.recv().await.is_none());
        assert!(new_receiver.recv().await.is_some());
    }
}
