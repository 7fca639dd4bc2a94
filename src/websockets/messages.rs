use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    JoinRoom,
    StartGame,
    PlayCard,
    NextRound,
    Reconnect,

    // Server -> Client
    Joined,
    GameState,
    GameOver,
    PlayersRemoved,
    Error,
}

/// Metadata attached to server-originated messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Envelope for all WebSocket traffic in both directions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

impl WebSocketMessage {
    pub fn new<T: Serialize>(message_type: MessageType, payload: &T) -> Self {
        Self {
            message_type,
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    pub fn error(message: &str) -> Self {
        Self::new(
            MessageType::Error,
            &ErrorPayload {
                message: message.to_string(),
            },
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Client-to-Server payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    /// Present when joining an existing room; absent to create one
    pub room_code: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayCardPayload {
    pub card: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectPayload {
    pub room_code: String,
    pub previous_player_id: String,
}

/// Server-to-Client payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedPayload {
    pub room_code: String,
    pub player_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayersRemovedPayload {
    pub count: usize,
    pub player_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_wire_names() {
        let msg = WebSocketMessage::new(
            MessageType::PlayCard,
            &PlayCardPayload {
                card: "SK".to_string(),
            },
        );
        let json = msg.to_json();
        assert!(json.contains("\"type\":\"PLAY_CARD\""));
        assert!(json.contains("\"card\":\"SK\""));
    }

    #[test]
    fn test_parse_client_message_without_meta() {
        let json = r#"{"type":"JOIN_ROOM","payload":{"room_code":"ab3k","name":"Alice"}}"#;
        let msg: WebSocketMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type, MessageType::JoinRoom);

        let payload: JoinRoomPayload = serde_json::from_value(msg.payload).unwrap();
        assert_eq!(payload.room_code.as_deref(), Some("ab3k"));
        assert_eq!(payload.name, "Alice");
    }

    #[test]
    fn test_parse_message_without_payload() {
        let json = r#"{"type":"START_GAME"}"#;
        let msg: WebSocketMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type, MessageType::StartGame);
        assert!(msg.payload.is_null());
    }

    #[test]
    fn test_error_helper() {
        let msg = WebSocketMessage::error("Not your turn");
        assert_eq!(msg.message_type, MessageType::Error);
        assert!(msg.to_json().contains("Not your turn"));
        assert!(msg.meta.is_some());
    }
}
