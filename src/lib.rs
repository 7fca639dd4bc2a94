// Library crate for the Canadian Salad game server
// This file exposes the public API for integration tests

pub mod game;
pub mod persistence;
pub mod room;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use game::{Card, ClientGameState, GameOverPayload, PlayError, Rank, RoundRule, Suit};
pub use room::{RoomModel, RoomRegistry, RoomStatus};
pub use shared::AppState;
pub use websockets::{ConnectionManager, MessageType, WebSocketMessage};
