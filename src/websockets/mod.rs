// Public API
pub use connection_manager::ConnectionManager;
pub use handler::ws_handler;
pub use messages::{MessageType, WebSocketMessage};
pub use socket::{SocketError, SocketWrapper};

// Internal modules
pub mod connection_manager;
pub mod handler;
pub mod messages;
pub mod socket;
