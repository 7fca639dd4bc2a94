// Public API
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use models::{PlayerModel, RoomModel, RoomStatus, TrickCard};
pub use registry::{
    AdvanceRoundResult, JoinRoomResult, PlayCardResult, RoomRegistry, StartGameResult,
};

// Internal modules
pub mod cleanup_task;
pub mod codes;
pub mod models;
pub mod registry;
