pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use models::GameRoom;
pub use registry::RoomRegistry;

mod cleanup_task;
pub mod models;
mod registry;
