// Library crate for the storyweave game server
// This file exposes the public API for integration tests

pub mod api;
pub mod auth;
pub mod config;
pub mod event;
pub mod matchmaking;
pub mod room;
pub mod shared;
pub mod storage;
pub mod story;

// Re-export commonly used types for easier access in tests
pub use config::AppConfig;
pub use event::{EventBus, StoryEvent, StoryEventKind};
pub use matchmaking::Matchmaker;
pub use room::{GameRoom, RoomRegistry};
pub use shared::{AppError, AppState};
pub use storage::{InMemoryMirrorStore, Mirror, MirrorStore};
pub use story::{Story, StoryEngine};
