// Event-driven communication between the core services and subscribers
//
// The bus is the only channel through which matchmaking results and story
// changes reach connected clients; services publish after committing state
// and never wait on consumers.

pub use bus::EventBus;
pub use events::{StoryEvent, StoryEventKind};

mod bus;
mod events;
