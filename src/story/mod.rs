pub use engine::StoryEngine;
pub use models::{Story, StoryLine, MAX_LINE_CHARS};

mod engine;
pub mod models;
pub mod prompts;
