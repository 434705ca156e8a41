use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::story::Story;

/// What changed on a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryEventKind {
    /// Initial snapshot sent to a fresh subscriber
    StoryCreated,
    LineAdded,
    StoryCompleted,
}

/// A story change, carrying the full post-change snapshot
///
/// Events are facts about state that has already been committed; a later
/// event for the same story supersedes earlier ones.
#[derive(Debug, Clone, Serialize)]
pub struct StoryEvent {
    #[serde(rename = "type")]
    pub kind: StoryEventKind,
    pub story: Story,
    pub event_time: DateTime<Utc>,
}

impl StoryEvent {
    pub fn new(kind: StoryEventKind, story: Story) -> Self {
        Self {
            kind,
            story,
            event_time: Utc::now(),
        }
    }

    /// Event for a story that just accepted a line
    pub fn for_change(story: Story) -> Self {
        let kind = if story.completed {
            StoryEventKind::StoryCompleted
        } else {
            StoryEventKind::LineAdded
        };
        Self::new(kind, story)
    }

    /// Initial event for a subscriber that just attached to a story
    pub fn snapshot(story: Story) -> Self {
        let kind = if story.completed {
            StoryEventKind::StoryCompleted
        } else {
            StoryEventKind::StoryCreated
        };
        Self::new(kind, story)
    }

    pub fn current_turn_player(&self) -> Option<&str> {
        self.story.current_player()
    }
}
