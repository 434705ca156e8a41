use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::models::Story;
use super::prompts;
use crate::event::{EventBus, StoryEvent};
use crate::room::GameRoom;
use crate::storage::{keys, Mirror};

/// Owns every story, keyed by room id
///
/// Each story sits behind its own mutex so concurrent contributions to one
/// story serialize without contending with unrelated stories. The outer map
/// lock is only held to look up or insert the Arc, never during a
/// contribution.
pub struct StoryEngine {
    stories: RwLock<HashMap<String, Arc<Mutex<Story>>>>,
    event_bus: EventBus,
    mirror: Mirror,
    max_round: u32,
}

impl StoryEngine {
    pub fn new(event_bus: EventBus, mirror: Mirror, max_round: u32) -> Self {
        Self {
            stories: RwLock::new(HashMap::new()),
            event_bus,
            mirror,
            max_round,
        }
    }

    /// Creates the story for a room, or returns the existing one.
    ///
    /// Idempotent under concurrency: the map entry decides the winner and
    /// every other caller gets the winner's story.
    #[instrument(skip(self, room))]
    pub async fn create_story(&self, room: &GameRoom) -> Story {
        let mut stories = self.stories.write().unwrap();

        match stories.entry(room.id.clone()) {
            Entry::Occupied(entry) => {
                debug!(room_id = %room.id, "Story already exists");
                entry.get().lock().unwrap().clone()
            }
            Entry::Vacant(entry) => {
                let story = Story::new(
                    room.id.clone(),
                    room.players.iter().cloned().collect(),
                    prompts::random_prompt().to_string(),
                    self.max_round,
                );
                entry.insert(Arc::new(Mutex::new(story.clone())));
                drop(stories);

                info!(
                    story_id = %story.id,
                    players = story.player_order.len(),
                    max_round = story.max_round,
                    "Story created"
                );

                self.mirror_story(&story);
                story
            }
        }
    }

    pub async fn get_story(&self, story_id: &str) -> Option<Story> {
        let stories = self.stories.read().unwrap();
        stories.get(story_id).map(|story| story.lock().unwrap().clone())
    }

    /// Appends a line if the story exists, is open, and it is this
    /// player's turn; publishes the change and mirrors the new snapshot.
    ///
    /// Returns false with no state change otherwise.
    #[instrument(skip(self, content))]
    pub async fn add_line(&self, story_id: &str, player_id: &str, content: &str) -> bool {
        let story = {
            let stories = self.stories.read().unwrap();
            stories.get(story_id).cloned()
        };

        let Some(story) = story else {
            debug!(story_id = %story_id, "Story not found");
            return false;
        };

        let snapshot = {
            let mut story = story.lock().unwrap();
            if !story.add_line(player_id, content) {
                debug!(
                    story_id = %story_id,
                    player_id = %player_id,
                    "Contribution rejected"
                );
                return false;
            }
            let snapshot = story.clone();
            // Published under the story lock so subscribers observe changes
            // to one story in acceptance order. The send never blocks.
            self.event_bus.publish_story(StoryEvent::for_change(snapshot.clone()));
            snapshot
        };

        info!(
            story_id = %story_id,
            player_id = %player_id,
            round = snapshot.current_round,
            completed = snapshot.completed,
            "Line accepted"
        );

        self.mirror_story(&snapshot);
        true
    }

    /// Drops a story and its mirror key. Used by the cleanup task.
    #[instrument(skip(self))]
    pub async fn remove_story(&self, story_id: &str) -> bool {
        let removed = {
            let mut stories = self.stories.write().unwrap();
            stories.remove(story_id).is_some()
        };

        if removed {
            self.mirror.remove(keys::story_key(story_id));
            info!(story_id = %story_id, "Story removed");
        }
        removed
    }

    fn mirror_story(&self, story: &Story) {
        match serde_json::to_string(story) {
            Ok(json) => self.mirror.set(keys::story_key(&story.id), json, None),
            Err(e) => warn!(story_id = %story.id, error = %e, "Failed to serialize story"),
        }
    }
}
