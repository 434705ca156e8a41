use tokio::sync::broadcast;
use tracing::debug;

use super::events::StoryEvent;
use crate::room::GameRoom;

/// Event bus for distributing state changes throughout the application
///
/// Two multicast topics: created rooms and story changes. Publishing never
/// blocks; each subscriber gets its own bounded buffer and, when it falls
/// behind by more than the capacity, loses the oldest events (the payloads
/// are full snapshots, so a newer event supersedes anything dropped).
#[derive(Debug, Clone)]
pub struct EventBus {
    rooms: broadcast::Sender<GameRoom>,
    stories: broadcast::Sender<StoryEvent>,
}

impl EventBus {
    /// Creates a new event bus with the given per-subscriber buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (rooms, _) = broadcast::channel(capacity);
        let (stories, _) = broadcast::channel(capacity);
        Self { rooms, stories }
    }

    /// Emits a newly created room to all room subscribers
    pub fn publish_room(&self, room: GameRoom) {
        let room_id = room.id.clone();
        match self.rooms.send(room) {
            Ok(receiver_count) => {
                debug!(room_id = %room_id, receivers = receiver_count, "Room event emitted");
            }
            Err(_) => {
                debug!(room_id = %room_id, "Room event emitted with no receivers");
            }
        }
    }

    /// Emits a story change to all story subscribers
    pub fn publish_story(&self, event: StoryEvent) {
        let story_id = event.story.id.clone();
        let kind = event.kind;
        match self.stories.send(event) {
            Ok(receiver_count) => {
                debug!(
                    story_id = %story_id,
                    kind = %kind,
                    receivers = receiver_count,
                    "Story event emitted"
                );
            }
            Err(_) => {
                debug!(story_id = %story_id, kind = %kind, "Story event emitted with no receivers");
            }
        }
    }

    pub fn subscribe_rooms(&self) -> broadcast::Receiver<GameRoom> {
        self.rooms.subscribe()
    }

    pub fn subscribe_stories(&self) -> broadcast::Receiver<StoryEvent> {
        self.stories.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::events::StoryEventKind;
    use crate::story::Story;
    use std::collections::BTreeSet;
    use tokio::sync::broadcast::error::RecvError;

    fn room(players: &[&str]) -> GameRoom {
        GameRoom::new(players.iter().map(|p| p.to_string()).collect::<BTreeSet<_>>())
    }

    fn story_event(id: &str) -> StoryEvent {
        StoryEvent::new(
            StoryEventKind::LineAdded,
            Story::new(id.to_string(), vec!["a".to_string()], "p".to_string(), 1),
        )
    }

    #[tokio::test]
    async fn test_room_events_reach_all_subscribers() {
        let bus = EventBus::new(16);
        let mut first = bus.subscribe_rooms();
        let mut second = bus.subscribe_rooms();

        let published = room(&["p1", "p2"]);
        bus.publish_room(published.clone());

        assert_eq!(first.recv().await.unwrap().id, published.id);
        assert_eq!(second.recv().await.unwrap().id, published.id);
    }

    #[tokio::test]
    async fn test_story_events_delivered_in_publish_order() {
        let bus = EventBus::new(16);
        let mut receiver = bus.subscribe_stories();

        bus.publish_story(story_event("s1"));
        bus.publish_story(story_event("s2"));
        bus.publish_story(story_event("s3"));

        assert_eq!(receiver.recv().await.unwrap().story.id, "s1");
        assert_eq!(receiver.recv().await.unwrap().story.id, "s2");
        assert_eq!(receiver.recv().await.unwrap().story.id, "s3");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_fail() {
        let bus = EventBus::new(16);

        bus.publish_room(room(&["p1"]));
        bus.publish_story(story_event("s1"));
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);

        bus.publish_room(room(&["early"]));

        let mut late = bus.subscribe_rooms();
        let published = room(&["late"]);
        bus.publish_room(published.clone());

        assert_eq!(late.recv().await.unwrap().id, published.id);
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_oldest() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe_stories();

        bus.publish_story(story_event("s1"));
        bus.publish_story(story_event("s2"));
        bus.publish_story(story_event("s3"));

        // Capacity 2: s1 was dropped, the receiver is told how far it lagged.
        match slow.recv().await {
            Err(RecvError::Lagged(missed)) => assert_eq!(missed, 1),
            other => panic!("expected lag notice, got {other:?}"),
        }
        assert_eq!(slow.recv().await.unwrap().story.id, "s2");
        assert_eq!(slow.recv().await.unwrap().story.id, "s3");
    }
}
