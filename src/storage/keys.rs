//! Key layout for the mirror store.

/// Ordered list of queued player ids, serialized as a JSON array.
pub const WAITING_QUEUE_KEY: &str = "waiting:queue";

const ROOM_KEY_PREFIX: &str = "room:";
const STORY_KEY_PREFIX: &str = "story:";
const GUEST_KEY_PREFIX: &str = "guest:";

/// Room membership, serialized as a JSON array of player ids.
pub fn room_key(room_id: &str) -> String {
    format!("{ROOM_KEY_PREFIX}{room_id}")
}

/// Player -> room pointer.
pub fn player_room_key(player_id: &str) -> String {
    format!("player:{player_id}:room")
}

/// Full story snapshot, serialized as JSON.
pub fn story_key(story_id: &str) -> String {
    format!("{STORY_KEY_PREFIX}{story_id}")
}

pub fn guest_key(guest_id: &str) -> String {
    format!("{GUEST_KEY_PREFIX}{guest_id}")
}
