use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Matchmaking lifecycle as seen by SSE subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchingEventType {
    Waiting,
    QueueStatus,
    Matched,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuestLoginResponse {
    pub guest_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchedPayload {
    pub room_id: String,
    pub players: Vec<String>,
    pub matched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusPayload {
    pub player_id: String,
    pub queue_size: usize,
    pub required_players: usize,
    pub estimated_wait_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStatusResponse {
    pub queue_size: usize,
    pub required_players: usize,
}

/// Client -> server over the story socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributePayload {
    pub player_id: String,
    pub content: String,
}

/// Server -> client answer to a contribution attempt
#[derive(Debug, Clone, Serialize)]
pub struct ContributeAck {
    pub success: bool,
    pub story_id: String,
}
