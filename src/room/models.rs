use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A matched group of players sharing one story
///
/// Membership is fixed at formation time; the lifecycle only moves forward:
/// formed -> active -> started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRoom {
    pub id: String, // UUID v4 as string
    pub players: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
    pub started: bool,
    pub started_at: Option<DateTime<Utc>>,
}

impl GameRoom {
    /// Creates a new room with a generated ID from a full set of players
    pub fn new(players: BTreeSet<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            players,
            created_at: Utc::now(),
            active: false,
            started: false,
            started_at: None,
        }
    }

    /// Marks the game as started. One-way: calling it again is a no-op.
    pub fn start_game(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.started_at = Some(Utc::now());
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.contains(player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}
