use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::GameRoom;
use crate::event::EventBus;
use crate::storage::{keys, Mirror};

/// Owns all active rooms and the player -> room index
///
/// Both maps are internally synchronized; callers get snapshots, never
/// references into the maps. Room creation publishes on the event bus and
/// mirrors membership best-effort.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, GameRoom>>,
    player_index: RwLock<HashMap<String, String>>,
    event_bus: EventBus,
    mirror: Mirror,
}

impl RoomRegistry {
    pub fn new(event_bus: EventBus, mirror: Mirror) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            player_index: RwLock::new(HashMap::new()),
            event_bus,
            mirror,
        }
    }

    /// Creates a room from a full batch of players
    ///
    /// Always succeeds: stores the room, indexes every member, mirrors
    /// membership and publishes the room on the bus, in that order.
    #[instrument(skip(self, players))]
    pub async fn create_group(&self, players: BTreeSet<String>) -> GameRoom {
        let room = GameRoom::new(players);

        {
            let mut rooms = self.rooms.write().unwrap();
            rooms.insert(room.id.clone(), room.clone());
        }

        {
            let mut index = self.player_index.write().unwrap();
            for player_id in &room.players {
                if let Some(previous) = index.insert(player_id.clone(), room.id.clone()) {
                    if previous != room.id {
                        warn!(
                            player_id = %player_id,
                            previous_room = %previous,
                            room_id = %room.id,
                            "Player was already indexed to a room; last write wins"
                        );
                    }
                }
            }
        }

        self.mirror_room(&room);
        self.event_bus.publish_room(room.clone());

        info!(
            room_id = %room.id,
            players = room.player_count(),
            "Room created"
        );

        room
    }

    /// Administrative gate set after formation
    pub async fn set_active(&self, room_id: &str, active: bool) -> bool {
        let mut rooms = self.rooms.write().unwrap();
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.active = active;
                true
            }
            None => false,
        }
    }

    /// One-way transition into the started state
    pub async fn start_game(&self, room_id: &str) -> bool {
        let mut rooms = self.rooms.write().unwrap();
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.start_game();
                true
            }
            None => false,
        }
    }

    pub async fn get_by_id(&self, room_id: &str) -> Option<GameRoom> {
        let rooms = self.rooms.read().unwrap();
        rooms.get(room_id).cloned()
    }

    pub async fn get_by_player(&self, player_id: &str) -> Option<GameRoom> {
        let room_id = {
            let index = self.player_index.read().unwrap();
            index.get(player_id).cloned()
        }?;

        let rooms = self.rooms.read().unwrap();
        rooms.get(&room_id).cloned()
    }

    /// Snapshot of every room, not a live view
    pub async fn list_all(&self) -> Vec<GameRoom> {
        let rooms = self.rooms.read().unwrap();
        rooms.values().cloned().collect()
    }

    /// Drops a room, its index entries and its mirror keys.
    /// Used by the cleanup task; there is no caller-facing deletion.
    #[instrument(skip(self))]
    pub async fn remove_group(&self, room_id: &str) -> bool {
        let removed = {
            let mut rooms = self.rooms.write().unwrap();
            rooms.remove(room_id)
        };

        let Some(room) = removed else {
            debug!(room_id = %room_id, "Room not found for removal");
            return false;
        };

        {
            let mut index = self.player_index.write().unwrap();
            for player_id in &room.players {
                // Only drop pointers still referring to this room; a player
                // re-indexed elsewhere keeps the newer mapping.
                if index.get(player_id).is_some_and(|id| id == room_id) {
                    index.remove(player_id);
                }
            }
        }

        self.mirror.remove(keys::room_key(room_id));
        for player_id in &room.players {
            self.mirror.remove(keys::player_room_key(player_id));
        }

        info!(room_id = %room_id, "Room removed");
        true
    }

    fn mirror_room(&self, room: &GameRoom) {
        let members: Vec<&String> = room.players.iter().collect();
        match serde_json::to_string(&members) {
            Ok(json) => self.mirror.set(keys::room_key(&room.id), json, None),
            Err(e) => warn!(room_id = %room.id, error = %e, "Failed to serialize room members"),
        }

        for player_id in &room.players {
            self.mirror
                .set(keys::player_room_key(player_id), room.id.clone(), None);
        }
    }
}
