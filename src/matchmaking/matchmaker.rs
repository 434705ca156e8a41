use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::queue::WaitingQueue;
use crate::room::RoomRegistry;
use crate::storage::{keys, Mirror};

/// Accumulates waiting players and forms rooms once the quota is reached
///
/// Group formation happens outside the queue's matching guard: batches are
/// withdrawn first, the guard is released, and only then are rooms created
/// and started.
pub struct Matchmaker {
    queue: WaitingQueue,
    registry: Arc<RoomRegistry>,
    mirror: Mirror,
}

impl Matchmaker {
    pub fn new(queue: WaitingQueue, registry: Arc<RoomRegistry>, mirror: Mirror) -> Self {
        Self {
            queue,
            registry,
            mirror,
        }
    }

    /// Admits a player to the waiting queue and runs a matching attempt.
    ///
    /// Returns false without side effects when the player is already
    /// queued, is the simulation sentinel, or already sits in a room whose
    /// game has started.
    #[instrument(skip(self))]
    pub async fn enqueue(&self, player_id: &str) -> bool {
        if let Some(room) = self.registry.get_by_player(player_id).await {
            if room.started {
                debug!(
                    player_id = %player_id,
                    room_id = %room.id,
                    "Player already in a started room; not queueing"
                );
                return false;
            }
        }

        if !self.queue.enqueue(player_id) {
            debug!(player_id = %player_id, "Player not admitted to the queue");
            return false;
        }

        info!(
            player_id = %player_id,
            waiting = self.queue.len(),
            "Player joined the waiting queue"
        );

        self.mirror_queue();
        self.match_players().await;
        true
    }

    /// Removes a player from the queue. Idempotent.
    #[instrument(skip(self))]
    pub async fn dequeue(&self, player_id: &str) -> bool {
        if !self.queue.dequeue(player_id) {
            return false;
        }

        info!(
            player_id = %player_id,
            waiting = self.queue.len(),
            "Player left the waiting queue"
        );

        self.mirror_queue();
        true
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn required_players(&self) -> usize {
        self.queue.quota()
    }

    /// Withdraws every full batch and forms one room per batch.
    ///
    /// Losing the matching race is not an error: the concurrent winner
    /// drains the queue and this call returns having done nothing.
    async fn match_players(&self) {
        let batches = self.queue.drain_batches();
        if batches.is_empty() {
            return;
        }

        let batch_count = batches.len();
        for players in batches {
            let room = self.registry.create_group(players.into_iter().collect()).await;
            self.registry.set_active(&room.id, true).await;
            self.registry.start_game(&room.id).await;

            info!(
                room_id = %room.id,
                players = room.player_count(),
                "Players matched; room activated and game started"
            );
        }

        debug!(batches = batch_count, "Matching attempt formed rooms");
        self.mirror_queue();
    }

    fn mirror_queue(&self) {
        match serde_json::to_string(&self.queue.snapshot()) {
            Ok(json) => self
                .mirror
                .set(keys::WAITING_QUEUE_KEY.to_string(), json, None),
            Err(e) => warn!(error = %e, "Failed to serialize waiting queue"),
        }
    }
}
