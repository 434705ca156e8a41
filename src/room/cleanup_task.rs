use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, instrument, warn};

use super::registry::RoomRegistry;
use crate::story::StoryEngine;

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run the cleanup task
    pub cleanup_interval: Duration,
    /// How long a room's story must be idle before eviction
    pub idle_threshold: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(30 * 60), // 30 minutes
            idle_threshold: Duration::from_secs(24 * 60 * 60), // 24 hours
        }
    }
}

/// Starts the background task that periodically evicts idle rooms
///
/// Rooms live indefinitely while played; once their story stops changing
/// (completed stories included) they age out after the idle threshold,
/// together with the story, the membership index and the mirror keys.
#[instrument(skip(registry, stories))]
pub async fn start_cleanup_task(
    registry: Arc<RoomRegistry>,
    stories: Arc<StoryEngine>,
    config: CleanupConfig,
) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        idle_threshold_secs = config.idle_threshold.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        let evicted = cleanup_idle_rooms(&registry, &stories, config.idle_threshold).await;
        if evicted > 0 {
            info!(evicted = evicted, "Room cleanup completed");
        }
    }
}

/// Evicts every room whose story (or the room itself, when no story was
/// ever created) has been idle longer than the threshold
async fn cleanup_idle_rooms(
    registry: &Arc<RoomRegistry>,
    stories: &Arc<StoryEngine>,
    idle_threshold: Duration,
) -> usize {
    let Ok(idle_threshold) = chrono::Duration::from_std(idle_threshold) else {
        warn!("Idle threshold out of range; skipping cleanup pass");
        return 0;
    };

    let now = Utc::now();
    let mut evicted = 0;

    for room in registry.list_all().await {
        let story = stories.get_story(&room.id).await;
        let idle_since = story
            .as_ref()
            .map(|story| story.last_updated_at)
            .unwrap_or(room.created_at);

        if !is_idle(now, idle_since, idle_threshold) {
            continue;
        }

        stories.remove_story(&room.id).await;
        if registry.remove_group(&room.id).await {
            evicted += 1;
            info!(room_id = %room.id, "Evicted idle room");
        }
    }

    evicted
}

fn is_idle(now: DateTime<Utc>, idle_since: DateTime<Utc>, threshold: chrono::Duration) -> bool {
    now - idle_since > threshold
}
