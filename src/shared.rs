use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::GuestDirectory;
use crate::config::AppConfig;
use crate::event::EventBus;
use crate::matchmaking::{Matchmaker, WaitingQueue};
use crate::room::RoomRegistry;
use crate::storage::{Mirror, MirrorStore};
use crate::story::StoryEngine;

/// Shared application state containing all services
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub event_bus: EventBus,
    pub guests: Arc<GuestDirectory>,
    pub registry: Arc<RoomRegistry>,
    pub matchmaker: Arc<Matchmaker>,
    pub stories: Arc<StoryEngine>,
}

impl AppState {
    /// Wires the services together over the given mirror store
    pub fn new(config: AppConfig, store: Arc<dyn MirrorStore>) -> Self {
        let mirror = Mirror::new(store);
        let event_bus = EventBus::new(config.event_capacity);

        let guests = Arc::new(GuestDirectory::new(mirror.clone(), config.guest_ttl));
        let registry = Arc::new(RoomRegistry::new(event_bus.clone(), mirror.clone()));
        let matchmaker = Arc::new(Matchmaker::new(
            WaitingQueue::new(
                config.required_players,
                config.simulation_player_id.clone(),
            ),
            registry.clone(),
            mirror.clone(),
        ));
        let stories = Arc::new(StoryEngine::new(
            event_bus.clone(),
            mirror,
            config.max_round,
        ));

        Self {
            config,
            event_bus,
            guests,
            registry,
            matchmaker,
            stories,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::StoreError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Store error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    #[tokio::test]
    async fn test_state_wiring() {
        let state = test_state(4, 3);

        assert_eq!(state.matchmaker.required_players(), 4);
        assert!(state.matchmaker.is_empty());
        assert!(state.registry.list_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_core_operations_survive_unreachable_store() {
        let config = AppConfig {
            required_players: 2,
            ..AppConfig::default()
        };
        let state = AppState::new(config, Arc::new(UnavailableMirrorStore));

        // Everything proceeds on in-memory state alone.
        let guest = state.guests.issue().await;
        assert!(state.guests.is_valid(&guest).await);

        assert!(state.matchmaker.enqueue("p1").await);
        assert!(state.matchmaker.enqueue("p2").await);

        let room = state.registry.get_by_player("p1").await.unwrap();
        assert!(room.started);

        let story = state.stories.create_story(&room).await;
        let first = story.player_order[0].clone();
        assert!(state.stories.add_line(&story.id, &first, "still works").await);
    }
}
