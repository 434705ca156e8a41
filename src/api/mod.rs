// HTTP/WS façade over the core services
//
// Matchmaking is consumed over REST + SSE, the story itself over a
// WebSocket. All handlers validate the guest id before touching the core.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::AppState;

pub use messages::{
    ContributeAck, ContributePayload, GuestLoginResponse, MatchedPayload, MatchingEventType,
    QueueStatusPayload, QueueStatusResponse,
};

mod auth_routes;
mod messages;
mod room_routes;
mod story_routes;
mod story_ws;

/// Builds the application router over the shared state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "storyweave" }))
        .route("/api/auth/guest", post(auth_routes::guest_login))
        .route(
            "/api/room/subscribe/:player_id",
            get(room_routes::subscribe_matching).delete(room_routes::leave_queue),
        )
        .route("/api/room/subscribe", post(room_routes::join_queue))
        .route("/api/queue/status", get(room_routes::queue_status))
        .route("/api/room/:room_id", get(room_routes::get_room))
        .route("/api/rooms", get(room_routes::list_rooms))
        .route("/api/story/:story_id", get(story_routes::get_story))
        .route(
            "/api/story/:story_id/lines",
            get(story_routes::get_story_lines),
        )
        .route("/ws/story/:room_id", get(story_ws::story_socket))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
