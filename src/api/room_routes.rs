use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{instrument, warn};

use super::messages::{
    MatchedPayload, MatchingEventType, QueueStatusPayload, QueueStatusResponse,
};
use crate::room::GameRoom;
use crate::shared::{AppError, AppState};

type MatchingStream = BoxStream<'static, Result<Event, Infallible>>;

/// GET /api/room/subscribe/{player_id} - SSE stream through matchmaking
///
/// A player already in a started room gets MATCHED immediately; everyone
/// else is enqueued (re-subscribing while queued is fine) and receives
/// WAITING and QUEUE_STATUS, then MATCHED once a room containing them is
/// published.
#[instrument(skip(state))]
pub async fn subscribe_matching(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Sse<MatchingStream>, AppError> {
    if !state.guests.is_valid(&player_id).await {
        return Err(AppError::Unauthorized("guest login required".to_string()));
    }

    if let Some(room) = started_room_for(&state, &player_id).await {
        let stream = stream::once(async move { Ok(matched_event(&room)) })
            .chain(stream::pending())
            .boxed();
        return Ok(sse_response(stream));
    }

    // Subscribe before enqueueing so this connection cannot miss its own
    // match event.
    let events = state.event_bus.subscribe_rooms();
    state.matchmaker.enqueue(&player_id).await;

    let initial: Vec<Result<Event, Infallible>> = vec![
        Ok(waiting_event(&player_id)),
        Ok(queue_status_event(&state, &player_id)),
    ];

    let subscriber = player_id.clone();
    let room_events = BroadcastStream::new(events).filter_map(move |event| {
        let subscriber = subscriber.clone();
        async move {
            match event {
                Ok(room) if room.has_player(&subscriber) => Some(Ok(matched_event(&room))),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(missed)) => {
                    warn!(
                        player_id = %subscriber,
                        missed = missed,
                        "Matching subscriber lagged; oldest room events dropped"
                    );
                    None
                }
            }
        }
    });

    let stream = stream::iter(initial).chain(room_events).boxed();
    Ok(sse_response(stream))
}

#[derive(Debug, Deserialize)]
pub struct JoinQueueParams {
    pub player_id: String,
}

/// POST /api/room/subscribe - joins the queue without an event stream
#[instrument(skip(state))]
pub async fn join_queue(
    State(state): State<AppState>,
    Query(params): Query<JoinQueueParams>,
) -> Result<Json<bool>, AppError> {
    if !state.guests.is_valid(&params.player_id).await {
        return Err(AppError::Unauthorized("guest login required".to_string()));
    }

    Ok(Json(state.matchmaker.enqueue(&params.player_id).await))
}

/// DELETE /api/room/subscribe/{player_id} - leaves the queue
#[instrument(skip(state))]
pub async fn leave_queue(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<bool>, AppError> {
    if !state.guests.is_valid(&player_id).await {
        return Err(AppError::Unauthorized("guest login required".to_string()));
    }

    Ok(Json(state.matchmaker.dequeue(&player_id).await))
}

/// GET /api/queue/status
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatusResponse> {
    Json(QueueStatusResponse {
        queue_size: state.matchmaker.len(),
        required_players: state.matchmaker.required_players(),
    })
}

/// GET /api/room/{room_id}
#[instrument(skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<GameRoom>, AppError> {
    state
        .registry
        .get_by_id(&room_id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound("room not found".to_string()))
}

/// GET /api/rooms
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<GameRoom>> {
    Json(state.registry.list_all().await)
}

async fn started_room_for(state: &AppState, player_id: &str) -> Option<GameRoom> {
    state
        .registry
        .get_by_player(player_id)
        .await
        .filter(|room| room.started)
}

fn sse_response(stream: MatchingStream) -> Sse<MatchingStream> {
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn sse_event<T: Serialize>(event_type: MatchingEventType, id: String, payload: &T) -> Event {
    let event = Event::default().id(id).event(event_type.to_string());
    match serde_json::to_string(payload) {
        Ok(json) => event.data(json),
        Err(_) => event.data("{}"),
    }
}

fn matched_event(room: &GameRoom) -> Event {
    sse_event(
        MatchingEventType::Matched,
        room.id.clone(),
        &MatchedPayload {
            room_id: room.id.clone(),
            players: room.players.iter().cloned().collect(),
            matched_at: Utc::now(),
        },
    )
}

fn waiting_event(player_id: &str) -> Event {
    sse_event(
        MatchingEventType::Waiting,
        "0".to_string(),
        &serde_json::json!({ "player_id": player_id, "status": "WAITING" }),
    )
}

fn queue_status_event(state: &AppState, player_id: &str) -> Event {
    let queue_size = state.matchmaker.len();
    let required_players = state.matchmaker.required_players();

    sse_event(
        MatchingEventType::QueueStatus,
        "queue-status".to_string(),
        &QueueStatusPayload {
            player_id: player_id.to_string(),
            queue_size,
            required_players,
            estimated_wait_secs: estimated_wait_secs(queue_size, required_players),
        },
    )
}

/// Rough wait estimate: the emptier the queue, the longer until a full
/// batch accumulates.
fn estimated_wait_secs(queue_size: usize, required_players: usize) -> u64 {
    let base = 30;
    let missing = required_players.saturating_sub(queue_size) as u64;
    base + missing * 15
}
