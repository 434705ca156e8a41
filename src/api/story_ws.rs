use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};

use super::messages::{ContributeAck, ContributePayload};
use crate::event::StoryEvent;
use crate::shared::AppState;

#[derive(Debug, Deserialize)]
pub struct StorySocketParams {
    pub player_id: String,
}

/// GET /ws/story/{room_id} - live story subscription + contributions
///
/// On connect the room's story is created if needed and a full snapshot is
/// pushed; afterwards every change to this room's story is forwarded, and
/// incoming CONTRIBUTE messages are answered with an ack.
#[instrument(skip(ws, state))]
pub async fn story_socket(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(params): Query<StorySocketParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_story_socket(socket, state, room_id, params.player_id))
}

async fn handle_story_socket(
    mut socket: WebSocket,
    state: AppState,
    room_id: String,
    player_id: String,
) {
    if !state.guests.is_valid(&player_id).await {
        let _ = socket
            .send(Message::Text(error_json("guest login required")))
            .await;
        return;
    }

    let Some(room) = state.registry.get_by_id(&room_id).await else {
        let _ = socket.send(Message::Text(error_json("room not found"))).await;
        return;
    };

    // Subscribe before taking the snapshot so a change landing in between
    // is delivered rather than lost.
    let mut events = state.event_bus.subscribe_stories();

    let story = match state.stories.get_story(&room_id).await {
        Some(story) => story,
        None => state.stories.create_story(&room).await,
    };

    info!(room_id = %room_id, player_id = %player_id, "Story subscriber connected");

    let (mut sender, mut receiver) = socket.split();

    if send_json(&mut sender, &StoryEvent::snapshot(story)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.story.room_id == room_id => {
                    if send_json(&mut sender, &event).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {} // change on another room's story
                Err(RecvError::Lagged(missed)) => {
                    warn!(
                        room_id = %room_id,
                        missed = missed,
                        "Story subscriber lagged; oldest events dropped"
                    );
                }
                Err(RecvError::Closed) => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let ack = handle_contribution(&state, &room_id, &text).await;
                    if send_json(&mut sender, &ack).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ignore binary/ping/pong
                Some(Err(e)) => {
                    debug!(room_id = %room_id, error = %e, "Story socket receive failed");
                    break;
                }
            },
        }
    }

    info!(room_id = %room_id, player_id = %player_id, "Story subscriber disconnected");
}

async fn handle_contribution(state: &AppState, room_id: &str, text: &str) -> ContributeAck {
    let success = match serde_json::from_str::<ContributePayload>(text) {
        Ok(payload) => {
            state
                .stories
                .add_line(room_id, &payload.player_id, &payload.content)
                .await
        }
        Err(e) => {
            debug!(room_id = %room_id, error = %e, "Malformed contribution payload");
            false
        }
    };

    ContributeAck {
        success,
        story_id: room_id.to_string(),
    }
}

async fn send_json<T: Serialize>(
    sender: &mut SplitSink<WebSocket, Message>,
    value: &T,
) -> Result<(), axum::Error> {
    match serde_json::to_string(value) {
        Ok(json) => sender.send(Message::Text(json)).await,
        Err(e) => {
            warn!(error = %e, "Failed to serialize outbound message");
            Ok(())
        }
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
