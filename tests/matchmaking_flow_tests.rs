use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::future::join_all;
use tower::ServiceExt;

use storyweave::api;
use storyweave::config::AppConfig;
use storyweave::shared::AppState;
use storyweave::storage::InMemoryMirrorStore;
use storyweave::StoryEventKind;

fn app_state(required_players: usize, max_round: u32) -> AppState {
    let config = AppConfig {
        required_players,
        max_round,
        ..AppConfig::default()
    };
    AppState::new(config, Arc::new(InMemoryMirrorStore::new()))
}

#[tokio::test]
async fn test_four_players_form_one_room_and_complete_a_story() {
    let state = app_state(4, 3);
    let mut room_events = state.event_bus.subscribe_rooms();

    for id in ["p1", "p2", "p3", "p4"] {
        assert!(state.matchmaker.enqueue(id).await);
    }

    // Exactly one room with exactly these players; the queue is drained.
    let room = room_events.recv().await.unwrap();
    let members: HashSet<&str> = room.players.iter().map(String::as_str).collect();
    assert_eq!(members, HashSet::from(["p1", "p2", "p3", "p4"]));
    assert_eq!(state.matchmaker.len(), 0);
    assert_eq!(state.registry.list_all().await.len(), 1);

    let started = state.registry.get_by_id(&room.id).await.unwrap();
    assert!(started.active);
    assert!(started.started);

    // Play the story to completion: 4 players x 3 rounds = 12 lines.
    let story = state.stories.create_story(&started).await;
    let mut story_events = state.event_bus.subscribe_stories();
    let order = story.player_order.clone();

    for turn in 0..12 {
        let player = &order[turn % 4];
        assert!(
            state
                .stories
                .add_line(&story.id, player, &format!("line {turn}"))
                .await,
            "turn {turn} by {player} should be accepted"
        );
    }

    // Events arrive in acceptance order; the last one closes the story.
    for turn in 0..12 {
        let event = story_events.recv().await.unwrap();
        assert_eq!(event.story.lines.len(), turn + 1);
        if turn < 11 {
            assert_eq!(event.kind, StoryEventKind::LineAdded);
        } else {
            assert_eq!(event.kind, StoryEventKind::StoryCompleted);
        }
    }

    // Completed: the 13th attempt bounces off.
    assert!(!state.stories.add_line(&story.id, &order[0], "late").await);

    let finished = state.stories.get_story(&story.id).await.unwrap();
    assert!(finished.completed);
    assert!(finished.full_text().starts_with(&finished.opening_prompt));
    assert_eq!(finished.text_by_round().len(), 4); // prompt + 3 rounds
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_joins_produce_disjoint_full_rooms() {
    let state = app_state(4, 3);

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let state = state.clone();
            tokio::spawn(async move { state.matchmaker.enqueue(&format!("player-{i}")).await })
        })
        .collect();

    for result in join_all(tasks).await {
        assert!(result.unwrap());
    }

    let rooms = state.registry.list_all().await;
    assert_eq!(rooms.len(), 5);
    assert_eq!(state.matchmaker.len(), 0);

    let mut seen = HashSet::new();
    for room in &rooms {
        assert_eq!(room.player_count(), 4);
        for player in &room.players {
            assert!(seen.insert(player.clone()), "{player} appears in two rooms");
        }
    }
    assert_eq!(seen.len(), 20);
}

#[tokio::test]
async fn test_sentinel_never_fills_a_room() {
    let state = app_state(4, 3);

    assert!(!state.matchmaker.enqueue("simulation-player").await);
    for id in ["p1", "p2", "p3"] {
        assert!(state.matchmaker.enqueue(id).await);
    }

    // Three real players plus a rejected sentinel: no room yet.
    assert!(state.registry.list_all().await.is_empty());
    assert_eq!(state.matchmaker.len(), 3);

    assert!(state.matchmaker.enqueue("p4").await);

    let rooms = state.registry.list_all().await;
    assert_eq!(rooms.len(), 1);
    assert!(!rooms[0].has_player("simulation-player"));
}

#[tokio::test]
async fn test_players_in_started_rooms_cannot_requeue() {
    let state = app_state(2, 3);

    assert!(state.matchmaker.enqueue("p1").await);
    assert!(state.matchmaker.enqueue("p2").await);

    // Their game started, so the matchmaker turns them away.
    assert!(!state.matchmaker.enqueue("p1").await);
    assert!(!state.matchmaker.enqueue("p2").await);
}

#[tokio::test]
async fn test_guest_login_issues_usable_id() {
    let state = app_state(4, 3);

    let response = api::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/guest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let guest_id = json["guest_id"].as_str().unwrap().to_string();
    assert!(!guest_id.is_empty());

    // The issued id passes validation on the join endpoint.
    let response = api::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/room/subscribe?player_id={guest_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"true");
    assert_eq!(state.matchmaker.len(), 1);
}

#[tokio::test]
async fn test_join_requires_a_known_guest() {
    let state = app_state(4, 3);

    let response = api::router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/room/subscribe?player_id=stranger")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_queue_status_endpoint() {
    let state = app_state(4, 3);
    state.matchmaker.enqueue("p1").await;

    let response = api::router(state)
        .oneshot(
            Request::builder()
                .uri("/api/queue/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["queue_size"], 1);
    assert_eq!(json["required_players"], 4);
}

#[tokio::test]
async fn test_unknown_room_is_not_found() {
    let state = app_state(4, 3);

    let response = api::router(state)
        .oneshot(
            Request::builder()
                .uri("/api/room/no-such-room")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rooms_listing_reflects_matches() {
    let state = app_state(2, 3);

    state.matchmaker.enqueue("p1").await;
    state.matchmaker.enqueue("p2").await;

    let response = api::router(state)
        .oneshot(
            Request::builder()
                .uri("/api/rooms")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let rooms: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(rooms.as_array().unwrap().len(), 1);
}
