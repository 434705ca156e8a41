use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::shared::{AppError, AppState};
use crate::story::StoryLine;

/// Largest page a single lines request may ask for
const MAX_LINES_PAGE: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct StoryInfoResponse {
    pub id: String,
    pub room_id: String,
    pub players: Vec<String>,
    pub opening_prompt: String,
    pub current_player: Option<String>,
    pub current_round: u32,
    pub max_round: u32,
    pub completed: bool,
    pub full_text: String,
    pub rounds: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StoryLinesParams {
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryLinesResponse {
    pub story_id: String,
    pub lines: Vec<StoryLine>,
    pub total_count: usize,
    pub has_more: bool,
}

/// GET /api/story/{story_id} - assembled story state
#[instrument(skip(state))]
pub async fn get_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<Json<StoryInfoResponse>, AppError> {
    let story = state
        .stories
        .get_story(&story_id)
        .await
        .ok_or(AppError::NotFound("story not found".to_string()))?;

    Ok(Json(StoryInfoResponse {
        id: story.id.clone(),
        room_id: story.room_id.clone(),
        players: story.player_order.clone(),
        opening_prompt: story.opening_prompt.clone(),
        current_player: story.current_player().map(str::to_string),
        current_round: story.current_round,
        max_round: story.max_round,
        completed: story.completed,
        full_text: story.full_text(),
        rounds: story.text_by_round(),
    }))
}

/// GET /api/story/{story_id}/lines - paginated lines
#[instrument(skip(state))]
pub async fn get_story_lines(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Query(params): Query<StoryLinesParams>,
) -> Result<Json<StoryLinesResponse>, AppError> {
    let story = state
        .stories
        .get_story(&story_id)
        .await
        .ok_or(AppError::NotFound("story not found".to_string()))?;

    let limit = params.limit.unwrap_or(20).min(MAX_LINES_PAGE);
    let from = params.offset.min(story.lines.len());
    let to = (from + limit).min(story.lines.len());

    Ok(Json(StoryLinesResponse {
        story_id,
        lines: story.lines[from..to].to_vec(),
        total_count: story.lines.len(),
        has_more: to < story.lines.len(),
    }))
}
