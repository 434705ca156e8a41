use axum::{extract::State, Json};
use tracing::instrument;

use super::messages::GuestLoginResponse;
use crate::shared::AppState;

/// POST /api/auth/guest - mints an anonymous guest id
#[instrument(skip(state))]
pub async fn guest_login(State(state): State<AppState>) -> Json<GuestLoginResponse> {
    let guest_id = state.guests.issue().await;
    Json(GuestLoginResponse { guest_id })
}
