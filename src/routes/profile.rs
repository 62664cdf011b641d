use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::Result;
use crate::routes::MessageResponse;
use crate::routes::extract::AppJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Create or update the name shown next to a user's email
///
/// PUT /api/profile
pub async fn save_profile(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SaveProfileRequest>,
) -> Result<Json<MessageResponse>> {
    let profiles = state.profiles.clone();
    tokio::task::spawn_blocking(move || {
        profiles.save_profile(&payload.email, &payload.first_name, &payload.last_name)
    })
    .await??;

    Ok(Json(MessageResponse::ok("Profile saved successfully")))
}
