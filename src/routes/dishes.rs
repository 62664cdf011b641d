use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::routes::MessageResponse;
use crate::routes::extract::AppJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDishRequest {
    pub group_id: u64,
    pub dish_uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareDishRequest {
    pub user_email: String,
    pub dish_uri: String,
}

#[derive(Debug, Serialize)]
pub struct ShareDishResponse {
    pub success: bool,
    pub message: String,
    pub added: Vec<u64>,
    pub already_listed: Vec<u64>,
}

/// Put a dish up for voting in one group
///
/// POST /api/dishes
pub async fn add_dish(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AddDishRequest>,
) -> Result<Json<MessageResponse>> {
    let ledger = state.ledger.clone();
    tokio::task::spawn_blocking(move || ledger.add_dish_to_group(payload.group_id, &payload.dish_uri))
        .await??;

    Ok(Json(MessageResponse::ok("Food added successfully")))
}

/// Put a dish up for voting in every group the user takes part in
///
/// POST /api/dishes/share
pub async fn share_dish(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ShareDishRequest>,
) -> Result<Json<ShareDishResponse>> {
    let ledger = state.ledger.clone();
    let shared =
        tokio::task::spawn_blocking(move || ledger.share_dish(&payload.user_email, &payload.dish_uri))
            .await??;

    let in_any_group = !shared.added.is_empty() || !shared.already_listed.is_empty();
    let message = if in_any_group {
        "Food added successfully"
    } else {
        "Not a member in any groups!"
    };

    Ok(Json(ShareDishResponse {
        success: in_any_group,
        message: message.to_string(),
        added: shared.added,
        already_listed: shared.already_listed,
    }))
}
