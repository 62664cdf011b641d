use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::TOP_VOTES_LIMIT;
use crate::error::Result;
use crate::models::{TopDish, VoteOption};
use crate::routes::extract::{AppJson, AppQuery};
use crate::services::VoteOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOptionsParams {
    pub group_id: u64,
    pub user_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub group_id: u64,
    pub user_email: String,
    pub dish_uri: String,
}

#[derive(Debug, Serialize)]
pub struct CastVoteResponse {
    pub success: bool,
    pub message: String,
    pub votes_count: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CancelVoteResponse {
    pub success: bool,
    pub removed: bool,
    pub votes_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopVotesParams {
    pub group_id: u64,
    pub limit: Option<usize>,
}

/// Dishes of a group with their counts and the user's own votes flagged
///
/// GET /api/votes?groupId=<id>&userEmail=<email>
pub async fn list_vote_options(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<VoteOptionsParams>,
) -> Result<Json<Vec<VoteOption>>> {
    let ledger = state.ledger.clone();
    let options = tokio::task::spawn_blocking(move || {
        ledger.list_vote_options(params.group_id, &params.user_email)
    })
    .await??;

    Ok(Json(options))
}

/// Vote for a dish
///
/// A vote over the per-user cap is not an error: the response carries
/// `success: false` and nothing is stored.
///
/// POST /api/votes
pub async fn cast_vote(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VoteRequest>,
) -> Result<Json<CastVoteResponse>> {
    let ledger = state.ledger.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        ledger.cast_vote(payload.group_id, &payload.user_email, &payload.dish_uri)
    })
    .await??;

    let response = match outcome {
        VoteOutcome::Recorded { votes_count } => CastVoteResponse {
            success: true,
            message: "Vote registered successfully".to_string(),
            votes_count: Some(votes_count),
        },
        VoteOutcome::LimitReached { limit } => CastVoteResponse {
            success: false,
            message: format!("Vote limit reached ({} per group)", limit),
            votes_count: None,
        },
    };

    Ok(Json(response))
}

/// Withdraw a vote for a dish
///
/// DELETE /api/votes
pub async fn cancel_vote(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VoteRequest>,
) -> Result<Json<CancelVoteResponse>> {
    let ledger = state.ledger.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        ledger.cancel_vote(payload.group_id, &payload.user_email, &payload.dish_uri)
    })
    .await??;

    Ok(Json(CancelVoteResponse {
        success: true,
        removed: outcome.removed,
        votes_count: outcome.votes_count,
    }))
}

/// Most voted dishes of a group
///
/// GET /api/votes/top?groupId=<id>[&limit=<n>]
pub async fn top_votes(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TopVotesParams>,
) -> Result<Json<Vec<TopDish>>> {
    let tally = state.tally.clone();
    let limit = params.limit.unwrap_or(TOP_VOTES_LIMIT);
    let top = tokio::task::spawn_blocking(move || tally.top_votes(params.group_id, limit)).await??;

    Ok(Json(top))
}
