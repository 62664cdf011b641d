pub mod dishes;
pub mod extract;
pub mod groups;
pub mod health;
pub mod profile;
pub mod votes;

pub use dishes::{add_dish, share_dish};
pub use groups::{
    create_group, delete_group, list_group_members, list_user_groups, remove_member,
    respond_to_invitation,
};
pub use health::health_check;
pub use profile::save_profile;
pub use votes::{cancel_vote, cast_vote, list_vote_options, top_votes};

use axum::{
    routing::{get, post, put},
    Router,
};
use serde::Serialize;

use crate::AppState;

/// Plain acknowledgement body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// All API routes, before state and middleware are attached
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/groups",
            post(create_group).get(list_user_groups).delete(delete_group),
        )
        .route("/api/groups/invitation", post(respond_to_invitation))
        .route(
            "/api/groups/members",
            get(list_group_members).delete(remove_member),
        )
        .route(
            "/api/votes",
            get(list_vote_options).post(cast_vote).delete(cancel_vote),
        )
        .route("/api/votes/top", get(top_votes))
        .route("/api/dishes", post(add_dish))
        .route("/api/dishes/share", post(share_dish))
        .route("/api/profile", put(save_profile))
}
