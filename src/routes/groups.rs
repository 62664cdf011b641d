use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{GroupMember, UserGroup};
use crate::routes::MessageResponse;
use crate::routes::extract::{AppJson, AppQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    pub group_name: String,
    #[serde(default)]
    pub group_detail: String,
    pub group_members: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateGroupResponse {
    pub success: bool,
    pub group_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupsParams {
    pub user_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteGroupRequest {
    pub group_id: u64,
    pub caller_email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    pub group_id: u64,
    pub email: String,
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembersParams {
    pub group_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveMemberRequest {
    pub group_id: u64,
    pub email: String,
    pub caller_email: String,
}

/// Create a group
///
/// The first entry of `groupMembers` becomes the owner; the others are
/// invited and stay pending until they answer.
///
/// POST /api/groups
pub async fn create_group(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateGroupRequest>,
) -> Result<Json<CreateGroupResponse>> {
    let membership = state.membership.clone();
    let group_id = tokio::task::spawn_blocking(move || {
        membership.create_group(
            &payload.group_name,
            &payload.group_detail,
            &payload.group_members,
        )
    })
    .await??;

    Ok(Json(CreateGroupResponse {
        success: true,
        group_id,
    }))
}

/// Groups the user owns, joined or is invited to
///
/// GET /api/groups?userEmail=<email>
pub async fn list_user_groups(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<UserGroupsParams>,
) -> Result<Json<Vec<UserGroup>>> {
    let membership = state.membership.clone();
    let groups =
        tokio::task::spawn_blocking(move || membership.list_user_groups(&params.user_email))
            .await??;

    Ok(Json(groups))
}

/// Delete a group and everything in it (owner only)
///
/// DELETE /api/groups
pub async fn delete_group(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteGroupRequest>,
) -> Result<Json<MessageResponse>> {
    let membership = state.membership.clone();
    tokio::task::spawn_blocking(move || {
        membership.delete_group(payload.group_id, &payload.caller_email)
    })
    .await??;

    Ok(Json(MessageResponse::ok("Group deleted successfully")))
}

/// Accept or decline a pending invitation
///
/// POST /api/groups/invitation
pub async fn respond_to_invitation(
    State(state): State<AppState>,
    AppJson(payload): AppJson<InvitationRequest>,
) -> Result<Json<MessageResponse>> {
    let membership = state.membership.clone();
    let accept = payload.accept;
    tokio::task::spawn_blocking(move || {
        membership.respond_to_invitation(payload.group_id, &payload.email, payload.accept)
    })
    .await??;

    let message = if accept {
        "Group invitation accepted successfully"
    } else {
        "Group invitation declined successfully"
    };
    Ok(Json(MessageResponse::ok(message)))
}

/// Members of a group with their display names
///
/// GET /api/groups/members?groupId=<id>
pub async fn list_group_members(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<GroupMembersParams>,
) -> Result<Json<Vec<GroupMember>>> {
    let membership = state.membership.clone();
    let members =
        tokio::task::spawn_blocking(move || membership.list_group_members(params.group_id))
            .await??;

    Ok(Json(members))
}

/// Remove a member (the owner removing someone, or a member leaving)
///
/// DELETE /api/groups/members
pub async fn remove_member(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RemoveMemberRequest>,
) -> Result<Json<MessageResponse>> {
    let membership = state.membership.clone();
    tokio::task::spawn_blocking(move || {
        membership.remove_member(payload.group_id, &payload.email, &payload.caller_email)
    })
    .await??;

    Ok(Json(MessageResponse::ok("Member removed successfully")))
}
