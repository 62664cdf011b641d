use serde::{Deserialize, Serialize};

use crate::constants::{MAX_DESCRIPTION_LEN, MAX_GROUP_NAME_LEN};
use crate::models::MembershipStatus;

/// Group record stored in redb, keyed by group_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub description: String,
    /// When the group was created (Unix timestamp)
    pub created_at: i64,
}

impl GroupRecord {
    /// Validate a trimmed group name
    pub fn validate_name(name: &str) -> bool {
        !name.is_empty() && name.chars().count() <= MAX_GROUP_NAME_LEN
    }

    pub fn validate_description(description: &str) -> bool {
        description.chars().count() <= MAX_DESCRIPTION_LEN
    }
}

/// One group a user belongs to or is invited to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserGroup {
    pub group_name: String,
    pub description: String,
    pub group_id: u64,
    pub status: MembershipStatus,
}
