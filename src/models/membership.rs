use serde::{Deserialize, Serialize};

/// Membership status of a user in a group
///
/// Serialized in JSON as `"pending"`, `"accepted"` or `"owner"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Invited, has not answered yet
    Pending,
    /// Invitation accepted
    Accepted,
    /// Group creator; exactly one per group
    Owner,
}

impl MembershipStatus {
    /// Owners and accepted members take part in the group; pending invitees do not yet
    pub fn is_active(self) -> bool {
        matches!(self, MembershipStatus::Owner | MembershipStatus::Accepted)
    }
}

/// Membership record stored in redb, keyed by (group_id, email)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub status: MembershipStatus,
    /// When the membership row was created (Unix timestamp)
    pub joined_at: i64,
}

/// A group member as shown on the group page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: MembershipStatus,
}

/// Canonical form of an email used for every key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an already normalized email address
///
/// Deliberately loose: one `@` with something on both sides, no whitespace.
pub fn validate_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
