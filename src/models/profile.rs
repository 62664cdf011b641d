use serde::{Deserialize, Serialize};

use crate::constants::MAX_PERSON_NAME_LEN;

/// User profile record stored in redb, keyed by email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub first_name: String,
    pub last_name: String,
    /// When the profile was last saved (Unix timestamp)
    pub updated_at: i64,
}

impl ProfileRecord {
    /// Validate a trimmed first or last name
    pub fn validate_name(name: &str) -> bool {
        !name.is_empty() && name.chars().count() <= MAX_PERSON_NAME_LEN
    }
}
