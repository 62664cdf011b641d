use serde::{Deserialize, Serialize};

use crate::constants::MAX_DISH_URI_LEN;

/// Dish listing record stored in redb, keyed by (group_id, dish_uri)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DishListingRecord {
    /// Cached number of vote rows for this (group, dish); only the recount writes it
    pub votes_count: u32,
    /// When the dish was added to the group (Unix timestamp)
    pub added_at: i64,
}

impl DishListingRecord {
    pub fn validate_uri(uri: &str) -> bool {
        !uri.is_empty()
            && uri.len() <= MAX_DISH_URI_LEN
            && !uri.chars().any(char::is_whitespace)
    }
}

/// A dish on the voting page, flagged when the requesting user voted for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteOption {
    pub dish_uri: String,
    pub votes_count: u32,
    pub voted_by_user: bool,
}

/// Entry of the top-votes ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopDish {
    pub dish_uri: String,
    pub votes_count: u32,
}
