/// Maximum number of votes a user may hold at once in a single group
pub const MAX_VOTES_PER_USER: usize = 3;

/// Number of dishes returned by the top-votes projection
/// Requests may ask for fewer, never more
pub const TOP_VOTES_LIMIT: usize = 5;

/// Maximum number of emails accepted when creating a group (owner included)
pub const MAX_GROUP_MEMBERS: usize = 50;

/// Maximum group name length in characters
pub const MAX_GROUP_NAME_LEN: usize = 100;

/// Maximum group description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Maximum length of a profile first or last name
pub const MAX_PERSON_NAME_LEN: usize = 100;

/// Maximum dish URI length
pub const MAX_DISH_URI_LEN: usize = 512;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for a malformed email address
pub const ERR_INVALID_EMAIL: &str = "Invalid email address";

/// Error message for group creation without any invitee
pub const ERR_EMPTY_MEMBER_LIST: &str = "A group needs at least one member email";

/// Error message for a repeated email in the invite list
pub const ERR_DUPLICATE_MEMBER: &str = "Each email may appear only once in a group";

/// Error message for a missing or too long group name
pub const ERR_INVALID_GROUP_NAME: &str = "Group name must be 1-100 characters";

/// Error message for a too long group description
pub const ERR_INVALID_DESCRIPTION: &str = "Group description must be at most 1000 characters";

/// Error message for a missing or too long dish URI
pub const ERR_INVALID_DISH_URI: &str = "Dish URI must be 1-512 characters without whitespace";

/// Error message for a missing or too long profile name
pub const ERR_INVALID_PERSON_NAME: &str = "First and last name must be 1-100 characters";
pub const ERR_MALFORMED_BODY: &str = "Request body is missing a field or has the wrong type";
pub const ERR_MALFORMED_QUERY: &str = "Query parameters are missing or have the wrong type";
