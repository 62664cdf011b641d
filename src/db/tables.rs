use redb::TableDefinition;

/// Groups table: group_id -> GroupRecord (serialized)
pub const GROUPS: TableDefinition<u64, &[u8]> = TableDefinition::new("groups");

/// Memberships table: (group_id, email) -> MembershipRecord (serialized)
pub const MEMBERSHIPS: TableDefinition<(u64, &str), &[u8]> = TableDefinition::new("memberships");

/// Member groups index: (email, group_id) -> ()
/// Lets a user's groups be listed without scanning every membership
pub const MEMBER_GROUPS: TableDefinition<(&str, u64), ()> = TableDefinition::new("member_groups");

/// Votes table: (group_id, email, dish_uri, vote_id) -> cast_at (Unix timestamp)
/// One row per vote; a user may hold several rows for the same dish
pub const VOTES: TableDefinition<(u64, &str, &str, u64), i64> = TableDefinition::new("votes");

/// Dish listings table: (group_id, dish_uri) -> DishListingRecord (serialized)
pub const DISH_LISTINGS: TableDefinition<(u64, &str), &[u8]> =
    TableDefinition::new("dish_listings");

/// User profiles table: email -> ProfileRecord (serialized)
pub const USER_PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("user_profiles");

/// Monotonic id counters: counter name -> last issued id
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Counter key for group ids
pub const GROUP_ID_COUNTER: &str = "group_id";

/// Counter key for vote ids
pub const VOTE_ID_COUNTER: &str = "vote_id";
