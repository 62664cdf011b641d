pub mod dish;
pub mod group;
pub mod membership;
pub mod profile;

pub use dish::{DishListingRecord, TopDish, VoteOption};
pub use group::{GroupRecord, UserGroup};
pub use membership::{
    normalize_email, validate_email, GroupMember, MembershipRecord, MembershipStatus,
};
pub use profile::ProfileRecord;
