//! Group membership and voting state machine.
//!
//! Each component owns a clone of the database handle and runs every
//! mutation inside a single redb write transaction. redb admits one writer
//! at a time, so a count check and the write that depends on it can never
//! interleave with another request.

pub mod ledger;
pub mod membership;
pub mod profiles;
pub mod tally;

pub use ledger::{CancelOutcome, SharedDish, VoteLedger, VoteOutcome};
pub use membership::MembershipManager;
pub use profiles::Profiles;
pub use tally::Tally;

use redb::ReadableTable;

use crate::db::decode;
use crate::error::{AppError, Result};
use crate::models::{GroupRecord, MembershipRecord};

/// Load a group or fail with `GroupNotFound`
pub(crate) fn load_group<T>(groups: &T, group_id: u64) -> Result<GroupRecord>
where
    T: ReadableTable<u64, &'static [u8]>,
{
    match groups.get(group_id)? {
        Some(bytes) => decode(bytes.value()),
        None => Err(AppError::GroupNotFound),
    }
}

pub(crate) fn load_membership<T>(
    memberships: &T,
    group_id: u64,
    email: &str,
) -> Result<Option<MembershipRecord>>
where
    T: ReadableTable<(u64, &'static str), &'static [u8]>,
{
    memberships
        .get((group_id, email))?
        .map(|bytes| decode(bytes.value()))
        .transpose()
}

#[cfg(test)]
pub(crate) fn test_db() -> (tempfile::TempDir, crate::db::Db) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let db = crate::db::open_database(temp_dir.path().join("test.db")).unwrap();
    (temp_dir, db)
}
