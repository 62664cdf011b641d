use redb::{ReadableDatabase, ReadableTable, WriteTransaction};

use crate::constants::TOP_VOTES_LIMIT;
use crate::db::{decode, encode, tables, Db};
use crate::error::Result;
use crate::models::{DishListingRecord, TopDish};
use crate::services::load_group;

/// Recompute the vote count of one dish inside the caller's transaction
///
/// Counts the live vote rows for (group, dish) and overwrites the listing's
/// `votes_count` with that number. The caller must not hold the votes or
/// dish listings table open. When the dish is not listed the count is
/// returned and nothing is written.
pub(crate) fn recount_in(txn: &WriteTransaction, group_id: u64, dish_uri: &str) -> Result<u32> {
    let votes = txn.open_table(tables::VOTES)?;
    let mut count: u32 = 0;
    for entry in votes.range((group_id, "", "", 0u64)..(group_id + 1, "", "", 0u64))? {
        let (key, _) = entry?;
        let (_, _, uri, _) = key.value();
        if uri == dish_uri {
            count += 1;
        }
    }
    drop(votes);

    let mut dishes = txn.open_table(tables::DISH_LISTINGS)?;
    let listing: Option<DishListingRecord> = dishes
        .get((group_id, dish_uri))?
        .map(|bytes| decode(bytes.value()))
        .transpose()?;

    match listing {
        Some(mut record) => {
            record.votes_count = count;
            dishes.insert((group_id, dish_uri), encode(&record)?.as_slice())?;
            tracing::debug!("Recounted {} in group {}: {}", dish_uri, group_id, count);
        }
        None => {
            tracing::debug!(
                "Recount skipped for unlisted dish {} in group {}",
                dish_uri,
                group_id
            );
        }
    }

    Ok(count)
}

/// Owner of the derived per-dish vote counts
#[derive(Clone)]
pub struct Tally {
    db: Db,
}

impl Tally {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Resynchronize one dish's cached count from the vote rows
    ///
    /// Library entry point for repairing a drifted count; no route calls it,
    /// since the ledger recounts inside its own transactions. Idempotent:
    /// calling it again without intervening votes rewrites the same value.
    pub fn recount(&self, group_id: u64, dish_uri: &str) -> Result<u32> {
        let write_txn = self.db.begin_write()?;
        let count = recount_in(&write_txn, group_id, dish_uri)?;
        write_txn.commit()?;
        Ok(count)
    }

    /// Dishes with at least one vote, most voted first
    ///
    /// Ties keep dish URI order. `limit` is capped at [`TOP_VOTES_LIMIT`].
    pub fn top_votes(&self, group_id: u64, limit: usize) -> Result<Vec<TopDish>> {
        let read_txn = self.db.begin_read()?;
        load_group(&read_txn.open_table(tables::GROUPS)?, group_id)?;

        let dishes = read_txn.open_table(tables::DISH_LISTINGS)?;
        let mut ranked = Vec::new();
        for entry in dishes.range((group_id, "")..(group_id + 1, ""))? {
            let (key, value) = entry?;
            let record: DishListingRecord = decode(value.value())?;
            if record.votes_count > 0 {
                ranked.push(TopDish {
                    dish_uri: key.value().1.to_string(),
                    votes_count: record.votes_count,
                });
            }
        }

        // Stable sort keeps the key (dish URI) order among equal counts
        ranked.sort_by(|a, b| b.votes_count.cmp(&a.votes_count));
        ranked.truncate(limit.min(TOP_VOTES_LIMIT));
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::{test_db, MembershipManager, VoteLedger, VoteOutcome};

    fn setup_group(db: &Db, dishes: &[&str]) -> u64 {
        let membership = MembershipManager::new(db.clone());
        let group_id = membership
            .create_group(
                "Lunch Club",
                "desc",
                &["a@x.com".to_string(), "b@x.com".to_string()],
            )
            .unwrap();
        let ledger = VoteLedger::new(db.clone());
        for dish in dishes {
            ledger.add_dish_to_group(group_id, dish).unwrap();
        }
        group_id
    }

    fn stored_count(db: &Db, group_id: u64, dish_uri: &str) -> u32 {
        let read_txn = db.begin_read().unwrap();
        let dishes = read_txn.open_table(tables::DISH_LISTINGS).unwrap();
        let bytes = dishes.get((group_id, dish_uri)).unwrap().unwrap();
        decode::<DishListingRecord>(bytes.value()).unwrap().votes_count
    }

    #[test]
    fn test_recount_is_idempotent() {
        let (_dir, db) = test_db();
        let group_id = setup_group(&db, &["dish/42"]);
        let ledger = VoteLedger::new(db.clone());
        ledger.cast_vote(group_id, "a@x.com", "dish/42").unwrap();
        ledger.cast_vote(group_id, "b@x.com", "dish/42").unwrap();

        let tally = Tally::new(db.clone());
        assert_eq!(tally.recount(group_id, "dish/42").unwrap(), 2);
        assert_eq!(tally.recount(group_id, "dish/42").unwrap(), 2);
        assert_eq!(stored_count(&db, group_id, "dish/42"), 2);
    }

    #[test]
    fn test_recount_repairs_drifted_count() {
        let (_dir, db) = test_db();
        let group_id = setup_group(&db, &["dish/42"]);
        VoteLedger::new(db.clone())
            .cast_vote(group_id, "a@x.com", "dish/42")
            .unwrap();

        // Corrupt the cache directly, then let the recount restore it
        {
            let write_txn = db.begin_write().unwrap();
            {
                let mut dishes = write_txn.open_table(tables::DISH_LISTINGS).unwrap();
                let record = DishListingRecord {
                    votes_count: 9,
                    added_at: 0,
                };
                dishes
                    .insert((group_id, "dish/42"), encode(&record).unwrap().as_slice())
                    .unwrap();
            }
            write_txn.commit().unwrap();
        }

        assert_eq!(Tally::new(db.clone()).recount(group_id, "dish/42").unwrap(), 1);
        assert_eq!(stored_count(&db, group_id, "dish/42"), 1);
    }

    #[test]
    fn test_recount_unlisted_dish_writes_nothing() {
        let (_dir, db) = test_db();
        let group_id = setup_group(&db, &[]);
        assert_eq!(Tally::new(db.clone()).recount(group_id, "dish/none").unwrap(), 0);

        let read_txn = db.begin_read().unwrap();
        let dishes = read_txn.open_table(tables::DISH_LISTINGS).unwrap();
        assert!(dishes.get((group_id, "dish/none")).unwrap().is_none());
    }

    #[test]
    fn test_top_votes_ordering_and_filtering() {
        let (_dir, db) = test_db();
        let dishes = ["dish/a", "dish/b", "dish/c", "dish/d", "dish/e", "dish/f", "dish/g"];
        let group_id = setup_group(&db, &dishes);

        let ledger = VoteLedger::new(db.clone());

        // dish/c: 3 votes, dish/e: 2, dish/a, dish/b, dish/f, dish/g: 1, dish/d: 0
        let plan: [(&str, [&str; 3]); 3] = [
            ("u1@x.com", ["dish/c", "dish/e", "dish/a"]),
            ("u2@x.com", ["dish/c", "dish/e", "dish/b"]),
            ("u3@x.com", ["dish/c", "dish/f", "dish/g"]),
        ];
        for (user, votes) in plan {
            for dish in votes {
                let outcome = ledger.cast_vote(group_id, user, dish).unwrap();
                assert!(matches!(outcome, VoteOutcome::Recorded { .. }));
            }
        }

        let top = Tally::new(db.clone()).top_votes(group_id, 10).unwrap();
        assert_eq!(top.len(), TOP_VOTES_LIMIT);
        assert_eq!(top[0].dish_uri, "dish/c");
        assert_eq!(top[0].votes_count, 3);
        assert_eq!(top[1].dish_uri, "dish/e");
        assert_eq!(top[1].votes_count, 2);
        // Ties fall back to URI order
        assert_eq!(top[2].dish_uri, "dish/a");
        assert_eq!(top[3].dish_uri, "dish/b");
        assert_eq!(top[4].dish_uri, "dish/f");

        assert!(top.iter().all(|d| d.votes_count > 0));
        assert!(top.windows(2).all(|w| w[0].votes_count >= w[1].votes_count));
    }

    #[test]
    fn test_top_votes_respects_smaller_limit() {
        let (_dir, db) = test_db();
        let group_id = setup_group(&db, &["dish/a", "dish/b"]);
        let ledger = VoteLedger::new(db.clone());
        ledger.cast_vote(group_id, "a@x.com", "dish/a").unwrap();
        ledger.cast_vote(group_id, "a@x.com", "dish/b").unwrap();

        let top = Tally::new(db.clone()).top_votes(group_id, 1).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_top_votes_empty_when_nobody_voted() {
        let (_dir, db) = test_db();
        let group_id = setup_group(&db, &["dish/a"]);
        assert!(Tally::new(db).top_votes(group_id, 5).unwrap().is_empty());
    }

    #[test]
    fn test_top_votes_unknown_group() {
        let (_dir, db) = test_db();
        assert!(matches!(
            Tally::new(db).top_votes(404, 5),
            Err(AppError::GroupNotFound)
        ));
    }
}
