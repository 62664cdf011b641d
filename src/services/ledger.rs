use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use serde::Serialize;
use std::collections::HashSet;

use crate::constants::{ERR_INVALID_DISH_URI, MAX_VOTES_PER_USER};
use crate::db::{decode, encode, next_id, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{DishListingRecord, MembershipRecord, VoteOption};
use crate::services::membership::checked_email;
use crate::services::tally::recount_in;
use crate::services::load_group;

/// Result of a vote attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Vote stored; `votes_count` is the dish's recounted total
    Recorded { votes_count: u32 },
    /// The user already holds the maximum number of votes in this group
    LimitReached { limit: usize },
}

/// Result of a vote cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    /// Whether a vote row was found and deleted
    pub removed: bool,
    pub votes_count: u32,
}

/// Groups a dish was shared into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SharedDish {
    pub added: Vec<u64>,
    pub already_listed: Vec<u64>,
}

/// Owner of vote rows and dish listings
#[derive(Clone)]
pub struct VoteLedger {
    db: Db,
}

impl VoteLedger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Every dish listed in the group, flagged when this user voted for it
    pub fn list_vote_options(&self, group_id: u64, email: &str) -> Result<Vec<VoteOption>> {
        let email = checked_email(email)?;

        let read_txn = self.db.begin_read()?;
        load_group(&read_txn.open_table(tables::GROUPS)?, group_id)?;

        let voted: HashSet<String> = user_votes(&read_txn.open_table(tables::VOTES)?, group_id, &email)?
            .into_iter()
            .map(|(dish_uri, _)| dish_uri)
            .collect();

        let dishes = read_txn.open_table(tables::DISH_LISTINGS)?;
        let mut options = Vec::new();
        for entry in dishes.range((group_id, "")..(group_id + 1, ""))? {
            let (key, value) = entry?;
            let dish_uri = key.value().1.to_string();
            let record: DishListingRecord = decode(value.value())?;
            options.push(VoteOption {
                voted_by_user: voted.contains(&dish_uri),
                dish_uri,
                votes_count: record.votes_count,
            });
        }

        Ok(options)
    }

    /// Vote for a dish unless the user is at the vote cap
    ///
    /// The cap check, the insert and the recount share one write transaction,
    /// so concurrent votes by the same user cannot exceed the cap. A vote for
    /// a dish the group does not list is stored but shows in no count.
    pub fn cast_vote(&self, group_id: u64, email: &str, dish_uri: &str) -> Result<VoteOutcome> {
        let email = checked_email(email)?;
        let dish_uri = checked_dish_uri(dish_uri)?;

        let write_txn = self.db.begin_write()?;
        load_group(&write_txn.open_table(tables::GROUPS)?, group_id)?;

        let held = user_votes(&write_txn.open_table(tables::VOTES)?, group_id, &email)?.len();
        if held >= MAX_VOTES_PER_USER {
            tracing::warn!(
                "Vote by {} in group {} rejected: {}/{} votes used",
                email,
                group_id,
                held,
                MAX_VOTES_PER_USER
            );
            write_txn.abort()?;
            return Ok(VoteOutcome::LimitReached {
                limit: MAX_VOTES_PER_USER,
            });
        }

        let vote_id = next_id(&write_txn, tables::VOTE_ID_COUNTER)?;
        {
            let mut votes = write_txn.open_table(tables::VOTES)?;
            votes.insert(
                (group_id, email.as_str(), dish_uri, vote_id),
                Utc::now().timestamp(),
            )?;
        }
        let votes_count = recount_in(&write_txn, group_id, dish_uri)?;
        write_txn.commit()?;

        tracing::info!(
            "{} voted for {} in group {} ({} vote(s) now)",
            email,
            dish_uri,
            group_id,
            votes_count
        );

        Ok(VoteOutcome::Recorded { votes_count })
    }

    /// Withdraw one of the user's votes for a dish; a no-op when there is none
    pub fn cancel_vote(&self, group_id: u64, email: &str, dish_uri: &str) -> Result<CancelOutcome> {
        let email = checked_email(email)?;
        let dish_uri = checked_dish_uri(dish_uri)?;

        let write_txn = self.db.begin_write()?;
        load_group(&write_txn.open_table(tables::GROUPS)?, group_id)?;

        let removed = {
            let mut votes = write_txn.open_table(tables::VOTES)?;
            let target = user_votes(&votes, group_id, &email)?
                .into_iter()
                .find(|(uri, _)| uri == dish_uri);
            match target {
                Some((_, vote_id)) => {
                    votes.remove((group_id, email.as_str(), dish_uri, vote_id))?;
                    true
                }
                None => false,
            }
        };
        let votes_count = recount_in(&write_txn, group_id, dish_uri)?;
        write_txn.commit()?;

        if removed {
            tracing::info!(
                "{} withdrew a vote for {} in group {} ({} vote(s) now)",
                email,
                dish_uri,
                group_id,
                votes_count
            );
        } else {
            tracing::debug!(
                "No vote by {} for {} in group {} to cancel",
                email,
                dish_uri,
                group_id
            );
        }

        Ok(CancelOutcome {
            removed,
            votes_count,
        })
    }

    /// List a dish in one group with zero votes
    pub fn add_dish_to_group(&self, group_id: u64, dish_uri: &str) -> Result<()> {
        let dish_uri = checked_dish_uri(dish_uri)?;

        let write_txn = self.db.begin_write()?;
        load_group(&write_txn.open_table(tables::GROUPS)?, group_id)?;
        {
            let mut dishes = write_txn.open_table(tables::DISH_LISTINGS)?;
            if dishes.get((group_id, dish_uri))?.is_some() {
                return Err(AppError::DishAlreadyListed);
            }
            insert_listing(&mut dishes, group_id, dish_uri)?;
        }
        write_txn.commit()?;

        tracing::info!("Dish {} added to group {}", dish_uri, group_id);

        Ok(())
    }

    /// List a dish in every group where the user is owner or accepted member
    ///
    /// Groups that already list the dish are reported, not treated as errors.
    pub fn share_dish(&self, email: &str, dish_uri: &str) -> Result<SharedDish> {
        let email = checked_email(email)?;
        let dish_uri = checked_dish_uri(dish_uri)?;

        let write_txn = self.db.begin_write()?;
        let mut shared = SharedDish::default();
        {
            let member_groups = write_txn.open_table(tables::MEMBER_GROUPS)?;
            let memberships = write_txn.open_table(tables::MEMBERSHIPS)?;
            let mut dishes = write_txn.open_table(tables::DISH_LISTINGS)?;

            for entry in member_groups.range((email.as_str(), 0u64)..=(email.as_str(), u64::MAX))? {
                let (key, _) = entry?;
                let (_, group_id) = key.value();

                let active = match memberships.get((group_id, email.as_str()))? {
                    Some(bytes) => decode::<MembershipRecord>(bytes.value())?.status.is_active(),
                    None => false,
                };
                if !active {
                    continue;
                }

                if dishes.get((group_id, dish_uri))?.is_some() {
                    shared.already_listed.push(group_id);
                } else {
                    insert_listing(&mut dishes, group_id, dish_uri)?;
                    shared.added.push(group_id);
                }
            }
        }
        write_txn.commit()?;

        tracing::info!(
            "{} shared {} into {} group(s) ({} already listed it)",
            email,
            dish_uri,
            shared.added.len(),
            shared.already_listed.len()
        );

        Ok(shared)
    }
}

fn checked_dish_uri(dish_uri: &str) -> Result<&str> {
    let dish_uri = dish_uri.trim();
    if !DishListingRecord::validate_uri(dish_uri) {
        return Err(AppError::InvalidInput(ERR_INVALID_DISH_URI.to_string()));
    }
    Ok(dish_uri)
}

fn insert_listing(
    dishes: &mut redb::Table<(u64, &'static str), &'static [u8]>,
    group_id: u64,
    dish_uri: &str,
) -> Result<()> {
    let record = DishListingRecord {
        votes_count: 0,
        added_at: Utc::now().timestamp(),
    };
    dishes.insert((group_id, dish_uri), encode(&record)?.as_slice())?;
    Ok(())
}

/// The user's votes in a group as (dish_uri, vote_id) pairs
fn user_votes<T>(votes: &T, group_id: u64, email: &str) -> Result<Vec<(String, u64)>>
where
    T: ReadableTable<(u64, &'static str, &'static str, u64), i64>,
{
    let mut held = Vec::new();
    for entry in votes.range((group_id, email, "", 0u64)..)? {
        let (key, _) = entry?;
        let (g, e, dish_uri, vote_id) = key.value();
        if g != group_id || e != email {
            break;
        }
        held.push((dish_uri.to_string(), vote_id));
    }
    Ok(held)
}
