use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use std::collections::HashSet;

use crate::constants::{
    ERR_DUPLICATE_MEMBER, ERR_EMPTY_MEMBER_LIST, ERR_INVALID_DESCRIPTION, ERR_INVALID_EMAIL,
    ERR_INVALID_GROUP_NAME, MAX_GROUP_MEMBERS,
};
use crate::db::{decode, encode, next_id, tables, Db};
use crate::error::{AppError, Result};
use crate::models::{
    normalize_email, validate_email, GroupMember, GroupRecord, MembershipRecord,
    MembershipStatus, ProfileRecord, UserGroup,
};
use crate::services::{load_group, load_membership};

/// Owner of groups and membership rows
#[derive(Clone)]
pub struct MembershipManager {
    db: Db,
}

impl MembershipManager {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create a group and invite everyone on the list
    ///
    /// The first email becomes the owner; every other email starts pending.
    /// The group row and all membership rows are written in one transaction.
    pub fn create_group(&self, name: &str, description: &str, emails: &[String]) -> Result<u64> {
        let name = name.trim();
        if !GroupRecord::validate_name(name) {
            return Err(AppError::InvalidInput(ERR_INVALID_GROUP_NAME.to_string()));
        }

        let description = description.trim();
        if !GroupRecord::validate_description(description) {
            return Err(AppError::InvalidInput(ERR_INVALID_DESCRIPTION.to_string()));
        }

        let emails = normalize_invitees(emails)?;
        let now = Utc::now().timestamp();

        let write_txn = self.db.begin_write()?;
        let group_id = next_id(&write_txn, tables::GROUP_ID_COUNTER)?;
        {
            let mut groups = write_txn.open_table(tables::GROUPS)?;
            let record = GroupRecord {
                name: name.to_string(),
                description: description.to_string(),
                created_at: now,
            };
            groups.insert(group_id, encode(&record)?.as_slice())?;

            let mut memberships = write_txn.open_table(tables::MEMBERSHIPS)?;
            let mut member_groups = write_txn.open_table(tables::MEMBER_GROUPS)?;
            for (position, email) in emails.iter().enumerate() {
                let status = if position == 0 {
                    MembershipStatus::Owner
                } else {
                    MembershipStatus::Pending
                };
                let membership = MembershipRecord {
                    status,
                    joined_at: now,
                };
                memberships.insert((group_id, email.as_str()), encode(&membership)?.as_slice())?;
                member_groups.insert((email.as_str(), group_id), ())?;
            }
        }
        write_txn.commit()?;

        tracing::info!(
            "Group {} created by {} with {} invitee(s)",
            group_id,
            emails[0],
            emails.len() - 1
        );

        Ok(group_id)
    }

    /// Every group the user owns, joined, or is invited to, by group id
    pub fn list_user_groups(&self, email: &str) -> Result<Vec<UserGroup>> {
        let email = checked_email(email)?;

        let read_txn = self.db.begin_read()?;
        let member_groups = read_txn.open_table(tables::MEMBER_GROUPS)?;
        let memberships = read_txn.open_table(tables::MEMBERSHIPS)?;
        let groups = read_txn.open_table(tables::GROUPS)?;

        let mut result = Vec::new();
        for entry in member_groups.range((email.as_str(), 0u64)..=(email.as_str(), u64::MAX))? {
            let (key, _) = entry?;
            let (_, group_id) = key.value();

            let Some(membership) = load_membership(&memberships, group_id, &email)? else {
                tracing::warn!("Stale group index entry for {} in group {}", email, group_id);
                continue;
            };
            let group = load_group(&groups, group_id)?;

            result.push(UserGroup {
                group_name: group.name,
                description: group.description,
                group_id,
                status: membership.status,
            });
        }

        Ok(result)
    }

    /// Accept or decline a pending invitation
    ///
    /// Accepting moves the row to `Accepted`; declining deletes it. Fails with
    /// `NotPendingMember` when there is no pending row for (group, email).
    pub fn respond_to_invitation(&self, group_id: u64, email: &str, accept: bool) -> Result<()> {
        let email = checked_email(email)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut memberships = write_txn.open_table(tables::MEMBERSHIPS)?;
            let mut record = match load_membership(&memberships, group_id, &email)? {
                Some(record) if record.status == MembershipStatus::Pending => record,
                _ => {
                    tracing::warn!(
                        "Invitation response from {} who is not pending in group {}",
                        email,
                        group_id
                    );
                    return Err(AppError::NotPendingMember);
                }
            };

            if accept {
                record.status = MembershipStatus::Accepted;
                memberships.insert((group_id, email.as_str()), encode(&record)?.as_slice())?;
            } else {
                memberships.remove((group_id, email.as_str()))?;
                let mut member_groups = write_txn.open_table(tables::MEMBER_GROUPS)?;
                member_groups.remove((email.as_str(), group_id))?;
            }
        }
        write_txn.commit()?;

        tracing::info!(
            "{} {} the invitation to group {}",
            email,
            if accept { "accepted" } else { "declined" },
            group_id
        );

        Ok(())
    }

    /// Remove a non-owner member from a group
    ///
    /// Only the group owner or the member themself may do this. The member's
    /// votes are left in place.
    pub fn remove_member(&self, group_id: u64, email: &str, caller_email: &str) -> Result<()> {
        let email = checked_email(email)?;
        let caller_email = checked_email(caller_email)?;

        let write_txn = self.db.begin_write()?;
        {
            load_group(&write_txn.open_table(tables::GROUPS)?, group_id)?;

            let mut memberships = write_txn.open_table(tables::MEMBERSHIPS)?;
            let target = load_membership(&memberships, group_id, &email)?
                .ok_or(AppError::MemberNotFound)?;

            if target.status == MembershipStatus::Owner {
                tracing::warn!("Refused to remove owner {} from group {}", email, group_id);
                return Err(AppError::OwnerRemoval);
            }

            if caller_email != email {
                let caller_is_owner = load_membership(&memberships, group_id, &caller_email)?
                    .is_some_and(|r| r.status == MembershipStatus::Owner);
                if !caller_is_owner {
                    tracing::warn!(
                        "{} tried to remove {} from group {} without owning it",
                        caller_email,
                        email,
                        group_id
                    );
                    return Err(AppError::RemovalForbidden);
                }
            }

            memberships.remove((group_id, email.as_str()))?;
            let mut member_groups = write_txn.open_table(tables::MEMBER_GROUPS)?;
            member_groups.remove((email.as_str(), group_id))?;
        }
        write_txn.commit()?;

        tracing::info!("{} removed from group {} by {}", email, group_id, caller_email);

        Ok(())
    }

    /// Delete a group with all its memberships, votes and dish listings
    ///
    /// Only the owner may delete a group.
    pub fn delete_group(&self, group_id: u64, caller_email: &str) -> Result<()> {
        let caller_email = checked_email(caller_email)?;

        let write_txn = self.db.begin_write()?;
        let (member_count, vote_count, dish_count) = {
            let mut groups = write_txn.open_table(tables::GROUPS)?;
            load_group(&groups, group_id)?;

            // 1. Only the owner may delete
            let mut memberships = write_txn.open_table(tables::MEMBERSHIPS)?;
            let caller_is_owner = load_membership(&memberships, group_id, &caller_email)?
                .is_some_and(|r| r.status == MembershipStatus::Owner);
            if !caller_is_owner {
                tracing::warn!(
                    "{} tried to delete group {} without owning it",
                    caller_email,
                    group_id
                );
                return Err(AppError::NotGroupOwner);
            }

            // 2. Memberships and the per-user index
            let members: Vec<String> = memberships
                .range((group_id, "")..(group_id + 1, ""))?
                .map(|entry| entry.map(|(key, _)| key.value().1.to_string()))
                .collect::<std::result::Result<_, redb::StorageError>>()?;

            let mut member_groups = write_txn.open_table(tables::MEMBER_GROUPS)?;
            for email in &members {
                memberships.remove((group_id, email.as_str()))?;
                member_groups.remove((email.as_str(), group_id))?;
            }

            // 3. Votes
            let mut votes = write_txn.open_table(tables::VOTES)?;
            let vote_keys: Vec<(String, String, u64)> = votes
                .range((group_id, "", "", 0u64)..(group_id + 1, "", "", 0u64))?
                .map(|entry| {
                    entry.map(|(key, _)| {
                        let (_, email, dish_uri, vote_id) = key.value();
                        (email.to_string(), dish_uri.to_string(), vote_id)
                    })
                })
                .collect::<std::result::Result<_, redb::StorageError>>()?;
            for (email, dish_uri, vote_id) in &vote_keys {
                votes.remove((group_id, email.as_str(), dish_uri.as_str(), *vote_id))?;
            }

            // 4. Dish listings
            let mut dishes = write_txn.open_table(tables::DISH_LISTINGS)?;
            let dish_uris: Vec<String> = dishes
                .range((group_id, "")..(group_id + 1, ""))?
                .map(|entry| entry.map(|(key, _)| key.value().1.to_string()))
                .collect::<std::result::Result<_, redb::StorageError>>()?;
            for dish_uri in &dish_uris {
                dishes.remove((group_id, dish_uri.as_str()))?;
            }

            // 5. The group itself
            groups.remove(group_id)?;

            (members.len(), vote_keys.len(), dish_uris.len())
        };
        write_txn.commit()?;

        tracing::info!(
            "Group {} deleted by {}: {} member(s), {} vote(s), {} dish(es) removed",
            group_id,
            caller_email,
            member_count,
            vote_count,
            dish_count
        );

        Ok(())
    }

    /// Members of a group with their profile names, ordered by email
    pub fn list_group_members(&self, group_id: u64) -> Result<Vec<GroupMember>> {
        let read_txn = self.db.begin_read()?;
        load_group(&read_txn.open_table(tables::GROUPS)?, group_id)?;

        let memberships = read_txn.open_table(tables::MEMBERSHIPS)?;
        let profiles = read_txn.open_table(tables::USER_PROFILES)?;

        let mut members = Vec::new();
        for entry in memberships.range((group_id, "")..(group_id + 1, ""))? {
            let (key, value) = entry?;
            let email = key.value().1.to_string();
            let record: MembershipRecord = decode(value.value())?;

            let profile: Option<ProfileRecord> = profiles
                .get(email.as_str())?
                .map(|bytes| decode(bytes.value()))
                .transpose()?;
            let (first_name, last_name) = match profile {
                Some(p) => (Some(p.first_name), Some(p.last_name)),
                None => (None, None),
            };

            members.push(GroupMember {
                email,
                first_name,
                last_name,
                status: record.status,
            });
        }

        Ok(members)
    }
}

/// Normalize and validate one email
pub(crate) fn checked_email(email: &str) -> Result<String> {
    let email = normalize_email(email);
    if !validate_email(&email) {
        return Err(AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()));
    }
    Ok(email)
}

/// Normalize the invite list, keeping its order (the first entry is the owner)
fn normalize_invitees(emails: &[String]) -> Result<Vec<String>> {
    if emails.is_empty() {
        return Err(AppError::InvalidInput(ERR_EMPTY_MEMBER_LIST.to_string()));
    }
    if emails.len() > MAX_GROUP_MEMBERS {
        return Err(AppError::InvalidInput(format!(
            "A group can have at most {} members",
            MAX_GROUP_MEMBERS
        )));
    }

    let mut seen = HashSet::with_capacity(emails.len());
    let mut normalized = Vec::with_capacity(emails.len());
    for email in emails {
        let email = checked_email(email)?;
        if !seen.insert(email.clone()) {
            return Err(AppError::InvalidInput(ERR_DUPLICATE_MEMBER.to_string()));
        }
        normalized.push(email);
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{test_db, Profiles, VoteLedger};

    fn emails(list: &[&str]) -> Vec<String> {
        list.iter().map(|e| e.to_string()).collect()
    }

    fn status_of(manager: &MembershipManager, email: &str, group_id: u64) -> Option<MembershipStatus> {
        manager
            .list_user_groups(email)
            .unwrap()
            .into_iter()
            .find(|g| g.group_id == group_id)
            .map(|g| g.status)
    }

    #[test]
    fn test_create_group_assigns_owner_and_pending() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "desc", &emails(&["a@x.com", "b@x.com", "c@x.com"]))
            .unwrap();

        assert_eq!(status_of(&manager, "a@x.com", group_id), Some(MembershipStatus::Owner));
        assert_eq!(status_of(&manager, "b@x.com", group_id), Some(MembershipStatus::Pending));
        assert_eq!(status_of(&manager, "c@x.com", group_id), Some(MembershipStatus::Pending));

        let members = manager.list_group_members(group_id).unwrap();
        let owners = members
            .iter()
            .filter(|m| m.status == MembershipStatus::Owner)
            .count();
        assert_eq!(owners, 1);
        assert_eq!(members.len(), 3);
    }

    #[test]
    fn test_create_group_single_member_is_owner() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Solo", "", &emails(&["solo@x.com"]))
            .unwrap();
        let members = manager.list_group_members(group_id).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].status, MembershipStatus::Owner);
    }

    #[test]
    fn test_create_group_ids_are_distinct() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let first = manager.create_group("One", "", &emails(&["a@x.com"])).unwrap();
        let second = manager.create_group("Two", "", &emails(&["a@x.com"])).unwrap();
        assert_ne!(first, second);

        let groups = manager.list_user_groups("a@x.com").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_name, "One");
        assert_eq!(groups[1].group_name, "Two");
    }

    #[test]
    fn test_create_group_validation() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);

        assert!(matches!(
            manager.create_group("Lunch", "", &[]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            manager.create_group("   ", "", &emails(&["a@x.com"])),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            manager.create_group("Lunch", "", &emails(&["not-an-email"])),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            manager.create_group("Lunch", "", &emails(&["a@x.com", "A@X.com "])),
            Err(AppError::InvalidInput(_))
        ));

        let too_many: Vec<String> = (0..=MAX_GROUP_MEMBERS)
            .map(|i| format!("user{}@x.com", i))
            .collect();
        assert!(matches!(
            manager.create_group("Lunch", "", &too_many),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_failed_creation_leaves_nothing_behind() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        // Second email is invalid, so the owner row must not be written either
        assert!(manager
            .create_group("Lunch", "", &emails(&["a@x.com", "bad"]))
            .is_err());
        assert!(manager.list_user_groups("a@x.com").unwrap().is_empty());
    }

    #[test]
    fn test_accept_invitation() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["a@x.com", "b@x.com"]))
            .unwrap();

        manager.respond_to_invitation(group_id, "b@x.com", true).unwrap();
        assert_eq!(status_of(&manager, "b@x.com", group_id), Some(MembershipStatus::Accepted));

        // A second answer is rejected: the row is no longer pending
        assert!(matches!(
            manager.respond_to_invitation(group_id, "b@x.com", false),
            Err(AppError::NotPendingMember)
        ));
        assert_eq!(status_of(&manager, "b@x.com", group_id), Some(MembershipStatus::Accepted));
    }

    #[test]
    fn test_decline_invitation_removes_row() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "desc", &emails(&["a@x.com", "b@x.com", "c@x.com"]))
            .unwrap();

        manager.respond_to_invitation(group_id, "b@x.com", false).unwrap();

        assert!(manager.list_user_groups("b@x.com").unwrap().is_empty());
        let members = manager.list_group_members(group_id).unwrap();
        assert!(members.iter().all(|m| m.email != "b@x.com"));
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn test_respond_without_invitation() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["a@x.com"]))
            .unwrap();

        assert!(matches!(
            manager.respond_to_invitation(group_id, "stranger@x.com", true),
            Err(AppError::NotPendingMember)
        ));
        // The owner cannot decline their own group away
        assert!(matches!(
            manager.respond_to_invitation(group_id, "a@x.com", false),
            Err(AppError::NotPendingMember)
        ));
        assert_eq!(status_of(&manager, "a@x.com", group_id), Some(MembershipStatus::Owner));
    }

    #[test]
    fn test_remove_owner_always_fails() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["a@x.com", "b@x.com"]))
            .unwrap();

        for caller in ["a@x.com", "b@x.com"] {
            assert!(matches!(
                manager.remove_member(group_id, "a@x.com", caller),
                Err(AppError::OwnerRemoval)
            ));
        }
        assert_eq!(status_of(&manager, "a@x.com", group_id), Some(MembershipStatus::Owner));
    }

    #[test]
    fn test_remove_member_authorization() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["a@x.com", "b@x.com", "c@x.com"]))
            .unwrap();

        // Another member cannot remove b
        assert!(matches!(
            manager.remove_member(group_id, "b@x.com", "c@x.com"),
            Err(AppError::RemovalForbidden)
        ));
        assert!(status_of(&manager, "b@x.com", group_id).is_some());

        // b can leave on their own
        manager.remove_member(group_id, "b@x.com", "b@x.com").unwrap();
        assert!(status_of(&manager, "b@x.com", group_id).is_none());

        // The owner can remove c
        manager.remove_member(group_id, "c@x.com", "a@x.com").unwrap();
        assert!(status_of(&manager, "c@x.com", group_id).is_none());

        assert!(matches!(
            manager.remove_member(group_id, "c@x.com", "a@x.com"),
            Err(AppError::MemberNotFound)
        ));
        assert!(matches!(
            manager.remove_member(999, "c@x.com", "a@x.com"),
            Err(AppError::GroupNotFound)
        ));
    }

    #[test]
    fn test_delete_group_requires_owner() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["a@x.com", "b@x.com"]))
            .unwrap();

        assert!(matches!(
            manager.delete_group(group_id, "b@x.com"),
            Err(AppError::NotGroupOwner)
        ));
        assert!(manager.list_group_members(group_id).is_ok());

        assert!(matches!(
            manager.delete_group(404, "a@x.com"),
            Err(AppError::GroupNotFound)
        ));
    }

    #[test]
    fn test_delete_group_cascades() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db.clone());
        let ledger = VoteLedger::new(db.clone());
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["a@x.com", "b@x.com"]))
            .unwrap();
        let other_id = manager
            .create_group("Dinner Club", "", &emails(&["a@x.com"]))
            .unwrap();
        ledger.add_dish_to_group(group_id, "dish/42").unwrap();
        ledger.add_dish_to_group(other_id, "dish/42").unwrap();
        ledger.cast_vote(group_id, "a@x.com", "dish/42").unwrap();
        ledger.cast_vote(other_id, "a@x.com", "dish/42").unwrap();

        manager.delete_group(group_id, "a@x.com").unwrap();

        assert!(matches!(
            manager.list_group_members(group_id),
            Err(AppError::GroupNotFound)
        ));
        assert!(manager.list_user_groups("b@x.com").unwrap().is_empty());
        let remaining = manager.list_user_groups("a@x.com").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].group_id, other_id);

        // Only the deleted group's votes and dishes are gone
        let read_txn = db.begin_read().unwrap();
        let votes = read_txn.open_table(tables::VOTES).unwrap();
        let left: Vec<u64> = votes
            .iter()
            .unwrap()
            .map(|entry| entry.unwrap().0.value().0)
            .collect();
        assert_eq!(left, vec![other_id]);
        let dishes = read_txn.open_table(tables::DISH_LISTINGS).unwrap();
        assert!(dishes.get((group_id, "dish/42")).unwrap().is_none());
        assert!(dishes.get((other_id, "dish/42")).unwrap().is_some());
    }

    #[test]
    fn test_list_group_members_with_profiles() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db.clone());
        Profiles::new(db)
            .save_profile("b@x.com", "Bea", "Bauer")
            .unwrap();
        let group_id = manager
            .create_group("Lunch Club", "", &emails(&["b@x.com", "a@x.com"]))
            .unwrap();

        let members = manager.list_group_members(group_id).unwrap();
        assert_eq!(
            members,
            vec![
                GroupMember {
                    email: "a@x.com".to_string(),
                    first_name: None,
                    last_name: None,
                    status: MembershipStatus::Pending,
                },
                GroupMember {
                    email: "b@x.com".to_string(),
                    first_name: Some("Bea".to_string()),
                    last_name: Some("Bauer".to_string()),
                    status: MembershipStatus::Owner,
                },
            ]
        );
    }

    #[test]
    fn test_list_user_groups_rejects_bad_email() {
        let (_dir, db) = test_db();
        let manager = MembershipManager::new(db);
        assert!(matches!(
            manager.list_user_groups("nobody"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(manager.list_user_groups("nobody@x.com").unwrap().is_empty());
    }
}
