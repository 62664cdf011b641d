use chrono::Utc;

use crate::constants::ERR_INVALID_PERSON_NAME;
use crate::db::{encode, tables, Db};
use crate::error::{AppError, Result};
use crate::models::ProfileRecord;
use crate::services::membership::checked_email;

/// Display names shown next to group members
#[derive(Clone)]
pub struct Profiles {
    db: Db,
}

impl Profiles {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Create or replace the profile for an email
    pub fn save_profile(&self, email: &str, first_name: &str, last_name: &str) -> Result<()> {
        let email = checked_email(email)?;
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if !ProfileRecord::validate_name(first_name) || !ProfileRecord::validate_name(last_name) {
            return Err(AppError::InvalidInput(ERR_INVALID_PERSON_NAME.to_string()));
        }

        let record = ProfileRecord {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            updated_at: Utc::now().timestamp(),
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut profiles = write_txn.open_table(tables::USER_PROFILES)?;
            profiles.insert(email.as_str(), encode(&record)?.as_slice())?;
        }
        write_txn.commit()?;

        tracing::info!("Profile saved for {}", email);

        Ok(())
    }
}
