pub mod tables;

use redb::{Database, Error as RedbError, ReadableTable, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers and services)
pub type Db = Arc<Database>;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            tracing::error!("Failed to create database directory: {}", e);
            RedbError::Io(e)
        })?;
    }

    let db = Database::create(path)?;

    // Initialize tables on first run
    let write_txn = db.begin_write()?;
    {
        // Create tables if they don't exist by opening them
        let _ = write_txn.open_table(tables::GROUPS)?;
        let _ = write_txn.open_table(tables::MEMBERSHIPS)?;
        let _ = write_txn.open_table(tables::MEMBER_GROUPS)?;
        let _ = write_txn.open_table(tables::VOTES)?;
        let _ = write_txn.open_table(tables::DISH_LISTINGS)?;
        let _ = write_txn.open_table(tables::USER_PROFILES)?;
        let _ = write_txn.open_table(tables::COUNTERS)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Serialize a record for storage
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(record, BINCODE_CONFIG)?)
}

/// Deserialize a stored record
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (record, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(record)
}

/// Issue the next id of the named counter inside the given transaction
///
/// Ids start at 1 and are never reused, even after the row they named is deleted.
pub fn next_id(txn: &WriteTransaction, counter: &str) -> Result<u64> {
    let mut counters = txn.open_table(tables::COUNTERS)?;
    let next = counters.get(counter)?.map(|v| v.value()).unwrap_or(0) + 1;
    counters.insert(counter, next)?;
    Ok(next)
}
