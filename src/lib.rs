//! Food Vote Server Library
//!
//! Group membership and dish voting backend. This module exports the core
//! types and functions for testing and reuse.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, ErrorKind, Result};

use services::{MembershipManager, Profiles, Tally, VoteLedger};

/// Application state shared across all handlers
///
/// Every service holds its own clone of the one database handle.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub membership: MembershipManager,
    pub ledger: VoteLedger,
    pub tally: Tally,
    pub profiles: Profiles,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        Self {
            membership: MembershipManager::new(db.clone()),
            ledger: VoteLedger::new(db.clone()),
            tally: Tally::new(db.clone()),
            profiles: Profiles::new(db.clone()),
            db,
            config,
        }
    }
}
