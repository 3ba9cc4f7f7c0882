//! SQLite bootstrap for the local mirror database.
//!
//! # Responsibility
//! - Open and configure SQLite connections holding local mirror slots.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Slots must not be read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures of the mirror database, tagged with the step that failed.
#[derive(Debug)]
pub enum DbError {
    /// The file or in-memory handle could not be opened.
    Open {
        mode: &'static str,
        source: rusqlite::Error,
    },
    /// A migration script failed; its transaction was rolled back.
    Migration { version: u32, source: rusqlite::Error },
    /// The file was written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
    /// A statement against one slot row failed.
    Slot {
        key: &'static str,
        source: rusqlite::Error,
    },
    /// Connection setup: pragmas and the version probe.
    Setup(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { mode, source } => {
                write!(f, "cannot open {mode} mirror database: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "mirror migration {version} failed: {source}")
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "mirror schema version {found} is newer than supported {supported}"
            ),
            Self::Slot { key, source } => write!(f, "slot `{key}`: {source}"),
            Self::Setup(source) => write!(f, "mirror connection setup failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. }
            | Self::Migration { source, .. }
            | Self::Slot { source, .. }
            | Self::Setup(source) => Some(source),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Setup(value)
    }
}
