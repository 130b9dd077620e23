//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define member/team data access contracts.
//! - Keep SQL text and row mapping inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate entities before SQL mutations.
//! - Errors are propagated unchanged apart from wrapping; no retries.
//! - Repositories borrow a connection (or a transaction) and never open or
//!   finish a unit of work themselves.

use crate::db::DbError;
use crate::model::member::{MemberId, MemberValidationError};
use crate::model::team::{TeamId, TeamValidationError};
use log::debug;
use rusqlite::Connection;
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod member_command_repo;
pub mod member_repo;
pub mod team_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for member/team persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    MemberValidation(MemberValidationError),
    TeamValidation(TeamValidationError),
    /// Driver error, including constraint violations raised at execution.
    Db(DbError),
    MemberNotFound(MemberId),
    TeamNotFound(TeamId),
    /// A persist was requested for an entity that already has an id.
    AlreadyPersisted(MemberId),
    /// A single-result query matched more than one row.
    NonUniqueResult {
        query: &'static str,
        actual: usize,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl RepoError {
    /// Whether this error wraps a SQLite constraint violation (foreign key,
    /// not-null, unique).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Db(DbError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MemberValidation(err) => write!(f, "{err}"),
            Self::TeamValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::TeamNotFound(id) => write!(f, "team not found: {id}"),
            Self::AlreadyPersisted(id) => write!(f, "member {id} is already persisted"),
            Self::NonUniqueResult { query, actual } => write!(
                f,
                "query `{query}` expected at most one result but found {actual}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MemberValidation(err) => Some(err),
            Self::TeamValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::MemberNotFound(_)
            | Self::TeamNotFound(_)
            | Self::AlreadyPersisted(_)
            | Self::NonUniqueResult { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<MemberValidationError> for RepoError {
    fn from(value: MemberValidationError) -> Self {
        Self::MemberValidation(value)
    }
}

impl From<TeamValidationError> for RepoError {
    fn from(value: TeamValidationError) -> Self {
        Self::TeamValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Per-repository count of executed SQL statements.
///
/// Lets callers observe how many round trips a use-case costs, e.g. lazy
/// team resolution versus a fetch join. Statements that fail to prepare or
/// execute are not counted.
#[derive(Debug, Default)]
pub(crate) struct StatementCounter {
    executed: Cell<u64>,
}

impl StatementCounter {
    pub(crate) fn record(&self, query: &'static str) {
        self.executed.set(self.executed.get() + 1);
        debug!("event=sql_execute module=repo query={query}");
    }

    pub(crate) fn get(&self) -> u64 {
        self.executed.get()
    }
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn count_to_u64(value: i64, column: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative count `{value}` in {column}")))
}
