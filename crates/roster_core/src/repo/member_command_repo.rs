//! Persist-only member repository.
//!
//! # Responsibility
//! - Make a transient member persistent in the caller's unit of work.
//!
//! # Invariants
//! - Only transient members are accepted; merging is `MemberRepository::save`.
//! - The assigned id is written back into the caller's `Member`.

use crate::model::member::{Member, MemberId};
use crate::model::team::TeamId;
use crate::repo::{ensure_tables, RepoError, RepoResult, StatementCounter};
use log::debug;
use rusqlite::{params, Connection};

/// Write-side contract: track a new member instance.
pub trait MemberCommandRepository {
    /// Persists `member` and populates its id.
    ///
    /// # Errors
    /// - `AlreadyPersisted` when `member` already has an id.
    /// - `MemberValidation` when the member or its team reference is invalid.
    /// - `Db` for constraint violations, e.g. an unknown team id.
    fn save(&self, member: &mut Member) -> RepoResult<()>;
}

pub struct SqliteMemberCommandRepository<'conn> {
    conn: &'conn Connection,
    statements: StatementCounter,
}

impl<'conn> SqliteMemberCommandRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["members"])?;
        Ok(Self {
            conn,
            statements: StatementCounter::default(),
        })
    }

    /// Number of SQL statements this repository has executed.
    pub fn statement_count(&self) -> u64 {
        self.statements.get()
    }
}

impl MemberCommandRepository for SqliteMemberCommandRepository<'_> {
    fn save(&self, member: &mut Member) -> RepoResult<()> {
        if let Some(id) = member.id() {
            return Err(RepoError::AlreadyPersisted(id));
        }
        member.validate()?;

        self.conn.execute(
            "INSERT INTO members (username, age, team_id) VALUES (?1, ?2, ?3);",
            params![
                member.username.as_str(),
                member.age,
                member.team_id().map(TeamId::get)
            ],
        )?;
        self.statements.record("member_persist");
        let id = MemberId::new(self.conn.last_insert_rowid());
        member.assign_id(id);
        debug!("event=member_persist module=repo status=ok member_id={id}");
        Ok(())
    }
}
