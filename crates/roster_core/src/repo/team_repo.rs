//! Team repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Deleting a team that members still reference fails with a foreign-key
//!   constraint error; there is no cascade.

use crate::model::member::Member;
use crate::model::team::{Team, TeamId};
use crate::repo::member_repo::{parse_member_row, TeamLoad};
use crate::repo::{count_to_u64, ensure_tables, RepoError, RepoResult, StatementCounter};
use rusqlite::{params, Connection, Row};

const TEAM_SELECT_SQL: &str = "SELECT team_id, name FROM teams";

/// Repository interface for team CRUD and the inverse member collection.
pub trait TeamRepository {
    /// Inserts a transient team (assigning its id) or updates a persisted one.
    fn save(&self, team: &mut Team) -> RepoResult<TeamId>;
    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_all(&self) -> RepoResult<Vec<Team>>;
    fn count(&self) -> RepoResult<u64>;
    /// Removes a team row. Transient or already-removed teams are a no-op.
    fn delete(&self, team: &Team) -> RepoResult<()>;
    /// Members whose association points at `id`, with the team fetched.
    fn find_members(&self, id: TeamId) -> RepoResult<Vec<Member>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
    statements: StatementCounter,
}

impl<'conn> SqliteTeamRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["teams", "members"])?;
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

impl TeamRepository for SqliteTeamRepository<'_> {
    fn save(&self, team: &mut Team) -> RepoResult<TeamId> {
        team.validate()?;

        if let Some(id) = team.id() {
            let changed = self.conn.execute(
                "UPDATE teams SET name = ?1 WHERE team_id = ?2;",
                params![team.name.as_str(), id.get()],
            )?;
            self.statements.record("team_update");
            if changed == 0 {
                return Err(RepoError::TeamNotFound(id));
            }
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO teams (name) VALUES (?1);",
            [team.name.as_str()],
        )?;
        self.statements.record("team_insert");
        let id = TeamId::new(self.conn.last_insert_rowid());
        team.assign_id(id);
        Ok(id)
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_SELECT_SQL} WHERE team_id = ?1;"))?;
        let mut rows = stmt.query([id.get()])?;
        self.statements.record("team_find_by_id");
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_team_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEAM_SELECT_SQL} ORDER BY team_id ASC;"))?;
        let mut rows = stmt.query([])?;
        self.statements.record("team_find_all");
        let mut teams = Vec::new();
        while let Some(row) = rows.next()? {
            teams.push(parse_team_row(row)?);
        }
        Ok(teams)
    }

    fn count(&self) -> RepoResult<u64> {
        let value: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM teams;", [], |row| row.get(0))?;
        self.statements.record("team_count");
        count_to_u64(value, "team_count")
    }

    fn delete(&self, team: &Team) -> RepoResult<()> {
        let Some(id) = team.id() else {
            return Ok(());
        };
        self.conn
            .execute("DELETE FROM teams WHERE team_id = ?1;", [id.get()])?;
        self.statements.record("team_delete");
        Ok(())
    }

    fn find_members(&self, id: TeamId) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.member_id AS member_id,
                m.username AS username,
                m.age AS age,
                m.team_id AS team_id,
                t.name AS team_name
             FROM members m
             INNER JOIN teams t ON t.team_id = m.team_id
             WHERE m.team_id = ?1
             ORDER BY m.member_id ASC;",
        )?;
        let mut rows = stmt.query([id.get()])?;
        self.statements.record("team_find_members");
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row, TeamLoad::Fetched)?);
        }
        Ok(members)
    }
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    Ok(Team::from_row(
        TeamId::new(row.get("team_id")?),
        row.get("name")?,
    ))
}
