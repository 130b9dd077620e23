//! Member query repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, derived-style lookups, projections, paging, bulk update
//!   and eager-fetch queries over `members`.
//! - Map rows to `Member` with the team association either lazy
//!   (`TeamRef::Reference`) or fetched in the same statement.
//!
//! # Invariants
//! - Unsorted list queries are ordered by `member_id ASC`.
//! - Sorted queries always end with a `member_id` tie-breaker, so page
//!   boundaries are stable.
//! - Bulk updates do not touch `Member` values held by callers.

use crate::model::member::{Member, MemberId, TeamRef};
use crate::model::member_dto::MemberDto;
use crate::model::team::{Team, TeamId};
use crate::paging::{Direction, MemberProperty, Page, PageRequest, Slice, Sort};
use crate::repo::{count_to_u64, ensure_tables, RepoError, RepoResult, StatementCounter};
use log::info;
use rusqlite::{named_params, params, params_from_iter, Connection, Params, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    m.member_id AS member_id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id
FROM members m";

const MEMBER_WITH_TEAM_SELECT_SQL: &str = "SELECT
    m.member_id AS member_id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id,
    t.name AS team_name
FROM members m
LEFT JOIN teams t ON t.team_id = m.team_id";

const MEMBER_FETCH_JOIN_SQL: &str = "SELECT
    m.member_id AS member_id,
    m.username AS username,
    m.age AS age,
    m.team_id AS team_id,
    t.name AS team_name
FROM members m
INNER JOIN teams t ON t.team_id = m.team_id";

/// How a query materializes the member -> team association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TeamLoad {
    Lazy,
    Fetched,
}

/// Repository interface for member queries and writes.
pub trait MemberRepository {
    /// Inserts a transient member (assigning its id) or updates a persisted one.
    fn save(&self, member: &mut Member) -> RepoResult<MemberId>;
    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>>;
    fn find_all(&self) -> RepoResult<Vec<Member>>;
    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<Member>>;
    fn find_all_paged(&self, request: &PageRequest) -> RepoResult<Page<Member>>;
    fn count(&self) -> RepoResult<u64>;
    /// Removes a member row. Transient or already-removed members are a no-op.
    fn delete(&self, member: &Member) -> RepoResult<()>;
    /// Removes every member row and returns how many were removed.
    fn delete_all(&self) -> RepoResult<usize>;

    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepoResult<Vec<Member>>;
    /// Unfiltered lookup; the word between `find` and `by` carries no meaning.
    fn find_hello_by(&self) -> RepoResult<Vec<Member>>;
    /// First three members by id.
    fn find_top3_hello_by(&self) -> RepoResult<Vec<Member>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Vec<Member>>;
    /// Named-parameter query on username and exact age.
    fn find_user(&self, username: &str, age: i32) -> RepoResult<Vec<Member>>;
    fn find_username_list(&self) -> RepoResult<Vec<String>>;
    /// Projection over members that belong to a team.
    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>>;
    /// Positional `IN` query. Empty input yields an empty result.
    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Member>>;
    /// Inverse side of the member -> team association.
    fn find_by_team(&self, team_id: TeamId) -> RepoResult<Vec<Member>>;

    fn find_list_by_username(&self, username: &str) -> RepoResult<Vec<Member>>;
    /// Single-result lookup; more than one match is `NonUniqueResult`.
    fn find_member_by_username(&self, username: &str) -> RepoResult<Option<Member>>;
    /// Same contract as `find_member_by_username`; absence is never an error.
    fn find_optional_member_by_username(&self, username: &str) -> RepoResult<Option<Member>>;

    /// Page of members with the given age, with total count.
    fn find_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>>;
    /// Slice of members with the given age; no count query.
    fn find_member_slice_by_age(&self, age: i32, request: &PageRequest)
        -> RepoResult<Slice<Member>>;
    /// Bounded list of members with the given age; no metadata.
    fn find_member_list_by_age(&self, age: i32, request: &PageRequest)
        -> RepoResult<Vec<Member>>;
    /// Page whose content query fetches teams and whose count query is join-free.
    fn find_member_query_by_age(&self, age: i32, request: &PageRequest)
        -> RepoResult<Page<Member>>;
    fn find_top4_by_age(&self, age: i32, sort: &Sort) -> RepoResult<Vec<Member>>;

    /// Adds one year to every member aged at least `age`; returns affected rows.
    ///
    /// Members already at `i32::MAX` are left unchanged.
    fn bulk_age_plus(&self, age: i32) -> RepoResult<usize>;

    /// Members with a team, team loaded in the same statement.
    fn find_member_fetch_join(&self) -> RepoResult<Vec<Member>>;
    /// All members, team loaded in the same statement when present.
    fn find_all_with_team(&self) -> RepoResult<Vec<Member>>;
    fn find_entity_graph_by_username(&self, username: &str) -> RepoResult<Vec<Member>>;
    /// Case-sensitive prefix match; `%` and `_` in `prefix` are literal.
    fn find_entity_graph_by_username_starting_with(
        &self,
        prefix: &str,
    ) -> RepoResult<Vec<Member>>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
    statements: StatementCounter,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Constructs a repository from a migrated connection or transaction.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["members", "teams"])?;
        Ok(Self {
            conn,
            statements: StatementCounter::default(),
        })
    }

    /// Number of SQL statements this repository has executed.
    pub fn statement_count(&self) -> u64 {
        self.statements.get()
    }

    fn query_members<P: Params>(
        &self,
        query: &'static str,
        sql: &str,
        params: P,
        load: TeamLoad,
    ) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        self.statements.record(query);
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row, load)?);
        }
        Ok(members)
    }

    fn query_count<P: Params>(&self, query: &'static str, sql: &str, params: P) -> RepoResult<u64> {
        let value: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        self.statements.record(query);
        count_to_u64(value, query)
    }

    fn insert(&self, member: &mut Member) -> RepoResult<MemberId> {
        self.conn.execute(
            "INSERT INTO members (username, age, team_id) VALUES (?1, ?2, ?3);",
            params![
                member.username.as_str(),
                member.age,
                member.team_id().map(TeamId::get)
            ],
        )?;
        self.statements.record("member_insert");
        let id = MemberId::new(self.conn.last_insert_rowid());
        member.assign_id(id);
        Ok(id)
    }

    fn update(&self, id: MemberId, member: &Member) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE members
             SET
                username = ?1,
                age = ?2,
                team_id = ?3
             WHERE member_id = ?4;",
            params![
                member.username.as_str(),
                member.age,
                member.team_id().map(TeamId::get),
                id.get()
            ],
        )?;
        self.statements.record("member_update");
        if changed == 0 {
            return Err(RepoError::MemberNotFound(id));
        }
        Ok(())
    }

    /// Builds the `Page`, counting only when the total can't be derived
    /// from the content.
    fn page_with<F>(
        &self,
        content: Vec<Member>,
        request: &PageRequest,
        count: F,
    ) -> RepoResult<Page<Member>>
    where
        F: FnOnce() -> RepoResult<u64>,
    {
        let total = match derive_total(request, content.len()) {
            Some(total) => total,
            None => count()?,
        };
        Ok(Page::new(content, request, total))
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn save(&self, member: &mut Member) -> RepoResult<MemberId> {
        member.validate()?;
        match member.id() {
            Some(id) => {
                self.update(id, member)?;
                Ok(id)
            }
            None => self.insert(member),
        }
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let members = self.query_members(
            "member_find_by_id",
            &format!("{MEMBER_SELECT_SQL} WHERE m.member_id = ?1;"),
            [id.get()],
            TeamLoad::Lazy,
        )?;
        Ok(members.into_iter().next())
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.find_all_sorted(&Sort::unsorted())
    }

    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_all",
            &format!("{MEMBER_SELECT_SQL}{};", order_by_clause(sort)),
            [],
            TeamLoad::Lazy,
        )
    }

    fn find_all_paged(&self, request: &PageRequest) -> RepoResult<Page<Member>> {
        let (limit, offset) = window(request);
        let content = self.query_members(
            "member_find_all_paged",
            &format!(
                "{MEMBER_SELECT_SQL}{} LIMIT ?1 OFFSET ?2;",
                order_by_clause(request.sort())
            ),
            params![limit, offset],
            TeamLoad::Lazy,
        )?;
        self.page_with(content, request, || self.count())
    }

    fn count(&self) -> RepoResult<u64> {
        self.query_count("member_count", "SELECT COUNT(*) FROM members;", [])
    }

    fn delete(&self, member: &Member) -> RepoResult<()> {
        let Some(id) = member.id() else {
            return Ok(());
        };
        self.conn
            .execute("DELETE FROM members WHERE member_id = ?1;", [id.get()])?;
        self.statements.record("member_delete");
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM members;", [])?;
        self.statements.record("member_delete_all");
        Ok(removed)
    }

    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_by_username_and_age_greater_than",
            &format!(
                "{MEMBER_SELECT_SQL}
                 WHERE m.username = ?1
                   AND m.age > ?2
                 ORDER BY m.member_id ASC;"
            ),
            params![username, age],
            TeamLoad::Lazy,
        )
    }

    fn find_hello_by(&self) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_hello_by",
            &format!("{MEMBER_SELECT_SQL} ORDER BY m.member_id ASC;"),
            [],
            TeamLoad::Lazy,
        )
    }

    fn find_top3_hello_by(&self) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_top3_hello_by",
            &format!("{MEMBER_SELECT_SQL} ORDER BY m.member_id ASC LIMIT 3;"),
            [],
            TeamLoad::Lazy,
        )
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_by_username",
            &format!("{MEMBER_SELECT_SQL} WHERE m.username = ?1 ORDER BY m.member_id ASC;"),
            [username],
            TeamLoad::Lazy,
        )
    }

    fn find_user(&self, username: &str, age: i32) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_user",
            &format!(
                "{MEMBER_SELECT_SQL}
                 WHERE m.username = :username
                   AND m.age = :age
                 ORDER BY m.member_id ASC;"
            ),
            named_params! { ":username": username, ":age": age },
            TeamLoad::Lazy,
        )
    }

    fn find_username_list(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM members ORDER BY member_id ASC;")?;
        let mut rows = stmt.query([])?;
        self.statements.record("member_find_username_list");
        let mut usernames = Vec::new();
        while let Some(row) = rows.next()? {
            usernames.push(row.get("username")?);
        }
        Ok(usernames)
    }

    fn find_member_dto(&self) -> RepoResult<Vec<MemberDto>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.member_id AS member_id,
                m.username AS username,
                t.name AS team_name
             FROM members m
             INNER JOIN teams t ON t.team_id = m.team_id
             ORDER BY m.member_id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        self.statements.record("member_find_member_dto");
        let mut dtos = Vec::new();
        while let Some(row) = rows.next()? {
            dtos.push(MemberDto {
                id: MemberId::new(row.get("member_id")?),
                username: row.get("username")?,
                team_name: row.get("team_name")?,
            });
        }
        Ok(dtos)
    }

    fn find_by_names(&self, names: &[String]) -> RepoResult<Vec<Member>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = (1..=names.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.query_members(
            "member_find_by_names",
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.username IN ({placeholders}) ORDER BY m.member_id ASC;"
            ),
            params_from_iter(names.iter()),
            TeamLoad::Lazy,
        )
    }

    fn find_by_team(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_by_team",
            &format!("{MEMBER_SELECT_SQL} WHERE m.team_id = ?1 ORDER BY m.member_id ASC;"),
            [team_id.get()],
            TeamLoad::Lazy,
        )
    }

    fn find_list_by_username(&self, username: &str) -> RepoResult<Vec<Member>> {
        self.find_by_username(username)
    }

    fn find_member_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let members = self.query_members(
            "member_find_member_by_username",
            &format!("{MEMBER_SELECT_SQL} WHERE m.username = ?1 ORDER BY m.member_id ASC;"),
            [username],
            TeamLoad::Lazy,
        )?;
        single_result("member_find_member_by_username", members)
    }

    fn find_optional_member_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let members = self.query_members(
            "member_find_optional_member_by_username",
            &format!("{MEMBER_SELECT_SQL} WHERE m.username = ?1 ORDER BY m.member_id ASC;"),
            [username],
            TeamLoad::Lazy,
        )?;
        single_result("member_find_optional_member_by_username", members)
    }

    fn find_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>> {
        let (limit, offset) = window(request);
        let content = self.query_members(
            "member_find_by_age",
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.age = ?1{} LIMIT ?2 OFFSET ?3;",
                order_by_clause(request.sort())
            ),
            params![age, limit, offset],
            TeamLoad::Lazy,
        )?;
        self.page_with(content, request, || {
            self.query_count(
                "member_count_by_age",
                "SELECT COUNT(*) FROM members m WHERE m.age = ?1;",
                [age],
            )
        })
    }

    fn find_member_slice_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> RepoResult<Slice<Member>> {
        let (limit, offset) = window(request);
        let mut content = self.query_members(
            "member_find_member_slice_by_age",
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.age = ?1{} LIMIT ?2 OFFSET ?3;",
                order_by_clause(request.sort())
            ),
            params![age, limit + 1, offset],
            TeamLoad::Lazy,
        )?;
        let page_size = request.size() as usize;
        let has_next = content.len() > page_size;
        content.truncate(page_size);
        Ok(Slice::new(content, request, has_next))
    }

    fn find_member_list_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> RepoResult<Vec<Member>> {
        let (limit, offset) = window(request);
        self.query_members(
            "member_find_member_list_by_age",
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.age = ?1{} LIMIT ?2 OFFSET ?3;",
                order_by_clause(request.sort())
            ),
            params![age, limit, offset],
            TeamLoad::Lazy,
        )
    }

    fn find_member_query_by_age(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> RepoResult<Page<Member>> {
        let (limit, offset) = window(request);
        let content = self.query_members(
            "member_find_member_query_by_age",
            &format!(
                "{MEMBER_WITH_TEAM_SELECT_SQL} WHERE m.age = ?1{} LIMIT ?2 OFFSET ?3;",
                order_by_clause(request.sort())
            ),
            params![age, limit, offset],
            TeamLoad::Fetched,
        )?;
        self.page_with(content, request, || {
            self.query_count(
                "member_count_query_by_age",
                "SELECT COUNT(m.member_id) FROM members m WHERE m.age = ?1;",
                [age],
            )
        })
    }

    fn find_top4_by_age(&self, age: i32, sort: &Sort) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_top4_by_age",
            &format!(
                "{MEMBER_SELECT_SQL} WHERE m.age = ?1{} LIMIT 4;",
                order_by_clause(sort)
            ),
            [age],
            TeamLoad::Lazy,
        )
    }

    fn bulk_age_plus(&self, age: i32) -> RepoResult<usize> {
        let affected = self.conn.execute(
            "UPDATE members SET age = age + 1 WHERE age >= ?1 AND age < ?2;",
            [age, i32::MAX],
        )?;
        self.statements.record("member_bulk_age_plus");
        info!(
            "event=member_bulk_update module=repo status=ok min_age={} affected={}",
            age, affected
        );
        Ok(affected)
    }

    fn find_member_fetch_join(&self) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_member_fetch_join",
            &format!("{MEMBER_FETCH_JOIN_SQL} ORDER BY m.member_id ASC;"),
            [],
            TeamLoad::Fetched,
        )
    }

    fn find_all_with_team(&self) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_all_with_team",
            &format!("{MEMBER_WITH_TEAM_SELECT_SQL} ORDER BY m.member_id ASC;"),
            [],
            TeamLoad::Fetched,
        )
    }

    fn find_entity_graph_by_username(&self, username: &str) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_entity_graph_by_username",
            &format!(
                "{MEMBER_WITH_TEAM_SELECT_SQL} WHERE m.username = ?1 ORDER BY m.member_id ASC;"
            ),
            [username],
            TeamLoad::Fetched,
        )
    }

    fn find_entity_graph_by_username_starting_with(
        &self,
        prefix: &str,
    ) -> RepoResult<Vec<Member>> {
        self.query_members(
            "member_find_entity_graph_by_username_starting_with",
            &format!(
                "{MEMBER_WITH_TEAM_SELECT_SQL}
                 WHERE substr(m.username, 1, length(?1)) = ?1
                 ORDER BY m.member_id ASC;"
            ),
            [prefix],
            TeamLoad::Fetched,
        )
    }
}

/// Maps one `members` row (optionally joined with `teams`) to a `Member`.
pub(crate) fn parse_member_row(row: &Row<'_>, load: TeamLoad) -> RepoResult<Member> {
    let id = MemberId::new(row.get("member_id")?);
    let team_id: Option<i64> = row.get("team_id")?;
    let team = match (team_id, load) {
        (None, _) => None,
        (Some(raw), TeamLoad::Lazy) => Some(TeamRef::Reference(TeamId::new(raw))),
        (Some(raw), TeamLoad::Fetched) => {
            let name: Option<String> = row.get("team_name")?;
            let name = name.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "member {id} references team {raw} which has no row in teams"
                ))
            })?;
            Some(TeamRef::Fetched(Team::from_row(TeamId::new(raw), name)))
        }
    };

    Ok(Member::from_row(
        id,
        row.get("username")?,
        row.get("age")?,
        team,
    ))
}

/// Total row count implied by the content alone, if any.
///
/// A short first page holds everything; a short, non-empty later page ends
/// the result set. Otherwise a count query is needed.
fn derive_total(request: &PageRequest, content_len: usize) -> Option<u64> {
    let len = content_len as u64;
    let size = u64::from(request.size());
    if request.offset() == 0 {
        return (len < size).then_some(len);
    }
    (len != 0 && len < size).then(|| request.offset() + len)
}

fn single_result(query: &'static str, members: Vec<Member>) -> RepoResult<Option<Member>> {
    match members.len() {
        0 | 1 => Ok(members.into_iter().next()),
        actual => Err(RepoError::NonUniqueResult { query, actual }),
    }
}

fn window(request: &PageRequest) -> (i64, i64) {
    let limit = i64::from(request.size());
    let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

fn order_by_clause(sort: &Sort) -> String {
    let mut terms = sort
        .orders()
        .iter()
        .map(|order| {
            format!(
                "{} {}",
                property_column(order.property),
                direction_sql(order.direction)
            )
        })
        .collect::<Vec<_>>();
    if !sort
        .orders()
        .iter()
        .any(|order| order.property == MemberProperty::Id)
    {
        terms.push("m.member_id ASC".to_string());
    }
    format!(" ORDER BY {}", terms.join(", "))
}

fn property_column(property: MemberProperty) -> &'static str {
    match property {
        MemberProperty::Id => "m.member_id",
        MemberProperty::Username => "m.username",
        MemberProperty::Age => "m.age",
    }
}

fn direction_sql(direction: Direction) -> &'static str {
    match direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    }
}
