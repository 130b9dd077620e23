use roster_core::db::migrations::latest_version;
use roster_core::db::{open_db, open_db_in_memory, unit_of_work, DbError};
use roster_core::{Member, MemberRepository, RepoError, RepoResult, SqliteMemberRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "members");
    assert_table_exists(&conn, "teams");
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    let conn_first = open_db(&path).unwrap();
    {
        let repo = SqliteMemberRepository::try_new(&conn_first).unwrap();
        repo.save(&mut Member::with_age("member1", 10)).unwrap();
    }
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let repo = SqliteMemberRepository::try_new(&conn_second).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteMemberRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("members")));
}

#[test]
fn unit_of_work_commits_on_ok() {
    let mut conn = open_db_in_memory().unwrap();

    let id = unit_of_work(&mut conn, |tx| -> RepoResult<_> {
        let repo = SqliteMemberRepository::try_new(tx)?;
        repo.save(&mut Member::with_age("member1", 10))
    })
    .unwrap();

    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    assert_eq!(repo.find_by_id(id).unwrap().unwrap().username, "member1");
}

#[test]
fn unit_of_work_rolls_back_on_err() {
    let mut conn = open_db_in_memory().unwrap();

    let result = unit_of_work(&mut conn, |tx| -> RepoResult<()> {
        let repo = SqliteMemberRepository::try_new(tx)?;
        repo.save(&mut Member::with_age("ghost", 10))?;
        Err(RepoError::InvalidData("abort".to_string()))
    });
    assert!(matches!(result, Err(RepoError::InvalidData(_))));

    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn dropped_transaction_discards_writes() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let tx = conn.transaction().unwrap();
        let repo = SqliteMemberRepository::try_new(&tx).unwrap();
        repo.save(&mut Member::new("memberA")).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
    }

    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
