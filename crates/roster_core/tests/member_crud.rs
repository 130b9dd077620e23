use roster_core::db::open_db_in_memory;
use roster_core::{
    Member, MemberCommandRepository, MemberRepository, MemberValidationError, RepoError,
    SqliteMemberCommandRepository, SqliteMemberRepository, SqliteTeamRepository, Team,
    TeamRepository, TeamValidationError,
};

#[test]
fn saved_member_is_found_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::new("memberA");
    let id = repo.save(&mut member).unwrap();

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.id(), member.id());
    assert_eq!(found.username, member.username);
    assert_eq!(found, member);
}

#[test]
fn basic_crud_drives_count_to_zero() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member1 = Member::new("member1");
    let mut member2 = Member::new("member2");
    repo.save(&mut member1).unwrap();
    repo.save(&mut member2).unwrap();

    let found1 = repo.find_by_id(member1.id().unwrap()).unwrap().unwrap();
    let found2 = repo.find_by_id(member2.id().unwrap()).unwrap().unwrap();
    assert_eq!(found1, member1);
    assert_eq!(found2, member2);

    assert_eq!(repo.find_all().unwrap().len(), 2);
    assert_eq!(repo.count().unwrap(), 2);

    repo.delete(&member1).unwrap();
    repo.delete(&member2).unwrap();
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn delete_is_a_no_op_for_transient_or_removed_members() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    repo.delete(&Member::new("never saved")).unwrap();

    let mut member = Member::new("member1");
    repo.save(&mut member).unwrap();
    repo.delete(&member).unwrap();
    repo.delete(&member).unwrap();
    assert!(repo.find_by_id(member.id().unwrap()).unwrap().is_none());
}

#[test]
fn delete_all_reports_removed_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    for i in 1..=3 {
        repo.save(&mut Member::with_age(format!("member{i}"), i * 10))
            .unwrap();
    }

    assert_eq!(repo.delete_all().unwrap(), 3);
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn save_on_persisted_member_updates_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("member1", 10);
    let id = repo.save(&mut member).unwrap();
    member.username = "renamed".to_string();
    member.age = 11;
    assert_eq!(repo.save(&mut member).unwrap(), id);

    let found = repo.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.username, "renamed");
    assert_eq!(found.age, 11);
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn save_on_removed_member_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::new("member1");
    let id = repo.save(&mut member).unwrap();
    repo.delete(&member).unwrap();

    let err = repo.save(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::MemberNotFound(missing) if missing == id));
}

#[test]
fn command_repository_populates_id() {
    let conn = open_db_in_memory().unwrap();
    let command = SqliteMemberCommandRepository::try_new(&conn).unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut member = Member::with_age("memberA", 20);
    assert!(member.id().is_none());
    command.save(&mut member).unwrap();

    let id = member.id().unwrap();
    assert_eq!(repo.find_by_id(id).unwrap().unwrap().age, 20);
}

#[test]
fn command_repository_rejects_persisted_member() {
    let conn = open_db_in_memory().unwrap();
    let command = SqliteMemberCommandRepository::try_new(&conn).unwrap();

    let mut member = Member::new("memberA");
    command.save(&mut member).unwrap();
    let id = member.id().unwrap();

    let err = command.save(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::AlreadyPersisted(existing) if existing == id));
}

#[test]
fn command_repository_counts_only_executed_inserts() {
    let conn = open_db_in_memory().unwrap();
    let command = SqliteMemberCommandRepository::try_new(&conn).unwrap();
    assert_eq!(command.statement_count(), 0);

    let mut member = Member::new("memberA");
    command.save(&mut member).unwrap();
    assert_eq!(command.statement_count(), 1);

    assert!(command.save(&mut member).is_err());
    assert!(command.save(&mut Member::new(" ")).is_err());
    assert_eq!(command.statement_count(), 1);
}

#[test]
fn failed_statements_are_not_counted() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    teams.save(&mut team).unwrap();
    let mut member = Member::with_team("member1", 10, &team);
    repo.save(&mut member).unwrap();
    assert_eq!(teams.statement_count(), 1);
    assert_eq!(repo.statement_count(), 1);

    let err = teams.delete(&team).unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(teams.statement_count(), 1);
}

#[test]
fn member_with_transient_team_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let team = Team::new("teamA");
    let mut member = Member::with_team("member1", 10, &team);
    let err = repo.save(&mut member).unwrap_err();
    assert!(matches!(
        err,
        RepoError::MemberValidation(MemberValidationError::TransientTeam { .. })
    ));
    assert!(member.id().is_none());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn member_referencing_removed_team_violates_foreign_key() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let command = SqliteMemberCommandRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    teams.save(&mut team).unwrap();
    teams.delete(&team).unwrap();

    let mut member = Member::with_team("member1", 10, &team);
    let err = command.save(&mut member).unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");
}

#[test]
fn team_crud_and_blank_name_validation() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    let id = teams.save(&mut team).unwrap();
    team.name = "teamB".to_string();
    teams.save(&mut team).unwrap();

    let found = teams.find_by_id(id).unwrap().unwrap();
    assert_eq!(found.name, "teamB");
    assert_eq!(teams.find_all().unwrap(), vec![found]);
    assert_eq!(teams.count().unwrap(), 1);

    let err = teams.save(&mut Team::new(" ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::TeamValidation(TeamValidationError::BlankName)
    ));
}

#[test]
fn team_with_members_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    teams.save(&mut team).unwrap();
    members
        .save(&mut Member::with_team("member1", 10, &team))
        .unwrap();

    let err = teams.delete(&team).unwrap_err();
    assert!(err.is_constraint_violation(), "unexpected error: {err}");
    assert_eq!(teams.count().unwrap(), 1);
}
