use roster_core::db::open_db_in_memory;
use roster_core::{
    Member, MemberRepository, MemberService, SqliteMemberRepository, SqliteTeamRepository, Team,
    TeamRepository,
};
use rusqlite::Connection;

/// member1 -> teamA, member2 -> teamB, member3 without team.
fn seed(conn: &Connection) {
    let teams = SqliteTeamRepository::try_new(conn).unwrap();
    let members = SqliteMemberRepository::try_new(conn).unwrap();
    let mut team_a = Team::new("teamA");
    let mut team_b = Team::new("teamB");
    teams.save(&mut team_a).unwrap();
    teams.save(&mut team_b).unwrap();
    members
        .save(&mut Member::with_team("member1", 10, &team_a))
        .unwrap();
    members
        .save(&mut Member::with_team("member2", 10, &team_b))
        .unwrap();
    members.save(&mut Member::with_age("member3", 10)).unwrap();
}

fn service(conn: &Connection) -> MemberService<SqliteMemberRepository<'_>, SqliteTeamRepository<'_>> {
    MemberService::new(
        SqliteMemberRepository::try_new(conn).unwrap(),
        SqliteTeamRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn lazy_associations_cost_one_lookup_per_member() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = service(&conn);

    let members = service.members().find_all().unwrap();
    assert!(members[0].is_team_lazy());
    assert!(members[0].team().is_none());
    assert!(members[0].team_id().is_some());

    let names = service.team_names_for(&members).unwrap();
    assert_eq!(
        names,
        [Some("teamA".to_string()), Some("teamB".to_string()), None]
    );
    assert_eq!(service.members().statement_count(), 1);
    assert_eq!(service.teams().statement_count(), 2);
}

#[test]
fn fetch_join_loads_teams_in_the_same_statement() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let service = service(&conn);

    let members = service.members().find_member_fetch_join().unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().all(|m| !m.is_team_lazy()));

    let names = service.team_names_for(&members).unwrap();
    assert_eq!(names, [Some("teamA".to_string()), Some("teamB".to_string())]);
    assert_eq!(service.members().statement_count(), 1);
    assert_eq!(service.teams().statement_count(), 0);
}

#[test]
fn find_all_with_team_keeps_members_without_team() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let members = repo.find_all_with_team().unwrap();
    let teams: Vec<Option<&str>> = members
        .iter()
        .map(|m| m.team().map(|t| t.name.as_str()))
        .collect();
    assert_eq!(teams, [Some("teamA"), Some("teamB"), None]);
    assert!(members[2].team_ref().is_none());
}

#[test]
fn entity_graph_by_username_fetches_team() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();

    let members = repo.find_entity_graph_by_username("member2").unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].team().map(|t| t.name.as_str()), Some("teamB"));
}

#[test]
fn entity_graph_prefix_match_is_literal_and_case_sensitive() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    repo.save(&mut Member::with_age("MEMBER9", 10)).unwrap();
    repo.save(&mut Member::with_age("mem_ber", 10)).unwrap();

    let members = repo
        .find_entity_graph_by_username_starting_with("member")
        .unwrap();
    let names: Vec<&str> = members.iter().map(|m| m.username.as_str()).collect();
    assert_eq!(names, ["member1", "member2", "member3"]);
    assert_eq!(members[0].team().map(|t| t.name.as_str()), Some("teamA"));

    let underscore = repo
        .find_entity_graph_by_username_starting_with("mem_")
        .unwrap();
    assert_eq!(underscore.len(), 1);
    assert_eq!(underscore[0].username, "mem_ber");

    assert!(repo
        .find_entity_graph_by_username_starting_with("%")
        .unwrap()
        .is_empty());
}
