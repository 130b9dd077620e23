//! Member/team use-case service.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic; it only sees repository traits.

use crate::model::member::{Member, TeamRef};
use crate::model::member_dto::MemberDto;
use crate::model::team::{Team, TeamId};
use crate::paging::{Page, PageRequest};
use crate::repo::member_repo::MemberRepository;
use crate::repo::team_repo::TeamRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

/// Use-case service over member and team repositories.
pub struct MemberService<M: MemberRepository, T: TeamRepository> {
    members: M,
    teams: T,
}

impl<M: MemberRepository, T: TeamRepository> MemberService<M, T> {
    pub fn new(members: M, teams: T) -> Self {
        Self { members, teams }
    }

    pub fn members(&self) -> &M {
        &self.members
    }

    pub fn teams(&self) -> &T {
        &self.teams
    }

    /// Creates and persists a team.
    pub fn create_team(&self, name: impl Into<String>) -> RepoResult<Team> {
        let mut team = Team::new(name);
        self.teams.save(&mut team)?;
        Ok(team)
    }

    /// Creates a member inside `team` and returns it persisted.
    pub fn join(&self, username: impl Into<String>, age: i32, team: &Team) -> RepoResult<Member> {
        let mut member = Member::with_team(username, age, team);
        self.members.save(&mut member)?;
        Ok(member)
    }

    /// Moves a persisted member to another persisted team.
    ///
    /// `member` is only updated once the move is stored; on error it keeps
    /// its previous team.
    pub fn transfer(&self, member: &mut Member, team: &Team) -> RepoResult<()> {
        let mut moved = member.clone();
        moved.change_team(team);
        self.members.save(&mut moved)?;
        *member = moved;
        Ok(())
    }

    /// Page of members with `age` as flat DTOs.
    ///
    /// Teams are fetched with the page content; members without a team get
    /// an empty `team_name`.
    pub fn member_page_as_dto(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> RepoResult<Page<MemberDto>> {
        let page = self.members.find_member_query_by_age(age, request)?;
        page.try_map(|member| {
            let id = member.id().ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "query returned transient member `{}`",
                    member.username
                ))
            })?;
            let team_name = member
                .team()
                .map(|team| team.name.clone())
                .unwrap_or_default();
            Ok(MemberDto::new(id, member.username, team_name))
        })
    }

    /// Adds one year to every member aged at least `age`.
    ///
    /// Members loaded before this call keep their old ages; reload them.
    pub fn birthday_for_members_aged_at_least(&self, age: i32) -> RepoResult<usize> {
        let affected = self.members.bulk_age_plus(age)?;
        info!(
            "event=member_birthday module=service status=ok min_age={} affected={}",
            age, affected
        );
        Ok(affected)
    }

    /// Team name of each member, resolving lazy associations one lookup at
    /// a time.
    pub fn team_names_for(&self, members: &[Member]) -> RepoResult<Vec<Option<String>>> {
        members
            .iter()
            .map(|member| match member.team_ref() {
                None => Ok(None),
                Some(TeamRef::Fetched(team)) => Ok(Some(team.name.clone())),
                Some(TeamRef::Reference(id)) => self
                    .teams
                    .find_by_id(*id)?
                    .map(|team| Some(team.name))
                    .ok_or(RepoError::TeamNotFound(*id)),
            })
            .collect()
    }

    pub fn members_of(&self, team_id: TeamId) -> RepoResult<Vec<Member>> {
        self.teams.find_members(team_id)
    }
}
