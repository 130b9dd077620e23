//! Member entity and its team association.
//!
//! # Invariants
//! - `id` is `None` until the member is saved, then fixed.
//! - A team association always carries a persisted `TeamId`; a transient
//!   team can be attached in memory but is rejected by `validate()`.
//! - `TeamRef::Fetched` is only produced by queries that load the team row in
//!   the same statement as the member row.

use crate::model::team::{Team, TeamId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated surrogate key of a persisted member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(i64);

impl MemberId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for MemberId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Many-to-one association from a member to its team.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRef {
    /// Only the foreign key is known. Resolving the team costs a lookup.
    Reference(TeamId),
    /// The team row was loaded together with the member.
    Fetched(Team),
}

/// Validation errors for member write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValidationError {
    BlankUsername,
    /// The associated team has not been saved yet.
    TransientTeam { team_name: String },
}

impl Display for MemberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUsername => write!(f, "member username must not be blank"),
            Self::TransientTeam { team_name } => {
                write!(f, "team `{team_name}` must be saved before members reference it")
            }
        }
    }
}

impl Error for MemberValidationError {}

/// A member, optionally belonging to one team.
///
/// Serialize-only: ids come from the store, never from outside input.
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    id: Option<MemberId>,
    pub username: String,
    pub age: i32,
    team: Option<TeamRef>,
}

impl Member {
    /// Creates a transient member with age 0 and no team.
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_age(username, 0)
    }

    pub fn with_age(username: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team: None,
        }
    }

    /// Creates a transient member already attached to `team`.
    pub fn with_team(username: impl Into<String>, age: i32, team: &Team) -> Self {
        let mut member = Self::with_age(username, age);
        member.change_team(team);
        member
    }

    pub(crate) fn from_row(
        id: MemberId,
        username: String,
        age: i32,
        team: Option<TeamRef>,
    ) -> Self {
        Self {
            id: Some(id),
            username,
            age,
            team,
        }
    }

    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn assign_id(&mut self, id: MemberId) {
        debug_assert!(self.id.is_none(), "member id is immutable once assigned");
        self.id = Some(id);
    }

    /// Points this member at `team`.
    ///
    /// A persisted team is kept as fetched, so `team()` keeps working without
    /// a lookup. A transient team is kept too; `validate()` rejects it.
    pub fn change_team(&mut self, team: &Team) {
        self.team = Some(TeamRef::Fetched(team.clone()));
    }

    pub fn leave_team(&mut self) {
        self.team = None;
    }

    pub fn team_ref(&self) -> Option<&TeamRef> {
        self.team.as_ref()
    }

    /// Foreign key of the associated team, whether fetched or not.
    pub fn team_id(&self) -> Option<TeamId> {
        match self.team.as_ref()? {
            TeamRef::Reference(id) => Some(*id),
            TeamRef::Fetched(team) => team.id(),
        }
    }

    /// The associated team when it is already loaded.
    pub fn team(&self) -> Option<&Team> {
        match self.team.as_ref()? {
            TeamRef::Fetched(team) => Some(team),
            TeamRef::Reference(_) => None,
        }
    }

    /// Whether a team association exists but still needs a lookup.
    pub fn is_team_lazy(&self) -> bool {
        matches!(self.team, Some(TeamRef::Reference(_)))
    }

    pub fn validate(&self) -> Result<(), MemberValidationError> {
        if self.username.trim().is_empty() {
            return Err(MemberValidationError::BlankUsername);
        }
        if let Some(TeamRef::Fetched(team)) = self.team.as_ref() {
            if !team.is_persisted() {
                return Err(MemberValidationError::TransientTeam {
                    team_name: team.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(left), Some(right)) if left == right)
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "Member(id={}, username={}, age={})",
                id, self.username, self.age
            ),
            None => write!(
                f,
                "Member(id=transient, username={}, age={})",
                self.username, self.age
            ),
        }
    }
}
