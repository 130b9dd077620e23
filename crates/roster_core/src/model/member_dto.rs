//! Member read projection.

use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Flat member view carrying the team name instead of the team entity.
///
/// Not persistent; produced by projection queries or by mapping a page of
/// members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: MemberId,
    pub username: String,
    pub team_name: String,
}

impl MemberDto {
    pub fn new(id: MemberId, username: impl Into<String>, team_name: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            team_name: team_name.into(),
        }
    }
}

impl Display for MemberDto {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MemberDto(id={}, username={}, team_name={})",
            self.id, self.username, self.team_name
        )
    }
}
