//! Team entity.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-generated surrogate key of a persisted team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(i64);

impl TeamId {
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for TeamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for team write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamValidationError {
    BlankName,
}

impl Display for TeamValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "team name must not be blank"),
        }
    }
}

impl Error for TeamValidationError {}

/// A team that members can belong to.
///
/// Members of a team are not held here; use
/// `TeamRepository::find_members` to walk the inverse side.
#[derive(Debug, Clone, Serialize)]
pub struct Team {
    id: Option<TeamId>,
    pub name: String,
}

impl Team {
    /// Creates a transient team. The id is assigned on first save.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Rebuilds a persisted team from stored columns.
    pub(crate) fn from_row(id: TeamId, name: String) -> Self {
        Self { id: Some(id), name }
    }

    pub fn id(&self) -> Option<TeamId> {
        self.id
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub(crate) fn assign_id(&mut self, id: TeamId) {
        debug_assert!(self.id.is_none(), "team id is immutable once assigned");
        self.id = Some(id);
    }

    pub fn validate(&self) -> Result<(), TeamValidationError> {
        if self.name.trim().is_empty() {
            return Err(TeamValidationError::BlankName);
        }
        Ok(())
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(left), Some(right)) if left == right)
    }
}

#[cfg(test)]
mod tests {
    use super::{Team, TeamId, TeamValidationError};

    #[test]
    fn transient_teams_are_never_equal() {
        let team = Team::new("teamA");
        assert_ne!(team, team.clone());
    }

    #[test]
    fn persisted_teams_compare_by_id_only() {
        let left = Team::from_row(TeamId::new(7), "teamA".to_string());
        let right = Team::from_row(TeamId::new(7), "renamed".to_string());
        assert_eq!(left, right);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            Team::new("  ").validate(),
            Err(TeamValidationError::BlankName)
        );
    }
}
