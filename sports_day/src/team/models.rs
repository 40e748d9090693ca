//! Team data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::ValidationError;
use crate::roster::StudentId;
use crate::sport::Sport;

/// Team ID type
pub type TeamId = i64;

/// A student on a team, as shown in team listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub student_id: StudentId,
    pub name: String,
    pub roll_number: String,
}

/// Team with its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub sport: Sport,
    pub created_at: DateTime<Utc>,
    pub members: Vec<TeamMember>,
}

/// Request to form a new team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub sport: Sport,
    #[serde(default)]
    pub member_ids: Vec<StudentId>,
}

/// Request to rename a team and replace its members.
///
/// The sport is never part of an update; a team stays in the sport it was
/// formed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamUpdate {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<StudentId>,
}

/// Trimmed name and member list that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidRoster {
    pub name: String,
    pub member_ids: Vec<StudentId>,
}

/// Check the parts of a team request that need no database.
///
/// Member order is kept as given; only duplicates are rejected.
pub(crate) fn validate_roster(
    name: &str,
    member_ids: &[StudentId],
) -> Result<ValidRoster, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyTeamName);
    }

    let mut seen = HashSet::with_capacity(member_ids.len());
    for &id in member_ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateMember(id));
        }
    }

    Ok(ValidRoster {
        name: name.to_string(),
        member_ids: member_ids.to_vec(),
    })
}
