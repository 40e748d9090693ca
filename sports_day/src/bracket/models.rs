//! Bracket data models.

use serde::{Deserialize, Serialize};

use crate::errors::{TournamentResult, ValidationError};
use crate::sport::Sport;
use crate::team::TeamId;

/// Match ID type
pub type MatchId = i64;

/// Who a match is between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSlots {
    /// No team in either slot
    Empty,
    /// A single team that advances without playing
    Bye(TeamId),
    /// Two teams that play each other
    Contest(TeamId, TeamId),
}

impl MatchSlots {
    pub fn from_teams(team1: Option<TeamId>, team2: Option<TeamId>) -> Self {
        match (team1, team2) {
            (Some(a), Some(b)) => MatchSlots::Contest(a, b),
            (Some(a), None) | (None, Some(a)) => MatchSlots::Bye(a),
            (None, None) => MatchSlots::Empty,
        }
    }

    pub fn contains(&self, team_id: TeamId) -> bool {
        match *self {
            MatchSlots::Empty => false,
            MatchSlots::Bye(a) => a == team_id,
            MatchSlots::Contest(a, b) => a == team_id || b == team_id,
        }
    }
}

/// One bracket match row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub sport: Sport,
    pub round: i32,
    pub match_number: i32,
    pub team1_id: Option<TeamId>,
    pub team2_id: Option<TeamId>,
    pub winner_id: Option<TeamId>,
    pub is_completed: bool,
}

impl Match {
    pub fn slots(&self) -> MatchSlots {
        MatchSlots::from_teams(self.team1_id, self.team2_id)
    }

    pub fn is_bye(&self) -> bool {
        matches!(self.slots(), MatchSlots::Bye(_))
    }

    /// A result may only name a team that is in the match.
    pub fn validate_winner(&self, winner_id: TeamId) -> TournamentResult<()> {
        match self.slots() {
            MatchSlots::Empty => Err(ValidationError::EmptyMatch(self.id).into()),
            slots if slots.contains(winner_id) => Ok(()),
            _ => Err(ValidationError::WinnerNotInMatch {
                match_id: self.id,
                winner_id,
            }
            .into()),
        }
    }
}

/// A match with team names resolved, as the bracket view shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    #[serde(flatten)]
    pub game: Match,
    pub team1_name: Option<String>,
    pub team2_name: Option<String>,
    pub winner_name: Option<String>,
}

/// Where a bracket stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSummary {
    /// Highest round generated so far (0 for an empty bracket)
    pub rounds: i32,
    /// Lowest round that still has an undecided match
    pub current_round: Option<i32>,
    /// Set once the final has been played
    pub champion: Option<TeamId>,
    pub champion_name: Option<String>,
}

impl BracketSummary {
    /// Summarize matches ordered by (round, match_number).
    pub fn from_matches(matches: &[BracketMatch]) -> Self {
        let rounds = matches.iter().map(|m| m.game.round).max().unwrap_or(0);
        let current_round = matches
            .iter()
            .filter(|m| !m.game.is_completed)
            .map(|m| m.game.round)
            .min();

        let last_round: Vec<&BracketMatch> =
            matches.iter().filter(|m| m.game.round == rounds).collect();
        let (champion, champion_name) = match last_round.as_slice() {
            [final_match] if final_match.game.is_completed && current_round.is_none() => {
                (final_match.game.winner_id, final_match.winner_name.clone())
            }
            _ => (None, None),
        };

        Self {
            rounds,
            current_round,
            champion,
            champion_name,
        }
    }
}

/// Result of [`generate_bracket`](super::BracketManager::generate_bracket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketGenerated {
    pub sport: Sport,
    pub teams: usize,
    pub matches: usize,
    pub byes: usize,
}

/// What recording a result led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResultOutcome {
    /// The same winner was already recorded
    Unchanged,
    /// Stored; the round still has undecided matches
    Recorded { round: i32 },
    /// Stored, and the next round was generated
    Advanced { next_round: i32, matches: usize },
    /// Stored; this was the final
    Champion { team_id: TeamId },
}
