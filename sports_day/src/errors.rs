//! Tournament error types.
//!
//! Every core operation returns [`TournamentResult`]. The variants form the
//! taxonomy the HTTP boundary maps onto status codes: validation failures,
//! conflicts (retryable after a refresh), busy signals (retryable as is),
//! missing rows and internal failures.

use thiserror::Error;

use crate::sport::Sport;

/// Malformed input or a rule the caller could have checked up front.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown sport: {0}")]
    UnknownSport(String),

    #[error("Team name must not be empty")]
    EmptyTeamName,

    #[error("Student {0} appears more than once in the team")]
    DuplicateMember(i64),

    #[error("Student {student_id} is not registered for {sport}")]
    NotEligible { student_id: i64, sport: Sport },

    #[error("Need at least 2 teams to generate a bracket for {sport}, found {found}")]
    InsufficientTeams { sport: Sport, found: usize },

    #[error("Team {winner_id} is not playing in match {match_id}")]
    WinnerNotInMatch { match_id: i64, winner_id: i64 },

    #[error("Match {0} has no teams")]
    EmptyMatch(i64),

    #[error("Student name must not be empty")]
    EmptyStudentName,

    #[error("Roll number must not be empty")]
    EmptyRollNumber,
}

/// A uniqueness or concurrency invariant rejected the mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("One or more students are already assigned to another team")]
    StudentAlreadyAssigned { student_ids: Vec<i64> },

    #[error("Team name already exists for this sport: {name}")]
    DuplicateTeamName { name: String },

    #[error("Roll number already exists: {roll_number}")]
    DuplicateRollNumber { roll_number: String },

    #[error("Team {team_id} is part of a bracket; reset the bracket first")]
    TeamInBracket { team_id: i64 },

    #[error("Student {student_id} is on a {sport} team")]
    StudentOnTeam { student_id: i64, sport: Sport },

    #[error("Match {match_id} already fed the next round; reset the bracket to change it")]
    ResultLocked { match_id: i64 },

    #[error("Row is still referenced: {0}")]
    Referenced(String),

    #[error("Concurrent change detected: {0}")]
    Constraint(String),
}

impl ConflictError {
    /// Short machine-readable tag for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ConflictError::StudentAlreadyAssigned { .. } => "student_already_assigned",
            ConflictError::DuplicateTeamName { .. } => "duplicate_team_name",
            ConflictError::DuplicateRollNumber { .. } => "duplicate_roll_number",
            ConflictError::TeamInBracket { .. } => "team_in_bracket",
            ConflictError::StudentOnTeam { .. } => "student_on_team",
            ConflictError::ResultLocked { .. } => "result_locked",
            ConflictError::Referenced(_) => "referenced",
            ConflictError::Constraint(_) => "constraint",
        }
    }
}

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Resource busy: {0}")]
    Busy(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Inconsistent bracket state: {0}")]
    Inconsistent(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type TournamentResult<T> = Result<T, TournamentError>;

// SQLSTATE codes the classification cares about.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const LOCK_NOT_AVAILABLE: &str = "55P03";
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const QUERY_CANCELED: &str = "57014";

impl TournamentError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        TournamentError::NotFound { entity, id }
    }

    /// Whether resubmitting (possibly after refreshing state) can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TournamentError::Conflict(_) | TournamentError::Busy(_))
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors and inconsistencies are logged server-side; callers
    /// only learn that something went wrong.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::Inconsistent(_) => {
                "Internal server error".to_string()
            }
            TournamentError::Busy(_) => {
                "Server busy. Please wait a moment and try again.".to_string()
            }
            TournamentError::Conflict(conflict) => {
                format!("{conflict}. Please refresh and try again.")
            }
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for TournamentError {
    fn from(err: sqlx::Error) -> Self {
        classify(&err).unwrap_or(TournamentError::Database(err))
    }
}

/// Recognise pool exhaustion, lock waits and constraint violations.
fn classify(err: &sqlx::Error) -> Option<TournamentError> {
    let db_err = match err {
        sqlx::Error::PoolTimedOut => {
            return Some(TournamentError::Busy(
                "timed out waiting for a database connection".to_string(),
            ));
        }
        sqlx::Error::Database(db_err) => db_err,
        _ => return None,
    };

    let mapped = match db_err.code().as_deref() {
        Some(LOCK_NOT_AVAILABLE) => {
            TournamentError::Busy("timed out waiting for a row lock".to_string())
        }
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
            TournamentError::Busy("concurrent transaction aborted".to_string())
        }
        Some(QUERY_CANCELED) => TournamentError::Busy("statement cancelled".to_string()),
        Some(UNIQUE_VIOLATION) => TournamentError::Conflict(unique_conflict(db_err.constraint())),
        Some(FOREIGN_KEY_VIOLATION) => TournamentError::Conflict(ConflictError::Referenced(
            db_err.constraint().unwrap_or("unknown").to_string(),
        )),
        _ => return None,
    };
    Some(mapped)
}

/// Map a unique constraint (see the migrations) to the conflict it guards.
fn unique_conflict(constraint: Option<&str>) -> ConflictError {
    match constraint {
        Some("team_members_student_sport_key") => {
            ConflictError::StudentAlreadyAssigned { student_ids: Vec::new() }
        }
        Some("teams_name_sport_key") => ConflictError::DuplicateTeamName { name: String::new() },
        Some("students_roll_number_key") => ConflictError::DuplicateRollNumber {
            roll_number: String::new(),
        },
        Some(other) => ConflictError::Constraint(other.to_string()),
        None => ConflictError::Constraint("unique".to_string()),
    }
}
