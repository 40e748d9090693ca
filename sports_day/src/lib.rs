//! # Sports Day
//!
//! A single-elimination tournament engine for a college sports day, backed by
//! PostgreSQL.
//!
//! Students register for any of the six sports, admins form teams from them,
//! and each sport gets its own bracket that advances automatically as match
//! results come in.
//!
//! ## Architecture
//!
//! - **Roster** ([`roster`], [`db::StudentRepository`]): students and the
//!   sports they signed up for
//! - **Team registry** ([`team`]): team membership, with at most one team per
//!   student per sport even under concurrent edits
//! - **Bracket engine** ([`bracket`]): round-1 pairing, round completion and
//!   advancement, result recording
//!
//! Every mutation runs in a single transaction with a bounded lock wait and
//! an overall deadline. Failures come back as a [`TournamentError`] that tells
//! validation problems, conflicts, busy signals and internal faults apart.
//!
//! ## Example
//!
//! ```
//! use sports_day::{Sport, bracket::pair_teams};
//!
//! let sport: Sport = "kho_kho".parse().unwrap();
//! assert_eq!(sport, Sport::KhoKho);
//!
//! // Five teams: two matches and a bye.
//! let round1 = pair_teams(&[1, 2, 3, 4, 5]);
//! assert_eq!(round1.len(), 3);
//! assert_eq!(round1[2].bye_winner(), Some(5));
//! ```

/// Single-elimination brackets and match results.
pub mod bracket;
pub use bracket::{BracketManager, BracketMatch, BracketSummary, Match, ResultOutcome};

/// Database pool, configuration and repository layer.
pub mod db;

/// Error taxonomy shared by every operation.
pub mod errors;
pub use errors::{ConflictError, TournamentError, TournamentResult, ValidationError};

/// Students and sport eligibility.
pub mod roster;

pub mod sport;
pub use sport::Sport;

/// Team formation and membership.
pub mod team;
pub use team::{NewTeam, Team, TeamManager, TeamUpdate};
