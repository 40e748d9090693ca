//! Single-elimination brackets.
//!
//! Round 1 pairs a sport's teams in creation order. Each later round is
//! generated, inside the transaction that records its last result, from the
//! previous round's winners. A lone team in a round gets a bye and advances
//! immediately.
//!
//! ## Example
//!
//! ```no_run
//! use sports_day::bracket::{BracketManager, ResultOutcome};
//! use sports_day::db::Database;
//! use sports_day::Sport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let brackets = BracketManager::new(Arc::new(db.pool().clone()));
//!
//!     brackets.generate_bracket(Sport::Relay).await?;
//!     let first = &brackets.get_bracket(Sport::Relay).await?[0];
//!     if let Some(team) = first.game.team1_id {
//!         if let ResultOutcome::Champion { team_id } =
//!             brackets.record_result(first.game.id, team).await?
//!         {
//!             println!("Relay champion: team {team_id}");
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;
pub mod pairing;
mod results;

pub use manager::BracketManager;
pub use models::{
    BracketGenerated, BracketMatch, BracketSummary, Match, MatchId, MatchSlots, ResultOutcome,
};
pub use pairing::{Pairing, RoundProgress, assess_round, pair_teams};
