//! Team registry.
//!
//! Owns team identity and membership and guarantees that a student plays for
//! at most one team per sport, even when several admins edit rosters at once.
//!
//! ## Example
//!
//! ```no_run
//! use sports_day::db::Database;
//! use sports_day::team::{NewTeam, TeamManager};
//! use sports_day::Sport;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let teams = TeamManager::new(Arc::new(db.pool().clone()));
//!
//!     let team = teams
//!         .create_team(NewTeam {
//!             name: "EEE Strikers".to_string(),
//!             sport: Sport::Cricket,
//!             member_ids: vec![1, 2, 3],
//!         })
//!         .await?;
//!     println!("Created team {}", team.id);
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::TeamManager;
pub use models::{NewTeam, Team, TeamId, TeamMember, TeamUpdate};
