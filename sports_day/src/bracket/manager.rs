//! Bracket generation and round advancement.
#![allow(clippy::needless_raw_string_hashes)]

use super::models::{BracketGenerated, BracketMatch, Match, MatchId, ResultOutcome};
use super::pairing::{Pairing, RoundProgress, assess_round, pair_teams};
use crate::db::{
    LockSettings,
    locks::{lock_bracket, set_lock_timeout},
    timeouts::with_timeout,
};
use crate::errors::{TournamentError, TournamentResult, ValidationError};
use crate::sport::Sport;
use crate::team::TeamId;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

pub(super) const MATCH_COLUMNS: &str =
    "id, sport, round, match_number, team1_id, team2_id, winner_id, is_completed";

/// Bracket manager
///
/// Generation, result recording, reset and team deletion for a sport all
/// hold the sport's bracket lock, so at most one of them changes a bracket at a time
/// no matter how many server processes share the database.
#[derive(Clone)]
pub struct BracketManager {
    pub(super) pool: Arc<PgPool>,
    pub(super) locking: LockSettings,
}

impl BracketManager {
    /// Create a new bracket manager
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            locking: LockSettings::default(),
        }
    }

    /// Override the lock and transaction bounds.
    pub fn with_lock_settings(mut self, locking: LockSettings) -> Self {
        self.locking = locking;
        self
    }

    /// Replace the sport's bracket with a fresh round 1.
    ///
    /// Teams are paired in creation order; an odd team out gets a bye that is
    /// stored already won. Any existing matches for the sport are discarded.
    ///
    /// # Errors
    ///
    /// * `ValidationError::InsufficientTeams` - fewer than 2 teams
    /// * `Busy` - lock wait or deadline exceeded
    pub async fn generate_bracket(&self, sport: Sport) -> TournamentResult<BracketGenerated> {
        with_timeout(self.locking.transaction_timeout, self.generate_bracket_tx(sport)).await
    }

    async fn generate_bracket_tx(&self, sport: Sport) -> TournamentResult<BracketGenerated> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;
        lock_bracket(&mut tx, sport).await?;

        // FOR SHARE keeps teams from being renamed or deleted mid-generation.
        let team_ids: Vec<TeamId> = sqlx::query(
            "SELECT id FROM teams WHERE sport = $1 ORDER BY created_at, id FOR SHARE",
        )
        .bind(sport.as_str())
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(|row| row.get("id"))
        .collect();

        if team_ids.len() < 2 {
            return Err(ValidationError::InsufficientTeams {
                sport,
                found: team_ids.len(),
            }
            .into());
        }

        let discarded = sqlx::query("DELETE FROM matches WHERE sport = $1")
            .bind(sport.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let pairings = pair_teams(&team_ids);
        insert_round(&mut tx, sport, 1, &pairings).await?;

        tx.commit().await?;

        let byes = pairings.iter().filter(|p| p.bye_winner().is_some()).count();
        if discarded > 0 {
            log::warn!("Discarded {} existing {} match(es)", discarded, sport);
        }
        log::info!(
            "Generated {} bracket: {} teams, {} round-1 match(es), {} bye(s)",
            sport,
            team_ids.len(),
            pairings.len(),
            byes
        );

        Ok(BracketGenerated {
            sport,
            teams: team_ids.len(),
            matches: pairings.len(),
            byes,
        })
    }

    /// The sport's matches by round and match number, with team names.
    pub async fn get_bracket(&self, sport: Sport) -> TournamentResult<Vec<BracketMatch>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.sport, m.round, m.match_number,
                   m.team1_id, m.team2_id, m.winner_id, m.is_completed,
                   t1.team_name AS team1_name,
                   t2.team_name AS team2_name,
                   w.team_name AS winner_name
            FROM matches m
            LEFT JOIN teams t1 ON t1.id = m.team1_id
            LEFT JOIN teams t2 ON t2.id = m.team2_id
            LEFT JOIN teams w ON w.id = m.winner_id
            WHERE m.sport = $1
            ORDER BY m.round, m.match_number
            "#,
        )
        .bind(sport.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| -> TournamentResult<BracketMatch> {
                Ok(BracketMatch {
                    game: match_from_row(row)?,
                    team1_name: row.get("team1_name"),
                    team2_name: row.get("team2_name"),
                    winner_name: row.get("winner_name"),
                })
            })
            .collect()
    }

    /// Get a single match
    pub async fn get_match(&self, match_id: MatchId) -> TournamentResult<Match> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(match_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(TournamentError::not_found("match", match_id))?;
        match_from_row(&row)
    }
}

/// Move the winners of `round` on once the whole round is decided.
///
/// Runs inside the caller's transaction, which must already hold the sport's
/// bracket lock. Calling it again for a round that already advanced changes
/// nothing.
pub(super) async fn advance(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    round: i32,
) -> TournamentResult<ResultOutcome> {
    let matches = fetch_round(tx, sport, round).await?;

    match assess_round(&matches)? {
        RoundProgress::Empty | RoundProgress::InProgress { .. } => {
            Ok(ResultOutcome::Recorded { round })
        }
        RoundProgress::Final { champion } => {
            log::info!("{} champion decided: team {}", sport, champion);
            Ok(ResultOutcome::Champion { team_id: champion })
        }
        RoundProgress::Complete { winners } => {
            let next_round = round + 1;
            if round_exists(tx, sport, next_round).await? {
                log::debug!("{} round {} already generated", sport, next_round);
                return Ok(ResultOutcome::Recorded { round });
            }

            let pairings = pair_teams(&winners);
            insert_round(tx, sport, next_round, &pairings).await?;
            log::info!(
                "{} round {} complete; generated {} match(es) for round {}",
                sport,
                round,
                pairings.len(),
                next_round
            );
            Ok(ResultOutcome::Advanced {
                next_round,
                matches: pairings.len(),
            })
        }
    }
}

/// Lock and read a round ordered by match number.
async fn fetch_round(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    round: i32,
) -> TournamentResult<Vec<Match>> {
    let rows = sqlx::query(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches
         WHERE sport = $1 AND round = $2
         ORDER BY match_number
         FOR UPDATE"
    ))
    .bind(sport.as_str())
    .bind(round)
    .fetch_all(&mut **tx)
    .await?;

    rows.iter().map(match_from_row).collect()
}

pub(super) async fn round_exists(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    round: i32,
) -> TournamentResult<bool> {
    let present: bool = sqlx::query(
        "SELECT EXISTS (SELECT 1 FROM matches WHERE sport = $1 AND round = $2) AS present",
    )
    .bind(sport.as_str())
    .bind(round)
    .fetch_one(&mut **tx)
    .await?
    .get("present");
    Ok(present)
}

/// Insert one round; byes go in completed with their team as winner.
async fn insert_round(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    round: i32,
    pairings: &[Pairing],
) -> TournamentResult<()> {
    for pairing in pairings {
        let bye_winner = pairing.bye_winner();
        sqlx::query(
            r#"
            INSERT INTO matches
                (sport, round, match_number, team1_id, team2_id, winner_id, is_completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(sport.as_str())
        .bind(round)
        .bind(pairing.match_number)
        .bind(pairing.team1)
        .bind(pairing.team2)
        .bind(bye_winner)
        .bind(bye_winner.is_some())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub(super) fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    Ok(Match {
        id: row.get("id"),
        sport: Sport::from_stored(row.get("sport"))?,
        round: row.get("round"),
        match_number: row.get("match_number"),
        team1_id: row.get("team1_id"),
        team2_id: row.get("team2_id"),
        winner_id: row.get("winner_id"),
        is_completed: row.get("is_completed"),
    })
}
