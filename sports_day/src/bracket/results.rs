//! Match result processing.

use super::manager::{BracketManager, MATCH_COLUMNS, advance, match_from_row, round_exists};
use super::models::{MatchId, ResultOutcome};
use crate::db::{
    locks::{lock_bracket, set_lock_timeout},
    timeouts::with_timeout,
};
use crate::errors::{ConflictError, TournamentError, TournamentResult};
use crate::sport::Sport;
use crate::team::TeamId;
use sqlx::Row;

impl BracketManager {
    /// Record the winner of a match and advance the bracket if that
    /// completes the round.
    ///
    /// Recording the same winner twice is accepted and changes nothing. A
    /// different winner may replace an earlier result only until the next
    /// round has been generated from it.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no such match
    /// * `ValidationError` - the winner is not playing in the match
    /// * `ConflictError::ResultLocked` - the result already fed the next round
    /// * `Busy` - lock wait or deadline exceeded
    pub async fn record_result(
        &self,
        match_id: MatchId,
        winner_id: TeamId,
    ) -> TournamentResult<ResultOutcome> {
        with_timeout(
            self.locking.transaction_timeout,
            self.record_result_tx(match_id, winner_id),
        )
        .await
    }

    async fn record_result_tx(
        &self,
        match_id: MatchId,
        winner_id: TeamId,
    ) -> TournamentResult<ResultOutcome> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;

        let sport: String = sqlx::query("SELECT sport FROM matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TournamentError::not_found("match", match_id))?
            .get("sport");
        let sport = Sport::from_stored(&sport)?;

        lock_bracket(&mut tx, sport).await?;

        // Re-read under the lock; a reset may have removed the row meanwhile.
        let row = sqlx::query(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE"
        ))
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(TournamentError::not_found("match", match_id))?;
        let game = match_from_row(&row)?;

        game.validate_winner(winner_id)?;

        if game.is_completed {
            if game.winner_id == Some(winner_id) {
                log::debug!("Match {} already won by team {}", match_id, winner_id);
                return Ok(ResultOutcome::Unchanged);
            }
            if round_exists(&mut tx, sport, game.round + 1).await? {
                log::warn!(
                    "Rejected result change for {} match {}: round {} exists",
                    sport,
                    match_id,
                    game.round + 1
                );
                return Err(ConflictError::ResultLocked { match_id }.into());
            }
        }

        sqlx::query("UPDATE matches SET winner_id = $1, is_completed = TRUE WHERE id = $2")
            .bind(winner_id)
            .bind(match_id)
            .execute(&mut *tx)
            .await?;

        let outcome = advance(&mut tx, sport, game.round).await?;
        tx.commit().await?;

        log::info!(
            "Recorded {} round {} match {} ({}): winner team {}",
            sport,
            game.round,
            game.match_number,
            match_id,
            winner_id
        );
        Ok(outcome)
    }

    /// Delete every match of the sport, returning how many were removed.
    ///
    /// Holds the bracket lock, so a result being recorded either lands
    /// before the reset (and is wiped with its new round) or after it (and
    /// finds its match gone).
    pub async fn reset_bracket(&self, sport: Sport) -> TournamentResult<u64> {
        with_timeout(self.locking.transaction_timeout, self.reset_bracket_tx(sport)).await
    }

    async fn reset_bracket_tx(&self, sport: Sport) -> TournamentResult<u64> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;
        lock_bracket(&mut tx, sport).await?;

        let removed = sqlx::query("DELETE FROM matches WHERE sport = $1")
            .bind(sport.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        log::warn!("Reset {} bracket: removed {} match(es)", sport, removed);
        Ok(removed)
    }
}
