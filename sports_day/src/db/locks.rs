//! Lock helpers shared by the team registry and the bracket engine.

use sqlx::{Postgres, Transaction};
use std::time::Duration;

use crate::errors::TournamentResult;
use crate::sport::Sport;

/// Advisory lock namespace for bracket mutations.
const BRACKET_LOCK_NAMESPACE: i32 = 0x5344;

/// Bound every lock wait in this transaction.
///
/// An expired wait fails with SQLSTATE 55P03, which surfaces as
/// [`TournamentError::Busy`](crate::TournamentError::Busy).
pub async fn set_lock_timeout(
    tx: &mut Transaction<'_, Postgres>,
    lock_timeout: Duration,
) -> TournamentResult<()> {
    // SET does not take bind parameters.
    let statement = format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis().max(1));
    sqlx::query(&statement).execute(&mut **tx).await?;
    Ok(())
}

/// Serialize bracket generation, result recording, reset and team deletion
/// for a sport across every server process. Released at commit or rollback.
pub async fn lock_bracket(tx: &mut Transaction<'_, Postgres>, sport: Sport) -> TournamentResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
        .bind(BRACKET_LOCK_NAMESPACE)
        .bind(sport.lock_key())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
