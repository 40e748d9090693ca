//! Deadlines for transactional operations.
//!
//! A transaction that outlives its deadline is dropped, which rolls it back,
//! and the caller gets a retryable [`TournamentError::Busy`].

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::errors::{TournamentError, TournamentResult};

/// Run `future` and turn an expired deadline into a busy signal.
///
/// # Example
///
/// ```no_run
/// use sports_day::db::timeouts::with_timeout;
/// use std::time::Duration;
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> sports_day::TournamentResult<()> {
/// with_timeout(Duration::from_secs(5), async {
///     sqlx::query("SELECT 1").execute(pool).await?;
///     Ok(())
/// })
/// .await
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> TournamentResult<T>
where
    F: Future<Output = TournamentResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(TournamentError::Busy(format!(
            "operation did not finish within {duration:?}"
        ))),
    }
}
