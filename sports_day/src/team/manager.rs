//! Team registry with conflict-safe roster assignment.
#![allow(clippy::needless_raw_string_hashes)]

use super::models::{NewTeam, Team, TeamId, TeamMember, TeamUpdate, ValidRoster, validate_roster};
use crate::db::{
    LockSettings,
    locks::{lock_bracket, set_lock_timeout},
    timeouts::with_timeout,
};
use crate::errors::{ConflictError, TournamentError, TournamentResult, ValidationError};
use crate::roster::StudentId;
use crate::sport::Sport;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

/// Team manager
///
/// Every mutation runs in one transaction with a bounded `lock_timeout`. The
/// at-most-one-team-per-student-per-sport rule is checked with locking reads
/// and backed by the `team_members_student_sport_key` constraint, so two
/// admins racing for the same student get exactly one success and one
/// [`ConflictError`].
#[derive(Clone)]
pub struct TeamManager {
    pool: Arc<PgPool>,
    locking: LockSettings,
}

impl TeamManager {
    /// Create a new team manager
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

    /// Form a team for a sport.
    ///
    /// # Errors
    ///
    /// * `ValidationError` - blank name, repeated member, student not
    ///   registered for the sport
    /// * `NotFound` - a member does not exist
    /// * `ConflictError::StudentAlreadyAssigned` - a member is on another team
    ///   of this sport
    /// * `ConflictError::DuplicateTeamName` - name taken in this sport
    /// * `Busy` - lock wait or deadline exceeded
    pub async fn create_team(&self, team: NewTeam) -> TournamentResult<Team> {
        let roster = validate_roster(&team.name, &team.member_ids)?;
        with_timeout(
            self.locking.transaction_timeout,
            self.create_team_tx(team.sport, roster),
        )
        .await
    }

    async fn create_team_tx(&self, sport: Sport, roster: ValidRoster) -> TournamentResult<Team> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;

        check_members_eligible(&mut tx, sport, &roster.member_ids).await?;
        check_unassigned(&mut tx, sport, &roster.member_ids, None).await?;
        check_name_free(&mut tx, sport, &roster.name, None).await?;

        let row = sqlx::query(
            "INSERT INTO teams (team_name, sport) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(&roster.name)
        .bind(sport.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| with_team_name(e.into(), &roster.name))?;

        let team_id: TeamId = row.get("id");
        let created_at = row.get::<chrono::NaiveDateTime, _>("created_at").and_utc();

        insert_members(&mut tx, team_id, sport, &roster.member_ids).await?;
        let members = fetch_members(&mut tx, &[team_id]).await?.remove(&team_id);

        tx.commit().await?;
        log::info!(
            "Created {} team {} '{}' with {} member(s)",
            sport,
            team_id,
            roster.name,
            roster.member_ids.len()
        );

        Ok(Team {
            id: team_id,
            name: roster.name,
            sport,
            created_at,
            members: members.unwrap_or_default(),
        })
    }

    /// Rename a team and replace its members atomically.
    ///
    /// Assignment conflicts with other teams of the same sport are re-checked,
    /// so an update can never put a student on two teams.
    pub async fn update_team(&self, team_id: TeamId, update: TeamUpdate) -> TournamentResult<Team> {
        let roster = validate_roster(&update.name, &update.member_ids)?;
        with_timeout(
            self.locking.transaction_timeout,
            self.update_team_tx(team_id, roster),
        )
        .await
    }

    async fn update_team_tx(&self, team_id: TeamId, roster: ValidRoster) -> TournamentResult<Team> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;

        let (sport, created_at) = lock_team(&mut tx, team_id).await?;

        check_members_eligible(&mut tx, sport, &roster.member_ids).await?;
        check_unassigned(&mut tx, sport, &roster.member_ids, Some(team_id)).await?;
        check_name_free(&mut tx, sport, &roster.name, Some(team_id)).await?;

        sqlx::query("UPDATE teams SET team_name = $1 WHERE id = $2")
            .bind(&roster.name)
            .bind(team_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| with_team_name(e.into(), &roster.name))?;

        sqlx::query("DELETE FROM team_members WHERE team_id = $1")
            .bind(team_id)
            .execute(&mut *tx)
            .await?;
        insert_members(&mut tx, team_id, sport, &roster.member_ids).await?;
        let members = fetch_members(&mut tx, &[team_id]).await?.remove(&team_id);

        tx.commit().await?;
        log::info!(
            "Updated {} team {} '{}' ({} member(s))",
            sport,
            team_id,
            roster.name,
            roster.member_ids.len()
        );

        Ok(Team {
            id: team_id,
            name: roster.name,
            sport,
            created_at,
            members: members.unwrap_or_default(),
        })
    }

    /// Delete a team and its memberships.
    ///
    /// A team that any bracket match still references cannot be deleted;
    /// reset the sport's bracket first.
    pub async fn delete_team(&self, team_id: TeamId) -> TournamentResult<()> {
        with_timeout(self.locking.transaction_timeout, self.delete_team_tx(team_id)).await
    }

    async fn delete_team_tx(&self, team_id: TeamId) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;

        let sport: String = sqlx::query("SELECT sport FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TournamentError::not_found("team", team_id))?
            .get("sport");

        // Bracket lock before row lock, the order bracket generation uses.
        lock_bracket(&mut tx, Sport::from_stored(&sport)?).await?;
        let (sport, _) = lock_team(&mut tx, team_id).await?;

        let referenced: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM matches
             WHERE team1_id = $1 OR team2_id = $1 OR winner_id = $1",
        )
        .bind(team_id)
        .fetch_one(&mut *tx)
        .await?
        .get("n");

        if referenced > 0 {
            return Err(ConflictError::TeamInBracket { team_id }.into());
        }

        sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(team_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("Deleted {} team {}", sport, team_id);
        Ok(())
    }

    /// Get a team with its members
    pub async fn get_team(&self, team_id: TeamId) -> TournamentResult<Team> {
        let row = sqlx::query("SELECT id, team_name, sport, created_at FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(TournamentError::not_found("team", team_id))?;

        let mut conn = self.pool.acquire().await?;
        let mut members = member_rows(&mut *conn, &[team_id]).await?;

        Ok(Team {
            id: team_id,
            name: row.get("team_name"),
            sport: Sport::from_stored(row.get("sport"))?,
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            members: members.remove(&team_id).unwrap_or_default(),
        })
    }

    /// All teams of a sport in creation order, with members
    pub async fn list_teams(&self, sport: Sport) -> TournamentResult<Vec<Team>> {
        let rows = sqlx::query(
            r#"
            SELECT id, team_name, created_at
            FROM teams
            WHERE sport = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(sport.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        let ids: Vec<TeamId> = rows.iter().map(|r| r.get("id")).collect();
        let mut conn = self.pool.acquire().await?;
        let mut members = member_rows(&mut *conn, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id: TeamId = row.get("id");
                Team {
                    id,
                    name: row.get("team_name"),
                    sport,
                    created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
                    members: members.remove(&id).unwrap_or_default(),
                }
            })
            .collect())
    }
}

/// Lock a team row, returning its sport and creation time.
async fn lock_team(
    tx: &mut Transaction<'_, Postgres>,
    team_id: TeamId,
) -> TournamentResult<(Sport, chrono::DateTime<chrono::Utc>)> {
    let row = sqlx::query("SELECT sport, created_at FROM teams WHERE id = $1 FOR UPDATE")
        .bind(team_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(TournamentError::not_found("team", team_id))?;

    Ok((
        Sport::from_stored(row.get("sport"))?,
        row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    ))
}

/// Members must exist and be registered for the sport.
///
/// `FOR SHARE` keeps the rows from being edited or deleted until commit.
async fn check_members_eligible(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    member_ids: &[StudentId],
) -> TournamentResult<()> {
    if member_ids.is_empty() {
        return Ok(());
    }

    let rows = sqlx::query(&format!(
        "SELECT id, {column} AS eligible FROM students WHERE id = ANY($1) ORDER BY id FOR SHARE",
        column = sport.eligibility_column(),
    ))
    .bind(member_ids)
    .fetch_all(&mut **tx)
    .await?;

    let eligibility: HashMap<StudentId, bool> = rows
        .iter()
        .map(|row| (row.get("id"), row.get("eligible")))
        .collect();

    for &student_id in member_ids {
        match eligibility.get(&student_id) {
            None => return Err(TournamentError::not_found("student", student_id)),
            Some(false) => {
                return Err(ValidationError::NotEligible { student_id, sport }.into());
            }
            Some(true) => {}
        }
    }
    Ok(())
}

/// Lock any existing assignment of these students in this sport.
///
/// Rows of `exclude_team` (the team being updated) do not count.
async fn check_unassigned(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    member_ids: &[StudentId],
    exclude_team: Option<TeamId>,
) -> TournamentResult<()> {
    if member_ids.is_empty() {
        return Ok(());
    }

    let rows = sqlx::query(
        r#"
        SELECT student_id FROM team_members
        WHERE student_id = ANY($1) AND sport = $2 AND ($3::BIGINT IS NULL OR team_id <> $3)
        ORDER BY student_id
        FOR UPDATE
        "#,
    )
    .bind(member_ids)
    .bind(sport.as_str())
    .bind(exclude_team)
    .fetch_all(&mut **tx)
    .await?;

    if rows.is_empty() {
        return Ok(());
    }

    let student_ids: Vec<StudentId> = rows.iter().map(|r| r.get("student_id")).collect();
    log::warn!("{} assignment conflict for students {:?}", sport, student_ids);
    Err(ConflictError::StudentAlreadyAssigned { student_ids }.into())
}

/// Lock any other team of this sport already using the name.
async fn check_name_free(
    tx: &mut Transaction<'_, Postgres>,
    sport: Sport,
    name: &str,
    exclude_team: Option<TeamId>,
) -> TournamentResult<()> {
    let existing = sqlx::query(
        r#"
        SELECT id FROM teams
        WHERE team_name = $1 AND sport = $2 AND ($3::BIGINT IS NULL OR id <> $3)
        FOR UPDATE
        "#,
    )
    .bind(name)
    .bind(sport.as_str())
    .bind(exclude_team)
    .fetch_optional(&mut **tx)
    .await?;

    match existing {
        Some(_) => {
            log::warn!("{} team name '{}' already taken", sport, name);
            Err(ConflictError::DuplicateTeamName {
                name: name.to_string(),
            }
            .into())
        }
        None => Ok(()),
    }
}

async fn insert_members(
    tx: &mut Transaction<'_, Postgres>,
    team_id: TeamId,
    sport: Sport,
    member_ids: &[StudentId],
) -> TournamentResult<()> {
    if member_ids.is_empty() {
        return Ok(());
    }

    // A racing transaction that locked zero rows in `check_unassigned` ends
    // up here; the unique constraint turns that into a conflict.
    sqlx::query(
        r#"
        INSERT INTO team_members (team_id, student_id, sport)
        SELECT $1, student_id, $3 FROM UNNEST($2::BIGINT[]) AS student_id
        "#,
    )
    .bind(team_id)
    .bind(member_ids)
    .bind(sport.as_str())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn fetch_members(
    tx: &mut Transaction<'_, Postgres>,
    team_ids: &[TeamId],
) -> TournamentResult<HashMap<TeamId, Vec<TeamMember>>> {
    member_rows(&mut **tx, team_ids).await
}

async fn member_rows(
    conn: &mut sqlx::PgConnection,
    team_ids: &[TeamId],
) -> TournamentResult<HashMap<TeamId, Vec<TeamMember>>> {
    let mut members: HashMap<TeamId, Vec<TeamMember>> = HashMap::new();
    if team_ids.is_empty() {
        return Ok(members);
    }

    let rows = sqlx::query(
        r#"
        SELECT tm.team_id, s.id AS student_id, s.name, s.roll_number
        FROM team_members tm
        JOIN students s ON s.id = tm.student_id
        WHERE tm.team_id = ANY($1)
        ORDER BY s.name, s.id
        "#,
    )
    .bind(team_ids)
    .fetch_all(conn)
    .await?;

    for row in rows {
        members
            .entry(row.get("team_id"))
            .or_default()
            .push(TeamMember {
                student_id: row.get("student_id"),
                name: row.get("name"),
                roll_number: row.get("roll_number"),
            });
    }
    Ok(members)
}

/// Fill in the team name a unique violation was about.
fn with_team_name(err: TournamentError, name: &str) -> TournamentError {
    match err {
        TournamentError::Conflict(ConflictError::DuplicateTeamName { .. }) => {
            ConflictError::DuplicateTeamName {
                name: name.to_string(),
            }
            .into()
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_team_name_fills_conflict() {
        let err = TournamentError::from(ConflictError::DuplicateTeamName {
            name: String::new(),
        });
        match with_team_name(err, "Strikers") {
            TournamentError::Conflict(ConflictError::DuplicateTeamName { name }) => {
                assert_eq!(name, "Strikers")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_with_team_name_keeps_other_conflicts() {
        let err = TournamentError::from(ConflictError::StudentAlreadyAssigned {
            student_ids: vec![1],
        });
        assert!(matches!(
            with_team_name(err, "Strikers"),
            TournamentError::Conflict(ConflictError::StudentAlreadyAssigned { .. })
        ));
    }
}
