//! Repository trait definitions for testability and dependency injection.
//!
//! The roster is a plain table with no tournament logic of its own; the only
//! rule it enforces is that a student stays put for a sport once a team
//! references them there.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use std::sync::Arc;

use super::{
    LockSettings,
    locks::set_lock_timeout,
    timeouts::with_timeout,
};
use crate::errors::{ConflictError, TournamentError, TournamentResult};
use crate::roster::{NewStudent, SportEligibility, Student, StudentId};
use crate::sport::Sport;

/// Trait for roster repository operations
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Register a student, returning the new ID
    async fn create_student(&self, student: &NewStudent) -> TournamentResult<StudentId>;

    /// Find student by ID
    async fn find_by_id(&self, student_id: StudentId) -> TournamentResult<Option<Student>>;

    /// All students ordered by name
    async fn list_students(&self) -> TournamentResult<Vec<Student>>;

    /// Students registered for `sport` who are not on any team for it yet
    async fn list_available(&self, sport: Sport) -> TournamentResult<Vec<Student>>;

    /// Replace a student's details
    async fn update_student(
        &self,
        student_id: StudentId,
        student: &NewStudent,
    ) -> TournamentResult<()>;

    /// Remove a student who is on no team
    async fn delete_student(&self, student_id: StudentId) -> TournamentResult<()>;
}

const STUDENT_COLUMNS: &str = "id, name, roll_number, email, phone, cricket, throwball, kho_kho, \
                               badminton_doubles, relay, tug_of_war, created_at";

/// Default PostgreSQL implementation of `StudentRepository`
#[derive(Clone)]
pub struct PgStudentRepository {
    pool: Arc<PgPool>,
    locking: LockSettings,
}

impl PgStudentRepository {
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

    fn student_from_row(row: &PgRow) -> Student {
        Student {
            id: row.get("id"),
            name: row.get("name"),
            roll_number: row.get("roll_number"),
            email: row.get("email"),
            phone: row.get("phone"),
            sports: SportEligibility {
                cricket: row.get("cricket"),
                throwball: row.get("throwball"),
                kho_kho: row.get("kho_kho"),
                badminton_doubles: row.get("badminton_doubles"),
                relay: row.get("relay"),
                tug_of_war: row.get("tug_of_war"),
            },
            created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        }
    }

    /// Sports among `sports` in which the student is on a team.
    async fn assigned_sports(
        tx: &mut Transaction<'_, Postgres>,
        student_id: StudentId,
        sports: &[Sport],
    ) -> TournamentResult<Vec<Sport>> {
        if sports.is_empty() {
            return Ok(Vec::new());
        }
        let tags: Vec<&str> = sports.iter().map(|s| s.as_str()).collect();
        let rows = sqlx::query(
            "SELECT sport FROM team_members WHERE student_id = $1 AND sport = ANY($2) ORDER BY sport",
        )
        .bind(student_id)
        .bind(&tags)
        .fetch_all(&mut **tx)
        .await?;

        rows.iter()
            .map(|row| Sport::from_stored(row.get("sport")))
            .collect()
    }
}

/// Fill in the roll number a unique violation was about.
fn with_roll_number(err: TournamentError, roll_number: &str) -> TournamentError {
    match err {
        TournamentError::Conflict(ConflictError::DuplicateRollNumber { .. }) => {
            ConflictError::DuplicateRollNumber {
                roll_number: roll_number.to_string(),
            }
            .into()
        }
        other => other,
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn create_student(&self, student: &NewStudent) -> TournamentResult<StudentId> {
        let student = student.clone().normalized()?;
        let row = sqlx::query(
            r#"
            INSERT INTO students
                (name, roll_number, email, phone, cricket, throwball, kho_kho, badminton_doubles, relay, tug_of_war)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(&student.name)
        .bind(&student.roll_number)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.sports.cricket)
        .bind(student.sports.throwball)
        .bind(student.sports.kho_kho)
        .bind(student.sports.badminton_doubles)
        .bind(student.sports.relay)
        .bind(student.sports.tug_of_war)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| with_roll_number(e.into(), &student.roll_number))?;

        let id: StudentId = row.get("id");
        log::info!("Registered student {} ({})", id, student.roll_number);
        Ok(id)
    }

    async fn find_by_id(&self, student_id: StudentId) -> TournamentResult<Option<Student>> {
        let row = sqlx::query(&format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"))
            .bind(student_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.as_ref().map(Self::student_from_row))
    }

    async fn list_students(&self) -> TournamentResult<Vec<Student>> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY name, id"
        ))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.iter().map(Self::student_from_row).collect())
    }

    async fn list_available(&self, sport: Sport) -> TournamentResult<Vec<Student>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {STUDENT_COLUMNS} FROM students s
            WHERE s.{column} = TRUE
              AND NOT EXISTS (
                  SELECT 1 FROM team_members tm WHERE tm.student_id = s.id AND tm.sport = $1
              )
            ORDER BY s.name, s.id
            "#,
            column = sport.eligibility_column(),
        ))
        .bind(sport.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.iter().map(Self::student_from_row).collect())
    }

    async fn update_student(
        &self,
        student_id: StudentId,
        student: &NewStudent,
    ) -> TournamentResult<()> {
        let student = student.clone().normalized()?;
        with_timeout(
            self.locking.transaction_timeout,
            self.update_student_tx(student_id, student),
        )
        .await
    }

    async fn delete_student(&self, student_id: StudentId) -> TournamentResult<()> {
        with_timeout(
            self.locking.transaction_timeout,
            self.delete_student_tx(student_id),
        )
        .await
    }
}

impl PgStudentRepository {
    async fn update_student_tx(
        &self,
        student_id: StudentId,
        student: NewStudent,
    ) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;

        let current = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 FOR UPDATE"
        ))
        .bind(student_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| Self::student_from_row(&row))
        .ok_or(TournamentError::not_found("student", student_id))?;

        let revoked = current.sports.revoked_in(&student.sports);
        if let Some(&sport) = Self::assigned_sports(&mut tx, student_id, &revoked).await?.first() {
            return Err(ConflictError::StudentOnTeam { student_id, sport }.into());
        }

        sqlx::query(
            r#"
            UPDATE students SET
                name = $1, roll_number = $2, email = $3, phone = $4,
                cricket = $5, throwball = $6, kho_kho = $7,
                badminton_doubles = $8, relay = $9, tug_of_war = $10
            WHERE id = $11
            "#,
        )
        .bind(&student.name)
        .bind(&student.roll_number)
        .bind(&student.email)
        .bind(&student.phone)
        .bind(student.sports.cricket)
        .bind(student.sports.throwball)
        .bind(student.sports.kho_kho)
        .bind(student.sports.badminton_doubles)
        .bind(student.sports.relay)
        .bind(student.sports.tug_of_war)
        .bind(student_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| with_roll_number(e.into(), &student.roll_number))?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_student_tx(&self, student_id: StudentId) -> TournamentResult<()> {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut tx, self.locking.lock_timeout).await?;

        let exists = sqlx::query("SELECT id FROM students WHERE id = $1 FOR UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(TournamentError::not_found("student", student_id));
        }

        if let Some(&sport) = Self::assigned_sports(&mut tx, student_id, &Sport::ALL)
            .await?
            .first()
        {
            return Err(ConflictError::StudentOnTeam { student_id, sport }.into());
        }

        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(student_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("Deleted student {}", student_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_roll_number_fills_conflict() {
        let err = TournamentError::from(ConflictError::DuplicateRollNumber {
            roll_number: String::new(),
        });
        let err = with_roll_number(err, "21EE042");
        assert!(matches!(
            err,
            TournamentError::Conflict(ConflictError::DuplicateRollNumber { ref roll_number })
                if roll_number == "21EE042"
        ));
    }

    #[test]
    fn test_with_roll_number_leaves_other_errors() {
        let err = with_roll_number(TournamentError::Busy("pool".into()), "21EE042");
        assert!(matches!(err, TournamentError::Busy(_)));
    }
}
