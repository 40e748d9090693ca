//! Roster data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::sport::Sport;

/// Student ID type
pub type StudentId = i64;

/// Which sports a student registered for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SportEligibility {
    pub cricket: bool,
    pub throwball: bool,
    pub kho_kho: bool,
    pub badminton_doubles: bool,
    pub relay: bool,
    pub tug_of_war: bool,
}

impl SportEligibility {
    /// Eligibility for exactly the given sports.
    pub fn only(sports: &[Sport]) -> Self {
        let mut eligibility = Self::default();
        for &sport in sports {
            eligibility.set(sport, true);
        }
        eligibility
    }

    pub fn is_eligible(&self, sport: Sport) -> bool {
        match sport {
            Sport::Cricket => self.cricket,
            Sport::Throwball => self.throwball,
            Sport::KhoKho => self.kho_kho,
            Sport::BadmintonDoubles => self.badminton_doubles,
            Sport::Relay => self.relay,
            Sport::TugOfWar => self.tug_of_war,
        }
    }

    pub fn set(&mut self, sport: Sport, eligible: bool) {
        let flag = match sport {
            Sport::Cricket => &mut self.cricket,
            Sport::Throwball => &mut self.throwball,
            Sport::KhoKho => &mut self.kho_kho,
            Sport::BadmintonDoubles => &mut self.badminton_doubles,
            Sport::Relay => &mut self.relay,
            Sport::TugOfWar => &mut self.tug_of_war,
        };
        *flag = eligible;
    }

    /// Sports this student registered for.
    pub fn sports(&self) -> Vec<Sport> {
        Sport::ALL
            .into_iter()
            .filter(|&sport| self.is_eligible(sport))
            .collect()
    }

    /// Sports registered in `self` but not in `other`.
    pub fn revoked_in(&self, other: &SportEligibility) -> Vec<Sport> {
        Sport::ALL
            .into_iter()
            .filter(|&sport| self.is_eligible(sport) && !other.is_eligible(sport))
            .collect()
    }
}

/// Student model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub roll_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub sports: SportEligibility,
    pub created_at: DateTime<Utc>,
}

/// Student registration (also used for full updates)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub roll_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub sports: SportEligibility,
}

impl NewStudent {
    /// Trim text fields and reject blanks.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        self.roll_number = self.roll_number.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::EmptyStudentName);
        }
        if self.roll_number.is_empty() {
            return Err(ValidationError::EmptyRollNumber);
        }
        self.email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        self.phone = self.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        Ok(self)
    }
}
