//! The closed set of sports contested on sports day.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::errors::{TournamentError, TournamentResult, ValidationError};

/// A sport with its own teams and its own bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Cricket,
    Throwball,
    KhoKho,
    BadmintonDoubles,
    Relay,
    TugOfWar,
}

impl Sport {
    /// Every sport, in registration-form order.
    pub const ALL: [Sport; 6] = [
        Sport::Cricket,
        Sport::Throwball,
        Sport::KhoKho,
        Sport::BadmintonDoubles,
        Sport::Relay,
        Sport::TugOfWar,
    ];

    /// Tag stored in the `sport` columns and used in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Sport::Cricket => "cricket",
            Sport::Throwball => "throwball",
            Sport::KhoKho => "kho_kho",
            Sport::BadmintonDoubles => "badminton_doubles",
            Sport::Relay => "relay",
            Sport::TugOfWar => "tug_of_war",
        }
    }

    /// Eligibility flag column on `students`.
    ///
    /// The column names match the tags, but this stays a separate function so
    /// queries never interpolate caller-provided text.
    pub(crate) fn eligibility_column(self) -> &'static str {
        match self {
            Sport::Cricket => "cricket",
            Sport::Throwball => "throwball",
            Sport::KhoKho => "kho_kho",
            Sport::BadmintonDoubles => "badminton_doubles",
            Sport::Relay => "relay",
            Sport::TugOfWar => "tug_of_war",
        }
    }

    /// Key for the per-sport bracket advisory lock.
    pub(crate) fn lock_key(self) -> i32 {
        match self {
            Sport::Cricket => 1,
            Sport::Throwball => 2,
            Sport::KhoKho => 3,
            Sport::BadmintonDoubles => 4,
            Sport::Relay => 5,
            Sport::TugOfWar => 6,
        }
    }

    /// Parse a tag read back from a `sport` column.
    ///
    /// Rows are only ever written from a `Sport`, so an unknown tag means the
    /// table was edited by hand.
    pub(crate) fn from_stored(tag: &str) -> TournamentResult<Sport> {
        tag.parse()
            .map_err(|_| TournamentError::Inconsistent(format!("unknown sport tag {tag}")))
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sport::ALL
            .into_iter()
            .find(|sport| sport.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownSport(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_tags_round_trip() {
        for sport in Sport::ALL {
            assert_eq!(sport.as_str().parse::<Sport>().unwrap(), sport);
        }
    }

    #[test]
    fn test_unknown_sport_rejected() {
        let err = "chess".parse::<Sport>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSport(ref s) if s == "chess"));
    }

    #[test]
    fn test_sport_tag_is_case_sensitive() {
        assert!("Cricket".parse::<Sport>().is_err());
    }

    #[test]
    fn test_stored_tag_parsing() {
        assert_eq!(Sport::from_stored("relay").unwrap(), Sport::Relay);
        assert!(matches!(
            Sport::from_stored("polo"),
            Err(TournamentError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_lock_keys_are_distinct() {
        let mut keys: Vec<i32> = Sport::ALL.iter().map(|s| s.lock_key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Sport::ALL.len());
    }

    #[test]
    fn test_serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&Sport::TugOfWar).unwrap();
        assert_eq!(json, "\"tug_of_war\"");
        let sport: Sport = serde_json::from_str("\"kho_kho\"").unwrap();
        assert_eq!(sport, Sport::KhoKho);
    }
}
