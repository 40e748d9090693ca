//! Student roster: who is registered and which sports they signed up for.
//!
//! Persistence goes through [`StudentRepository`](crate::db::StudentRepository).

pub mod models;

pub use models::{NewStudent, SportEligibility, Student, StudentId};
