//! Error types for schedule domain validation and parsing.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Kind of schedule entity, used when reporting validation and lookup
/// failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A project owning an ordered list of tasks.
    Project,
    /// A time-boxed task within a project.
    Task,
    /// A department grouping employees.
    Department,
    /// An employee assignable to tasks.
    Employee,
}

impl EntityKind {
    /// Returns the lowercase entity label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Department => "department",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned while constructing schedule domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScheduleDomainError {
    /// An entity identifier is empty after trimming.
    #[error("{0} identifier must not be empty")]
    EmptyIdentifier(EntityKind),

    /// An entity display name is empty after trimming.
    #[error("{0} name must not be empty")]
    EmptyName(EntityKind),

    /// A progress value lies outside `0..=100`.
    #[error("progress {0} is outside the range 0..=100")]
    ProgressOutOfRange(i64),

    /// A task would end before it starts.
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// A calendar date could not be parsed.
    #[error("invalid calendar date '{0}'")]
    InvalidDate(String),

    /// A color token is empty after trimming.
    #[error("color token must not be empty")]
    EmptyColor,
}
