//! Identifier types for the schedule domain.
//!
//! Identifiers are opaque strings shared by both storage backends. Fresh
//! identifiers combine an entity prefix, the creation instant in
//! milliseconds and a random suffix, so a single client creating entities
//! faster than the clock advances never produces a collision.

use super::{EntityKind, ScheduleDomainError};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of base-36 characters in the random identifier suffix.
const SUFFIX_LENGTH: usize = 6;

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:expr, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for generated identifiers of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Creates an identifier from an existing value.
            ///
            /// # Errors
            ///
            /// Returns [`ScheduleDomainError::EmptyIdentifier`] when the value
            /// is empty after trimming.
            pub fn new(value: impl Into<String>) -> Result<Self, ScheduleDomainError> {
                let raw = value.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(ScheduleDomainError::EmptyIdentifier($kind));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Generates a fresh identifier from the clock and a random
            /// suffix.
            #[must_use]
            pub fn generate(clock: &impl Clock) -> Self {
                Self(generated_value(Self::PREFIX, clock))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Unique identifier for a project.
    ProjectId,
    EntityKind::Project,
    "p"
);

string_identifier!(
    /// Unique identifier for a task.
    TaskId,
    EntityKind::Task,
    "t"
);

string_identifier!(
    /// Unique identifier for a department.
    DepartmentId,
    EntityKind::Department,
    "d"
);

string_identifier!(
    /// Unique identifier for an employee.
    EmployeeId,
    EntityKind::Employee,
    "e"
);

fn generated_value(prefix: &str, clock: &impl Clock) -> String {
    let millis = clock.utc().timestamp_millis();
    format!("{prefix}{millis}{}", random_suffix())
}

fn random_suffix() -> String {
    let mut remaining = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LENGTH);
    for _ in 0..SUFFIX_LENGTH {
        let digit = usize::try_from(remaining.rem_euclid(36)).unwrap_or_default();
        remaining = remaining.div_euclid(36);
        suffix.push(char::from(BASE36_DIGITS.get(digit).copied().unwrap_or(b'0')));
    }
    suffix
}
