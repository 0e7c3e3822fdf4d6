//! Task name validation.
//!
//! The length rule is an entry-point gate: it is checked when a task is
//! created (and, when configured, when an edit is saved). Stored tasks are
//! never re-validated on load.

use serde::Serialize;

/// Minimum task name length, in characters.
pub const NAME_MIN_CHARS: usize = 2;

/// Maximum task name length, in characters.
pub const NAME_MAX_CHARS: usize = 32;

/// Outcome of [`validate_name`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// The rejection reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(reason) => Some(reason.as_str()),
        }
    }

    /// Convert into a `Result`, mapping a rejection to [`crate::Error::InvalidName`].
    pub fn into_result(self) -> crate::Result<()> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid(reason) => Err(crate::Error::InvalidName(reason)),
        }
    }
}

/// Check that `name` has between 2 and 32 characters.
///
/// Length is counted in Unicode scalar values, not bytes, and the name is not
/// trimmed first.
pub fn validate_name(name: &str) -> ValidationResult {
    let len = name.chars().count();
    if (NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(name_length_message())
    }
}

/// The user-facing message shown for an out-of-range name.
pub fn name_length_message() -> String {
    format!("enter between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters")
}
