//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while validating task payloads and values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A free-text field exceeds its maximum length after trimming.
    #[error("{field} of {owner} is too long: max length must be {max}")]
    TooLong {
        /// Name of the offending field.
        field: &'static str,
        /// Name of the payload holding the field.
        owner: &'static str,
        /// Maximum accepted length in characters.
        max: usize,
    },

    /// A calendar computation fell outside the representable date range.
    #[error("date out of range while computing the {0} window")]
    DateOutOfRange(&'static str),
}

/// Error returned while parsing identifiers from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} identifier: {value}")]
pub struct ParseIdError {
    kind: &'static str,
    value: String,
}

impl ParseIdError {
    pub(super) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Returns the kind of identifier that failed to parse.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }
}

/// Error returned while parsing task priorities from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);

/// Error returned while parsing task statuses from persistence or input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
