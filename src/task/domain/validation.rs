//! Trimming, length bounds and defaulting for task payloads.

use super::{TaskCreation, TaskDomainError, TaskPriority, TaskStatus, TaskUpdate};

/// Placeholder title used when a title is blank after trimming.
pub const UNTITLED: &str = "Untitled";

/// Maximum field lengths, counted in characters after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    /// Maximum title length.
    pub title: usize,
    /// Maximum headline length.
    pub headline: usize,
    /// Maximum description length.
    pub description: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            title: 128,
            headline: 64,
            description: 512,
        }
    }
}

/// Normalisation rules applied to task payloads before they reach storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRules {
    limits: FieldLimits,
    untitled: String,
}

impl Default for TaskRules {
    fn default() -> Self {
        Self::new(FieldLimits::default())
    }
}

impl TaskRules {
    /// Creates rules with the given limits and the default placeholder title.
    #[must_use]
    pub fn new(limits: FieldLimits) -> Self {
        Self {
            limits,
            untitled: UNTITLED.to_owned(),
        }
    }

    /// Replaces the placeholder title.
    #[must_use]
    pub fn with_untitled(mut self, untitled: impl Into<String>) -> Self {
        self.untitled = untitled.into();
        self
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> FieldLimits {
        self.limits
    }

    /// Trims, bounds and defaults a creation payload in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TooLong`] for the first field exceeding its
    /// limit. The payload is left trimmed but not defaulted in that case.
    pub fn normalize_creation(&self, creation: &mut TaskCreation) -> Result<(), TaskDomainError> {
        trim_in_place(&mut creation.title);
        trim_in_place(&mut creation.headline);
        trim_in_place(&mut creation.description);

        bounded_length("Title", "creation", &creation.title, self.limits.title)?;
        bounded_length("Headline", "creation", &creation.headline, self.limits.headline)?;
        bounded_length(
            "Description",
            "creation",
            &creation.description,
            self.limits.description,
        )?;

        default_if_empty(&mut creation.title, &self.untitled);
        creation.priority.get_or_insert(TaskPriority::Medium);
        creation.status.get_or_insert(TaskStatus::Incomplete);
        Ok(())
    }

    /// Trims, bounds and defaults an update payload in place.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TooLong`] for the first field exceeding its
    /// limit.
    pub fn normalize_update(&self, update: &mut TaskUpdate) -> Result<(), TaskDomainError> {
        trim_in_place(&mut update.title);
        trim_in_place(&mut update.headline);
        trim_in_place(&mut update.description);

        bounded_length("Title", "update", &update.title, self.limits.title)?;
        bounded_length("Headline", "update", &update.headline, self.limits.headline)?;
        bounded_length(
            "Description",
            "update",
            &update.description,
            self.limits.description,
        )?;

        default_if_empty(&mut update.title, &self.untitled);
        Ok(())
    }
}

/// Strips leading and trailing whitespace, including tabs and newlines.
#[must_use]
pub fn trim(value: &str) -> &str {
    value.trim()
}

/// Replaces `value` with its trimmed form without reallocating when it is
/// already trimmed.
pub fn trim_in_place(value: &mut String) {
    let trimmed = trim(value);
    if trimmed.len() != value.len() {
        *value = trimmed.to_owned();
    }
}

/// Fails when the trimmed value is longer than `max` characters.
///
/// # Errors
///
/// Returns [`TaskDomainError::TooLong`] naming `field` and `owner`.
pub fn bounded_length(
    field: &'static str,
    owner: &'static str,
    value: &str,
    max: usize,
) -> Result<(), TaskDomainError> {
    if trim(value).chars().count() > max {
        return Err(TaskDomainError::TooLong { field, owner, max });
    }
    Ok(())
}

/// Substitutes `fallback` when the trimmed value is empty.
pub fn default_if_empty(value: &mut String, fallback: &str) {
    if trim(value).is_empty() {
        fallback.clone_into(value);
    }
}
