//! Argument guards run before any store access.

use super::error::{TaskServiceError, TaskServiceResult};
use uuid::Uuid;

/// Fails with [`TaskServiceError::NilParameter`] when `id` is the nil UUID.
///
/// # Errors
///
/// Returns [`TaskServiceError::NilParameter`] naming `operation` and
/// `parameter`.
pub fn require_identifier<I: AsRef<Uuid>>(
    operation: &'static str,
    parameter: &'static str,
    id: I,
) -> TaskServiceResult<()> {
    if id.as_ref().is_nil() {
        tracing::debug!(operation, parameter, "rejected nil identifier");
        return Err(TaskServiceError::NilParameter {
            operation,
            parameter,
        });
    }
    Ok(())
}
