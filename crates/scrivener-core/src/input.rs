//! Caller-input validation for the boundary layer.

use crate::error::InputError;

/// Default input size limit: 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Reject empty or whitespace-only text, and text over `max_bytes` when a limit is set.
pub fn validate_text(text: &str, max_bytes: Option<usize>) -> Result<(), InputError> {
    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }
    if let Some(limit) = max_bytes
        && text.len() > limit
    {
        return Err(InputError::TooLarge {
            size: text.len(),
            limit,
        });
    }
    Ok(())
}
