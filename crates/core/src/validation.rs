//! Input validation utilities.

use crate::{CoreResult, TriageError};

/// Validates that a namespace is safe to use as a single directory name.
///
/// The namespace becomes the `<namespace>` segment of
/// `artifacts/<namespace>/users/<identity>/triage_records`, so it must not be able to escape
/// the store root:
/// - Rejects empty or whitespace-only strings
/// - Rejects `.` and `..`
/// - Bounds the length
/// - Restricts characters to ASCII alphanumerics, `.`, `-` and `_`
///
/// # Errors
///
/// Returns [`TriageError::Configuration`] if the namespace is invalid.
pub fn validate_namespace(namespace: &str) -> CoreResult<()> {
    const MAX_NAMESPACE_LEN: usize = 128;

    if namespace.trim().is_empty() {
        return Err(TriageError::Configuration(
            "namespace cannot be empty".into(),
        ));
    }

    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(TriageError::Configuration(format!(
            "namespace exceeds maximum length of {} characters",
            MAX_NAMESPACE_LEN
        )));
    }

    if namespace == "." || namespace == ".." {
        return Err(TriageError::Configuration(
            "namespace cannot be a relative path component".into(),
        ));
    }

    let ok = namespace
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));

    if !ok {
        return Err(TriageError::Configuration(
            "namespace contains invalid characters (only alphanumeric, '.', '-', '_' allowed)"
                .into(),
        ));
    }

    Ok(())
}
