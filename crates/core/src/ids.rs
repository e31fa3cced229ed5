//! Identity and record identifiers.
//!
//! Both identifiers use the same canonical form: **32 lowercase hexadecimal characters** without
//! hyphens, i.e. `Uuid::simple()`. They double as directory and file names in the record store,
//! so externally supplied values are validated strictly instead of normalised.
//!
//! - [`IdentityId`] names one session/user. Anonymous sign-in mints a random v4 id; token
//!   sign-in derives a v5 id from the token so the same token always yields the same identity.
//! - [`RecordId`] names one stored assessment and is assigned by the store on creation.

use crate::error::{CoreResult, TriageError};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Namespace for deriving token-based identities (UUID v5).
const TOKEN_IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6f70_656e_6865_616c_7468_7472_6961_6765);

/// Returns true if `input` is 32 lowercase hex characters.
pub fn is_canonical(input: &str) -> bool {
    input.len() == 32
        && input
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn parse_canonical(input: &str, what: &str) -> CoreResult<Uuid> {
    if !is_canonical(input) {
        return Err(TriageError::InvalidInput(format!(
            "{what} must be 32 lowercase hex characters without hyphens, got: '{input}'"
        )));
    }
    Uuid::parse_str(input).map_err(|e| TriageError::InvalidInput(format!("{what}: {e}")))
}

/// Opaque per-session identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdentityId(Uuid);

impl IdentityId {
    /// Mints a fresh identity for anonymous sign-in.
    pub fn anonymous() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives the stable identity belonging to a sign-in token.
    pub fn from_token(token: &str) -> Self {
        Self(Uuid::new_v5(&TOKEN_IDENTITY_NAMESPACE, token.as_bytes()))
    }

    /// Validates an externally supplied identity string.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::InvalidInput`] unless `input` is canonical.
    pub fn parse(input: &str) -> CoreResult<Self> {
        parse_canonical(input, "identity").map(Self)
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for IdentityId {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Store-assigned identifier of a persisted assessment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordId(Uuid);

impl RecordId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates a record id, e.g. one recovered from a stored file name.
    pub fn parse(input: &str) -> CoreResult<Self> {
        parse_canonical(input, "record id").map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_ids_are_canonical_and_distinct() {
        let a = IdentityId::anonymous();
        let b = IdentityId::anonymous();

        assert!(is_canonical(&a.to_string()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_ids_are_stable() {
        let first = IdentityId::from_token("hosted-token-123");
        let again = IdentityId::from_token("hosted-token-123");
        let other = IdentityId::from_token("hosted-token-124");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(is_canonical(&first.to_string()));
    }

    #[test]
    fn parse_accepts_canonical_form() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id: IdentityId = canonical.parse().expect("canonical id should parse");
        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn parse_rejects_non_canonical_forms() {
        for bad in [
            "550e8400-e29b-41d4-a716-446655440000",
            "550E8400E29B41D4A716446655440000",
            "550e8400e29b41d4a71644665544000",
            "../../../../etc/passwd0000000000",
            "",
        ] {
            let err = IdentityId::parse(bad).expect_err("non-canonical id should fail");
            assert!(
                matches!(err, TriageError::InvalidInput(ref msg) if msg.contains("32 lowercase hex")),
                "unexpected error for {bad:?}: {err}"
            );
        }
    }

    #[test]
    fn record_ids_round_trip_through_display() {
        let id = RecordId::new();
        let parsed = RecordId::parse(&id.to_string()).expect("display form should parse");
        assert_eq!(id, parsed);
    }
}
