//! Session identity.
//!
//! A session is established in the order: resume an existing session, sign in with a token,
//! fall back to anonymous sign-in. Failures along the way are logged rather than propagated;
//! only when every step fails does [`establish_session`] return `None`, and no record can be
//! created for that caller.
//!
//! Freshly issued sessions are *pending* until a record is saved for them. Pending sessions are
//! bounded; once the limit is reached the oldest one is forgotten. Confirmed sessions are kept.

use crate::constants::MAX_PENDING_SESSIONS;
use crate::error::{CoreResult, TriageError};
use crate::ids::IdentityId;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::RwLock;

/// How a session identity was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignInMethod {
    Existing,
    Token,
    Anonymous,
}

impl fmt::Display for SignInMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignInMethod::Existing => "existing",
            SignInMethod::Token => "token",
            SignInMethod::Anonymous => "anonymous",
        };
        f.write_str(s)
    }
}

/// A signed-in session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub identity: IdentityId,
    pub method: SignInMethod,
}

/// Supplier of per-session identities.
pub trait IdentityProvider: Send + Sync {
    /// Returns the identity if `session_id` names a session this provider issued.
    fn resume(&self, session_id: &str) -> CoreResult<IdentityId>;

    /// Signs in with an opaque token. The same token always maps to the same identity.
    fn sign_in_with_token(&self, token: &str) -> CoreResult<IdentityId>;

    /// Signs in without credentials, minting a new identity.
    fn sign_in_anonymously(&self) -> CoreResult<IdentityId>;

    /// Marks `identity` as owning stored records, so its session is never forgotten.
    fn confirm(&self, _identity: IdentityId) -> CoreResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SessionRegistry {
    confirmed: HashSet<IdentityId>,
    pending: HashSet<IdentityId>,
    /// Pending sessions, oldest first.
    issued: VecDeque<IdentityId>,
}

impl SessionRegistry {
    fn contains(&self, identity: &IdentityId) -> bool {
        self.confirmed.contains(identity) || self.pending.contains(identity)
    }

    fn issue(&mut self, identity: IdentityId, limit: usize) {
        if self.contains(&identity) {
            return;
        }
        while self.pending.len() >= limit.max(1) {
            let Some(oldest) = self.issued.pop_front() else {
                break;
            };
            self.pending.remove(&oldest);
            tracing::debug!("forgetting unused session {}", oldest);
        }
        self.pending.insert(identity);
        self.issued.push_back(identity);
    }

    fn confirm(&mut self, identity: IdentityId) {
        if self.pending.remove(&identity) {
            self.issued.retain(|id| *id != identity);
        }
        self.confirmed.insert(identity);
    }
}

/// In-process identity provider with a registry of issued sessions.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    sessions: RwLock<SessionRegistry>,
    pending_limit: usize,
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::with_pending_limit(MAX_PENDING_SESSIONS)
    }
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that forgets the oldest unconfirmed session once `limit` of them exist.
    pub fn with_pending_limit(limit: usize) -> Self {
        Self {
            sessions: RwLock::new(SessionRegistry::default()),
            pending_limit: limit,
        }
    }

    /// Provider that already knows the given sessions, e.g. identities found in the store.
    /// Seeded sessions count as confirmed.
    pub fn with_sessions(identities: impl IntoIterator<Item = IdentityId>) -> Self {
        Self {
            sessions: RwLock::new(SessionRegistry {
                confirmed: identities.into_iter().collect(),
                ..SessionRegistry::default()
            }),
            pending_limit: MAX_PENDING_SESSIONS,
        }
    }

    /// True if `identity` was issued by (or seeded into) this provider and not yet forgotten.
    pub fn is_known(&self, identity: IdentityId) -> CoreResult<bool> {
        Ok(self
            .sessions
            .read()
            .map_err(|_| TriageError::LockPoisoned)?
            .contains(&identity))
    }

    fn register(&self, identity: IdentityId) -> CoreResult<IdentityId> {
        self.sessions
            .write()
            .map_err(|_| TriageError::LockPoisoned)?
            .issue(identity, self.pending_limit);
        Ok(identity)
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn resume(&self, session_id: &str) -> CoreResult<IdentityId> {
        let identity = IdentityId::parse(session_id)?;
        if self.is_known(identity)? {
            Ok(identity)
        } else {
            Err(TriageError::UnknownSession(session_id.to_string()))
        }
    }

    fn sign_in_with_token(&self, token: &str) -> CoreResult<IdentityId> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TriageError::EmptyToken);
        }
        self.register(IdentityId::from_token(token))
    }

    fn sign_in_anonymously(&self) -> CoreResult<IdentityId> {
        self.register(IdentityId::anonymous())
    }

    fn confirm(&self, identity: IdentityId) -> CoreResult<()> {
        self.sessions
            .write()
            .map_err(|_| TriageError::LockPoisoned)?
            .confirm(identity);
        Ok(())
    }
}

/// Establishes a session: existing session, then token sign-in, then anonymous sign-in.
///
/// Empty `session_id`/`token` values count as absent.
pub fn establish_session(
    provider: &dyn IdentityProvider,
    session_id: Option<&str>,
    token: Option<&str>,
) -> Option<Session> {
    if let Some(session_id) = session_id.filter(|s| !s.trim().is_empty()) {
        match provider.resume(session_id) {
            Ok(identity) => {
                return Some(Session {
                    identity,
                    method: SignInMethod::Existing,
                });
            }
            Err(e) => tracing::warn!("could not resume session: {}", e),
        }
    }

    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        match provider.sign_in_with_token(token) {
            Ok(identity) => {
                return Some(Session {
                    identity,
                    method: SignInMethod::Token,
                });
            }
            Err(e) => tracing::error!("token sign-in failed: {}", e),
        }
    }

    match provider.sign_in_anonymously() {
        Ok(identity) => Some(Session {
            identity,
            method: SignInMethod::Anonymous,
        }),
        Err(e) => {
            tracing::error!("anonymous sign-in failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenProvider;

    impl IdentityProvider for BrokenProvider {
        fn resume(&self, session_id: &str) -> CoreResult<IdentityId> {
            Err(TriageError::UnknownSession(session_id.into()))
        }
        fn sign_in_with_token(&self, _token: &str) -> CoreResult<IdentityId> {
            Err(TriageError::EmptyToken)
        }
        fn sign_in_anonymously(&self) -> CoreResult<IdentityId> {
            Err(TriageError::NotAuthenticated)
        }
    }

    #[test]
    fn anonymous_sign_in_is_the_fallback() {
        let provider = LocalIdentityProvider::new();
        let session = establish_session(&provider, None, None).expect("anonymous session");
        assert_eq!(session.method, SignInMethod::Anonymous);
    }

    #[test]
    fn token_sign_in_is_stable() {
        let provider = LocalIdentityProvider::new();
        let first = establish_session(&provider, None, Some("tok")).unwrap();
        let second = establish_session(&provider, None, Some("tok")).unwrap();

        assert_eq!(first.method, SignInMethod::Token);
        assert_eq!(first.identity, second.identity);
    }

    #[test]
    fn issued_sessions_can_be_resumed() {
        let provider = LocalIdentityProvider::new();
        let issued = establish_session(&provider, None, None).unwrap();

        let resumed =
            establish_session(&provider, Some(&issued.identity.to_string()), Some("tok")).unwrap();
        assert_eq!(resumed.method, SignInMethod::Existing);
        assert_eq!(resumed.identity, issued.identity);
    }

    #[test]
    fn unknown_session_falls_through_to_token() {
        let provider = LocalIdentityProvider::new();
        let stranger = IdentityId::anonymous().to_string();

        let session = establish_session(&provider, Some(&stranger), Some("tok")).unwrap();
        assert_eq!(session.method, SignInMethod::Token);
        assert_eq!(session.identity, IdentityId::from_token("tok"));
    }

    #[test]
    fn blank_inputs_count_as_absent() {
        let provider = LocalIdentityProvider::new();
        let session = establish_session(&provider, Some("  "), Some("")).unwrap();
        assert_eq!(session.method, SignInMethod::Anonymous);
    }

    #[test]
    fn resume_rejects_unknown_and_malformed_ids() {
        let provider = LocalIdentityProvider::new();
        assert!(matches!(
            provider.resume(&IdentityId::anonymous().to_string()),
            Err(TriageError::UnknownSession(_))
        ));
        assert!(matches!(
            provider.resume("not-an-id"),
            Err(TriageError::InvalidInput(_))
        ));
        assert!(matches!(
            provider.sign_in_with_token("   "),
            Err(TriageError::EmptyToken)
        ));
    }

    #[test]
    fn seeded_sessions_survive_a_restart() {
        let earlier = IdentityId::anonymous();
        let provider = LocalIdentityProvider::with_sessions([earlier]);

        let session = establish_session(&provider, Some(&earlier.to_string()), None).unwrap();
        assert_eq!(session.method, SignInMethod::Existing);
        assert_eq!(session.identity, earlier);
    }

    #[test]
    fn unconfirmed_sessions_are_bounded() {
        let provider = LocalIdentityProvider::with_pending_limit(2);
        let first = provider.sign_in_anonymously().unwrap();
        let second = provider.sign_in_anonymously().unwrap();
        provider.confirm(second).unwrap();

        let third = provider.sign_in_anonymously().unwrap();
        let fourth = provider.sign_in_anonymously().unwrap();

        assert!(!provider.is_known(first).unwrap(), "oldest pending session is forgotten");
        assert!(provider.is_known(second).unwrap(), "confirmed sessions are kept");
        assert!(provider.is_known(third).unwrap());
        assert!(provider.is_known(fourth).unwrap());

        let registry = provider.sessions.read().unwrap();
        assert_eq!(registry.pending.len(), 2);
        assert_eq!(registry.issued.len(), 2);
    }

    #[test]
    fn repeated_token_sign_in_does_not_grow_the_registry() {
        let provider = LocalIdentityProvider::with_pending_limit(2);
        let kept = provider.sign_in_with_token("tok").unwrap();
        for _ in 0..5 {
            provider.sign_in_with_token("tok").unwrap();
        }
        provider.sign_in_anonymously().unwrap();

        assert!(provider.is_known(kept).unwrap());
        assert_eq!(provider.sessions.read().unwrap().issued.len(), 2);
    }

    #[test]
    fn total_failure_yields_no_session() {
        assert_eq!(
            establish_session(&BrokenProvider, Some("x"), Some("y")),
            None
        );
    }
}
