//! Error types for the triage core.
//!
//! Variants group into the failure classes the service distinguishes:
//! configuration (persistence disabled, scoring unaffected), authentication (no record
//! created), and persistence (logged, the triage result is still returned). Numeric parse
//! failures in vital signs are never errors; the corresponding scoring rule simply does not fire.

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid store configuration: {0}")]
    Configuration(String),
    #[error("failed to parse hosted store configuration: {0}")]
    ConfigurationJson(serde_json::Error),
    #[error("persistence is disabled: no valid store configuration")]
    PersistenceDisabled,

    #[error("no signed-in identity")]
    NotAuthenticated,
    #[error("unknown session: {0}")]
    UnknownSession(String),
    #[error("sign-in token cannot be empty")]
    EmptyToken,
    #[error("a submission is already in flight for this identity")]
    SubmissionInFlight,

    #[error("failed to create store directory: {0}")]
    StoreDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("record store task failed: {0}")]
    StoreTask(tokio::task::JoinError),
    #[error("internal lock poisoned")]
    LockPoisoned,
}

impl TriageError {
    /// True for failures of the identity layer.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            TriageError::NotAuthenticated | TriageError::UnknownSession(_) | TriageError::EmptyToken
        )
    }

    /// True for failures of the record store.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            TriageError::PersistenceDisabled
                | TriageError::StoreDirCreation(_)
                | TriageError::FileWrite(_)
                | TriageError::FileRead(_)
                | TriageError::Serialization(_)
                | TriageError::StoreTask(_)
        )
    }
}

pub type CoreResult<T> = std::result::Result<T, TriageError>;
