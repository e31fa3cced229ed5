//! Record store adapter.
//!
//! The store is reached only through [`RecordStore`]: `create` appends one document to a
//! collection and returns the id it assigned, `subscribe` opens a realtime feed that pushes the
//! *full* collection every time it changes.
//!
//! Collections are addressed by [`CollectionPath`]:
//!
//! ```text
//! artifacts/<namespace>/users/<identity>/triage_records
//! ```

pub mod document;
pub mod file;

pub use document::{AssessmentDocument, RecordTimestamp, StoredRecord};
pub use file::FileRecordStore;

use crate::constants::{ARTIFACTS_DIR_NAME, TRIAGE_RECORDS_COLLECTION, USERS_DIR_NAME};
use crate::ids::{IdentityId, RecordId};
use crate::validation::validate_namespace;
use crate::{CoreResult, TriageError};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Full contents of one collection at a point in time.
pub type Snapshot = Arc<Vec<StoredRecord>>;

/// Location of a per-identity record collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    namespace: String,
    identity: IdentityId,
}

impl CollectionPath {
    /// Path of the triage records owned by `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TriageError::Configuration`] if `namespace` is not a safe path segment.
    pub fn triage_records(namespace: &str, identity: IdentityId) -> CoreResult<Self> {
        validate_namespace(namespace)?;
        Ok(Self {
            namespace: namespace.to_string(),
            identity,
        })
    }

    /// Directory of the collection relative to a store root.
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(ARTIFACTS_DIR_NAME)
            .join(&self.namespace)
            .join(USERS_DIR_NAME)
            .join(self.identity.to_string())
            .join(TRIAGE_RECORDS_COLLECTION)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{ARTIFACTS_DIR_NAME}/{}/{USERS_DIR_NAME}/{}/{TRIAGE_RECORDS_COLLECTION}",
            self.namespace, self.identity
        )
    }
}

/// Persistence contract consumed by the submission pipeline and history feeds.
pub trait RecordStore: Send + Sync {
    /// Appends `document` to the collection and returns the id assigned to it.
    fn create(&self, path: &CollectionPath, document: &AssessmentDocument) -> CoreResult<RecordId>;

    /// Opens a realtime feed of the collection. The first [`Subscription::next`] yields the
    /// current contents; each later one waits for the next change.
    fn subscribe(&self, path: &CollectionPath) -> CoreResult<Subscription>;
}

/// Runs a store call on the blocking thread pool, so file access never stalls async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> CoreResult<T>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(TriageError::StoreTask)?
}

/// Handle on a realtime collection feed.
///
/// Dropping the handle unsubscribes. [`Subscription::cancel`] does the same while keeping the
/// handle around; once cancelled, no further snapshots are delivered.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<watch::Receiver<Snapshot>>,
    primed: bool,
}

impl Subscription {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>) -> Self {
        Self {
            rx: Some(rx),
            primed: false,
        }
    }

    /// Waits for the next snapshot. Returns `None` once cancelled or when the store goes away.
    pub async fn next(&mut self) -> Option<Snapshot> {
        let rx = self.rx.as_mut()?;
        if !self.primed {
            self.primed = true;
            return Some(rx.borrow_and_update().clone());
        }

        if rx.changed().await.is_err() {
            self.rx = None;
            return None;
        }
        Some(rx.borrow_and_update().clone())
    }

    pub fn cancel(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}
