//! File-backed record store.
//!
//! Each record is one JSON document named `<record-id>.json` inside its collection directory
//! under the store root. Subscribers share one `watch` channel per collection; every `create`
//! reloads the collection and publishes the new snapshot to it. Channels nobody listens to any
//! more are dropped on the next `create` or `subscribe`.
//!
//! All methods do blocking file I/O; async callers go through [`super::run_blocking`].

use super::{AssessmentDocument, CollectionPath, RecordStore, Snapshot, StoredRecord, Subscription};
use crate::constants::{ARTIFACTS_DIR_NAME, RECORD_FILE_EXTENSION, USERS_DIR_NAME};
use crate::error::{CoreResult, TriageError};
use crate::ids::{IdentityId, RecordId};
use crate::validation::validate_namespace;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

type ChannelMap = HashMap<CollectionPath, watch::Sender<Snapshot>>;

/// Record store rooted at a local directory.
#[derive(Debug)]
pub struct FileRecordStore {
    root: PathBuf,
    /// Live feeds keyed by collection. The lock also serialises writes.
    channels: Mutex<ChannelMap>,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_channels(&self) -> CoreResult<MutexGuard<'_, ChannelMap>> {
        let mut channels = self
            .channels
            .lock()
            .map_err(|_| TriageError::LockPoisoned)?;
        channels.retain(|_, sender| sender.receiver_count() > 0);
        Ok(channels)
    }

    fn collection_dir(&self, path: &CollectionPath) -> PathBuf {
        self.root.join(path.relative_dir())
    }

    /// Identities that own a record directory under `namespace`.
    ///
    /// Used to re-register sessions after a restart. Directories whose name is not a canonical
    /// id are ignored.
    pub fn known_identities(&self, namespace: &str) -> CoreResult<Vec<IdentityId>> {
        validate_namespace(namespace)?;
        let users_dir = self
            .root
            .join(ARTIFACTS_DIR_NAME)
            .join(namespace)
            .join(USERS_DIR_NAME);

        let entries = match fs::read_dir(&users_dir) {
            Ok(it) => it,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TriageError::FileRead(e)),
        };

        Ok(entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| IdentityId::parse(name).ok())
            })
            .collect())
    }

    /// Reads every document of a collection, ordered by record id.
    ///
    /// A missing directory is an empty collection. Files that are not `<canonical-id>.json` or
    /// that fail to parse are logged and skipped.
    fn load_collection(&self, path: &CollectionPath) -> CoreResult<Snapshot> {
        let dir = self.collection_dir(path);
        let entries = match fs::read_dir(&dir) {
            Ok(it) => it,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Arc::new(Vec::new()));
            }
            Err(e) => return Err(TriageError::FileRead(e)),
        };

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let file_path = entry.path();
            if !file_path.is_file()
                || file_path.extension().and_then(|e| e.to_str()) != Some(RECORD_FILE_EXTENSION)
            {
                continue;
            }

            let Some(id) = file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| RecordId::parse(s).ok())
            else {
                tracing::warn!("skipping record with non-canonical name: {}", file_path.display());
                continue;
            };

            let contents = match fs::read_to_string(&file_path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("failed to read record {}: {}", file_path.display(), e);
                    continue;
                }
            };

            match serde_json::from_str::<AssessmentDocument>(&contents) {
                Ok(document) => records.push(StoredRecord { id, document }),
                Err(e) => {
                    tracing::warn!("failed to parse record {}: {}", file_path.display(), e);
                }
            }
        }

        records.sort_by_key(|r| r.id.to_string());
        Ok(Arc::new(records))
    }
}

impl RecordStore for FileRecordStore {
    fn create(&self, path: &CollectionPath, document: &AssessmentDocument) -> CoreResult<RecordId> {
        let channels = self.lock_channels()?;

        let dir = self.collection_dir(path);
        fs::create_dir_all(&dir).map_err(TriageError::StoreDirCreation)?;

        let id = RecordId::new();
        let json = serde_json::to_string_pretty(document).map_err(TriageError::Serialization)?;
        let file_path = dir.join(format!("{id}.{RECORD_FILE_EXTENSION}"));
        fs::write(&file_path, json).map_err(TriageError::FileWrite)?;
        tracing::debug!("created record {} in {}", id, path);

        if let Some(sender) = channels.get(path) {
            match self.load_collection(path) {
                Ok(snapshot) => {
                    sender.send_replace(snapshot);
                }
                Err(e) => {
                    tracing::error!("failed to publish snapshot for {}: {}", path, e);
                }
            }
        }

        Ok(id)
    }

    fn subscribe(&self, path: &CollectionPath) -> CoreResult<Subscription> {
        let mut channels = self.lock_channels()?;

        let snapshot = self.load_collection(path)?;
        let rx = match channels.get(path) {
            Some(sender) => {
                // Files may have changed outside this process; only wake peers on a real change.
                sender.send_if_modified(|current| {
                    if **current == *snapshot {
                        return false;
                    }
                    *current = snapshot;
                    true
                });
                sender.subscribe()
            }
            None => {
                let (tx, rx) = watch::channel(snapshot);
                channels.insert(path.clone(), tx);
                rx
            }
        };

        Ok(Subscription::new(rx))
    }
}
