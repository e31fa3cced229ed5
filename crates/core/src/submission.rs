//! Submission pipeline.
//!
//! One submission: check the caller is signed in, claim the per-identity in-flight slot, wait
//! the configured processing latency, score, stamp, persist. Persisting is best effort: a failed
//! or disabled write is logged and the scoring result is still returned.

use crate::error::{CoreResult, TriageError};
use crate::ids::{IdentityId, RecordId};
use crate::scoring::score;
use crate::store::{run_blocking, AssessmentDocument, CollectionPath, RecordStore};
use crate::triage::{TriageForm, TriageResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Result of a submission as shown to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub result: TriageResult,
    /// Id of the stored record; `None` when the write failed or persistence is disabled.
    pub record_id: Option<RecordId>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionOutcome {
    pub fn persisted(&self) -> bool {
        self.record_id.is_some()
    }
}

/// Where accepted submissions are written.
#[derive(Clone)]
pub struct Persistence {
    pub store: Arc<dyn RecordStore>,
    pub namespace: String,
}

/// Orchestrates scoring and persistence of form submissions.
#[derive(Clone)]
pub struct SubmissionPipeline {
    persistence: Option<Persistence>,
    processing_latency: Duration,
    in_flight: Arc<Mutex<HashSet<IdentityId>>>,
}

/// Claim on the in-flight slot of one identity; released on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    identity: IdentityId,
    in_flight: Arc<Mutex<HashSet<IdentityId>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.identity);
        }
    }
}

impl SubmissionPipeline {
    pub fn new(persistence: Option<Persistence>, processing_latency: Duration) -> Self {
        Self {
            persistence,
            processing_latency,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.persistence.is_some()
    }

    /// Claims the in-flight slot for `identity`.
    ///
    /// # Errors
    ///
    /// [`TriageError::SubmissionInFlight`] while another submission for the same identity runs.
    pub fn begin(&self, identity: IdentityId) -> CoreResult<InFlightGuard> {
        let mut set = self.in_flight.lock().map_err(|_| TriageError::LockPoisoned)?;
        if !set.insert(identity) {
            return Err(TriageError::SubmissionInFlight);
        }
        Ok(InFlightGuard {
            identity,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Runs one submission.
    ///
    /// # Errors
    ///
    /// - [`TriageError::NotAuthenticated`] if `identity` is `None`; nothing is written.
    /// - [`TriageError::SubmissionInFlight`] if this identity already has a submission running.
    ///
    /// Persistence failures are not errors; see [`SubmissionOutcome::record_id`].
    pub async fn submit(
        &self,
        identity: Option<IdentityId>,
        form: TriageForm,
    ) -> CoreResult<SubmissionOutcome> {
        let identity = identity.ok_or(TriageError::NotAuthenticated)?;
        let _guard = self.begin(identity)?;

        if !self.processing_latency.is_zero() {
            tokio::time::sleep(self.processing_latency).await;
        }

        let result = score(&form.symptoms, &form.vitals);
        let submitted_at = Utc::now();
        let record_id = self.persist(identity, form, &result, submitted_at).await;

        Ok(SubmissionOutcome {
            result,
            record_id,
            submitted_at,
        })
    }

    async fn persist(
        &self,
        identity: IdentityId,
        form: TriageForm,
        result: &TriageResult,
        submitted_at: DateTime<Utc>,
    ) -> Option<RecordId> {
        let Some(persistence) = &self.persistence else {
            tracing::error!(
                "not saving assessment for {}: {}",
                identity,
                TriageError::PersistenceDisabled
            );
            return None;
        };

        let document = AssessmentDocument::new(form, result, submitted_at);
        let created = match CollectionPath::triage_records(&persistence.namespace, identity) {
            Ok(path) => {
                let store = Arc::clone(&persistence.store);
                run_blocking(move || store.create(&path, &document)).await
            }
            Err(e) => Err(e),
        };

        match created {
            Ok(id) => {
                tracing::info!("saved assessment {} for {}", id, identity);
                Some(id)
            }
            Err(e) if e.is_persistence() => {
                tracing::error!("error saving assessment for {}: {}", identity, e);
                None
            }
            Err(e) => {
                tracing::error!("assessment for {} not saved: {}", identity, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileRecordStore, Subscription};
    use crate::triage::VitalSigns;
    use tempfile::TempDir;

    struct FailingStore;

    impl RecordStore for FailingStore {
        fn create(&self, _: &CollectionPath, _: &AssessmentDocument) -> CoreResult<RecordId> {
            Err(TriageError::FileWrite(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn subscribe(&self, _: &CollectionPath) -> CoreResult<Subscription> {
            Err(TriageError::PersistenceDisabled)
        }
    }

    fn chest_pain_form() -> TriageForm {
        TriageForm::new(
            "I have chest pain",
            VitalSigns {
                heart_rate: "130".into(),
                blood_pressure: "120/80".into(),
                temperature: "99".into(),
                spo2: "92".into(),
            },
        )
    }

    fn file_pipeline(dir: &TempDir) -> (SubmissionPipeline, Arc<FileRecordStore>) {
        let store = Arc::new(FileRecordStore::new(dir.path()));
        let pipeline = SubmissionPipeline::new(
            Some(Persistence {
                store: store.clone(),
                namespace: "test-app".into(),
            }),
            Duration::ZERO,
        );
        (pipeline, store)
    }

    #[tokio::test]
    async fn submission_scores_and_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (pipeline, store) = file_pipeline(&temp_dir);
        let identity = IdentityId::anonymous();

        let outcome = pipeline
            .submit(Some(identity), chest_pain_form())
            .await
            .expect("submission should succeed");

        assert_eq!(outcome.result.severity_score, 10);
        assert!(outcome.persisted());

        let path = CollectionPath::triage_records("test-app", identity).unwrap();
        let mut sub = store.subscribe(&path).unwrap();
        let snapshot = sub.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(Some(snapshot[0].id), outcome.record_id);
        assert_eq!(snapshot[0].document.symptoms, "I have chest pain");
        assert_eq!(snapshot[0].document.vitals.blood_pressure, "120/80");
        assert_eq!(snapshot[0].document.recommended_hospital, "City Trauma Center");
        let stored_at = snapshot[0]
            .document
            .timestamp
            .as_ref()
            .and_then(|t| t.to_datetime())
            .expect("stored timestamp should parse");
        assert_eq!(
            stored_at.timestamp_millis(),
            outcome.submitted_at.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn submission_without_identity_is_blocked() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (pipeline, _store) = file_pipeline(&temp_dir);

        let err = pipeline
            .submit(None, chest_pain_form())
            .await
            .expect_err("anonymous callers without a session cannot submit");
        assert!(matches!(err, TriageError::NotAuthenticated));
        assert!(!temp_dir.path().join("artifacts").exists());
    }

    #[tokio::test]
    async fn failed_write_still_returns_result() {
        let pipeline = SubmissionPipeline::new(
            Some(Persistence {
                store: Arc::new(FailingStore),
                namespace: "test-app".into(),
            }),
            Duration::ZERO,
        );

        let outcome = pipeline
            .submit(Some(IdentityId::anonymous()), chest_pain_form())
            .await
            .expect("scoring should not be rolled back");
        assert_eq!(outcome.result.severity_score, 10);
        assert!(!outcome.persisted());
    }

    #[tokio::test]
    async fn disabled_persistence_still_scores() {
        let pipeline = SubmissionPipeline::new(None, Duration::ZERO);
        assert!(!pipeline.persistence_enabled());

        let outcome = pipeline
            .submit(
                Some(IdentityId::anonymous()),
                TriageForm::new("mild headache", VitalSigns::default()),
            )
            .await
            .unwrap();
        assert_eq!(outcome.result.severity_score, 1);
        assert_eq!(outcome.record_id, None);
    }

    #[tokio::test]
    async fn second_submission_while_in_flight_is_rejected() {
        let pipeline = SubmissionPipeline::new(None, Duration::ZERO);
        let identity = IdentityId::anonymous();

        let guard = pipeline.begin(identity).expect("first claim");
        let err = pipeline
            .submit(Some(identity), chest_pain_form())
            .await
            .expect_err("re-entrant submission should be rejected");
        assert!(matches!(err, TriageError::SubmissionInFlight));

        // Other identities are unaffected.
        assert!(pipeline
            .submit(Some(IdentityId::anonymous()), chest_pain_form())
            .await
            .is_ok());

        drop(guard);
        assert!(pipeline.submit(Some(identity), chest_pain_form()).await.is_ok());
    }

    #[tokio::test]
    async fn guard_is_released_after_each_submission() {
        let pipeline = SubmissionPipeline::new(None, Duration::ZERO);
        let identity = IdentityId::anonymous();

        pipeline.submit(Some(identity), chest_pain_form()).await.unwrap();
        pipeline.submit(Some(identity), chest_pain_form()).await.unwrap();
        assert!(pipeline.in_flight.lock().unwrap().is_empty());
    }
}
