//! Triage service facade.
//!
//! Everything a presentation shell needs, wired from one [`CoreConfig`]: pure scoring,
//! session sign-in, submissions, and history (one-shot or live).

use crate::config::CoreConfig;
use crate::error::{CoreResult, TriageError};
use crate::history::{HistoryFeed, TriageAssessment};
use crate::identity::{establish_session, IdentityProvider, LocalIdentityProvider, Session};
use crate::ids::IdentityId;
use crate::scoring::score;
use crate::store::{run_blocking, CollectionPath, FileRecordStore, RecordStore};
use crate::submission::{Persistence, SubmissionOutcome, SubmissionPipeline};
use crate::triage::{TriageForm, TriageResult};
use std::sync::Arc;

#[derive(Clone)]
pub struct TriageService {
    cfg: Arc<CoreConfig>,
    store: Option<Arc<dyn RecordStore>>,
    identity: Arc<dyn IdentityProvider>,
    pipeline: SubmissionPipeline,
}

impl TriageService {
    /// Builds the service with the file-backed store under the configured data directory.
    ///
    /// Identities that already own records are registered as known sessions, so users can
    /// resume after a restart.
    pub fn from_config(cfg: Arc<CoreConfig>) -> Self {
        let Some(namespace) = cfg.namespace().map(str::to_owned) else {
            tracing::warn!("starting without a record store; submissions will not be saved");
            return Self::with_parts(cfg, None, Arc::new(LocalIdentityProvider::new()));
        };

        let store = FileRecordStore::new(cfg.data_dir());
        let known = store.known_identities(&namespace).unwrap_or_else(|e| {
            tracing::warn!("could not list existing identities: {}", e);
            Vec::new()
        });
        tracing::info!(
            "record store at {} ({} known identities)",
            store.root().display(),
            known.len()
        );

        Self::with_parts(
            cfg,
            Some(Arc::new(store)),
            Arc::new(LocalIdentityProvider::with_sessions(known)),
        )
    }

    /// Builds the service from explicit parts. `store` is ignored if the configuration has no
    /// namespace.
    pub fn with_parts(
        cfg: Arc<CoreConfig>,
        store: Option<Arc<dyn RecordStore>>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let store = store.filter(|_| cfg.persistence_enabled());
        let persistence = store
            .clone()
            .zip(cfg.namespace().map(str::to_owned))
            .map(|(store, namespace)| Persistence { store, namespace });
        let pipeline = SubmissionPipeline::new(persistence, cfg.processing_latency());

        Self {
            cfg,
            store,
            identity,
            pipeline,
        }
    }

    pub fn persistence_enabled(&self) -> bool {
        self.pipeline.persistence_enabled()
    }

    /// API key callers must present, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.cfg.api_key()
    }

    pub fn score(&self, form: &TriageForm) -> TriageResult {
        score(&form.symptoms, &form.vitals)
    }

    /// Establishes a session. An absent `token` falls back to the configured initial token.
    ///
    /// # Errors
    ///
    /// [`TriageError::NotAuthenticated`] if no sign-in method succeeded.
    pub fn sign_in(&self, session_id: Option<&str>, token: Option<&str>) -> CoreResult<Session> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .or(self.cfg.initial_auth_token());
        let session = establish_session(self.identity.as_ref(), session_id, token)
            .ok_or(TriageError::NotAuthenticated)?;
        tracing::info!("signed in {} ({})", session.identity, session.method);
        Ok(session)
    }

    /// Resolves a user id sent by a client to a session this service issued.
    ///
    /// # Errors
    ///
    /// [`TriageError::InvalidInput`] for a malformed id, [`TriageError::UnknownSession`] for an
    /// id that was never issued.
    pub fn resolve_user(&self, user_id: &str) -> CoreResult<IdentityId> {
        self.identity.resume(user_id.trim())
    }

    /// Runs the submission pipeline for `user_id`. A missing or blank id is unauthenticated.
    ///
    /// Once a record is saved the session is confirmed and no longer subject to eviction.
    pub async fn submit(
        &self,
        user_id: Option<&str>,
        form: TriageForm,
    ) -> CoreResult<SubmissionOutcome> {
        let identity = match user_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Some(self.resolve_user(id)?),
            None => None,
        };
        let outcome = self.pipeline.submit(identity, form).await?;
        if let Some(identity) = identity.filter(|_| outcome.persisted()) {
            if let Err(e) = self.identity.confirm(identity) {
                tracing::warn!("could not confirm session {}: {}", identity, e);
            }
        }
        Ok(outcome)
    }

    /// Current history of `user_id`, newest first.
    pub async fn history(&self, user_id: &str) -> CoreResult<Vec<TriageAssessment>> {
        let mut feed = self.watch_history(user_id).await?;
        let history = feed.next().await.unwrap_or_default();
        feed.cancel();
        Ok(history)
    }

    /// Live history of `user_id`: the current list, then a new list after every change.
    ///
    /// # Errors
    ///
    /// [`TriageError::PersistenceDisabled`] when no store is configured, plus the errors of
    /// [`TriageService::resolve_user`].
    pub async fn watch_history(&self, user_id: &str) -> CoreResult<HistoryFeed> {
        let identity = self.resolve_user(user_id)?;
        let store = self
            .store
            .clone()
            .ok_or(TriageError::PersistenceDisabled)?;
        let namespace = self.cfg.namespace().ok_or(TriageError::PersistenceDisabled)?;
        let path = CollectionPath::triage_records(namespace, identity)?;
        let subscription = run_blocking(move || store.subscribe(&path)).await?;
        Ok(HistoryFeed::new(subscription))
    }
}
