//! # Triage Core
//!
//! Core logic of the OpenHealth triage service:
//! - Severity scoring of reported symptoms and vital signs ([`scoring`])
//! - A per-identity record store with realtime subscriptions ([`store`])
//! - Session identities ([`identity`])
//! - The submission pipeline and history projection ([`submission`], [`history`])
//! - Presentation shell state ([`app_state`])
//!
//! **No API concerns**: HTTP/gRPC servers and API key checks belong in `api-grpc`, `api-rest`,
//! or `api-shared`.

pub mod app_state;
pub mod config;
pub mod constants;
pub mod error;
pub mod history;
pub mod identity;
pub mod ids;
mod lenient;
pub mod scoring;
pub mod service;
pub mod store;
pub mod submission;
pub mod triage;
pub mod validation;
pub mod wire;

// Use the shared api-shared crate for generated protobuf types.
pub use api_shared::pb;

pub use app_state::{ShellAction, ShellState, View};
pub use config::CoreConfig;
pub use error::{CoreResult, TriageError};
pub use history::{HistoryFeed, TriageAssessment};
pub use identity::{IdentityProvider, LocalIdentityProvider, Session, SignInMethod};
pub use ids::{IdentityId, RecordId};
pub use scoring::score;
pub use service::TriageService;
pub use store::{FileRecordStore, RecordStore, Subscription};
pub use submission::{SubmissionOutcome, SubmissionPipeline};
pub use triage::{TriageForm, TriageResult, VitalSigns};
