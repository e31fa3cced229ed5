//! Presentation shell state.
//!
//! Shells (CLI, long-lived clients) keep their view state in a [`ShellState`] and change it
//! only through [`ShellState::apply`]. A submission cannot start while another one is loading or
//! while no identity is signed in.

use crate::history::TriageAssessment;
use crate::identity::Session;
use crate::ids::IdentityId;
use crate::submission::SubmissionOutcome;
use crate::triage::TriageResult;

/// Which screen a shell shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Form,
    Results,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellAction {
    SignedIn(Session),
    SignedOut,
    SubmissionStarted,
    SubmissionFinished(SubmissionOutcome),
    SubmissionFailed(String),
    HistoryUpdated(Vec<TriageAssessment>),
    /// Back to an empty form.
    Reset,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShellState {
    pub user_id: Option<IdentityId>,
    pub view: View,
    pub loading: bool,
    pub last_result: Option<TriageResult>,
    /// Whether the last result was stored.
    pub persisted: bool,
    pub error: Option<String>,
    pub history: Vec<TriageAssessment>,
}

impl ShellState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_submit(&self) -> bool {
        self.user_id.is_some() && !self.loading
    }

    /// Applies `action`. Returns `false` if the action was refused and the state is unchanged.
    pub fn apply(&mut self, action: ShellAction) -> bool {
        match action {
            ShellAction::SignedIn(session) => {
                if self.user_id != Some(session.identity) {
                    self.history.clear();
                }
                self.user_id = Some(session.identity);
            }
            ShellAction::SignedOut => {
                *self = Self::default();
            }
            ShellAction::SubmissionStarted => {
                if !self.can_submit() {
                    return false;
                }
                self.loading = true;
                self.error = None;
            }
            ShellAction::SubmissionFinished(outcome) => {
                self.loading = false;
                self.persisted = outcome.persisted();
                self.last_result = Some(outcome.result);
                self.view = View::Results;
            }
            ShellAction::SubmissionFailed(message) => {
                self.loading = false;
                self.error = Some(message);
            }
            ShellAction::HistoryUpdated(history) => {
                self.history = history;
            }
            ShellAction::Reset => {
                self.view = View::Form;
                self.last_result = None;
                self.persisted = false;
                self.error = None;
            }
        }
        true
    }
}
