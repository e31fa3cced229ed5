//! Conversions between core types and the generated `pb` messages shared by the API crates.

use crate::history::TriageAssessment;
use crate::identity::Session;
use crate::submission::SubmissionOutcome;
use crate::triage::{TriageForm, TriageResult, VitalSigns};
use api_shared::pb;
use chrono::SecondsFormat;

impl From<pb::Vitals> for VitalSigns {
    fn from(v: pb::Vitals) -> Self {
        Self {
            heart_rate: v.heart_rate,
            blood_pressure: v.blood_pressure,
            temperature: v.temperature,
            spo2: v.spo2,
        }
    }
}

impl From<VitalSigns> for pb::Vitals {
    fn from(v: VitalSigns) -> Self {
        Self {
            heart_rate: v.heart_rate,
            blood_pressure: v.blood_pressure,
            temperature: v.temperature,
            spo2: v.spo2,
        }
    }
}

impl From<pb::ScoreReq> for TriageForm {
    fn from(req: pb::ScoreReq) -> Self {
        TriageForm::new(req.symptoms, req.vitals.map(Into::into).unwrap_or_default())
    }
}

impl From<TriageResult> for pb::TriageResult {
    fn from(r: TriageResult) -> Self {
        Self {
            severity_score: r.severity_score,
            explanation: r.explanation,
            recommended_hospital: r.recommended_hospital,
            hospital_info: r.hospital_info,
        }
    }
}

impl From<Session> for pb::SignInRes {
    fn from(s: Session) -> Self {
        Self {
            user_id: s.identity.to_string(),
            method: s.method.to_string(),
        }
    }
}

impl From<SubmissionOutcome> for pb::SubmitRes {
    fn from(o: SubmissionOutcome) -> Self {
        Self {
            persisted: o.persisted(),
            record_id: o.record_id.map(|id| id.to_string()).unwrap_or_default(),
            timestamp: o.submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            result: Some(o.result.into()),
        }
    }
}

impl From<TriageAssessment> for pb::Assessment {
    fn from(a: TriageAssessment) -> Self {
        Self {
            id: a.id.to_string(),
            symptoms: a.symptoms,
            vitals: Some(a.vitals.into()),
            severity_score: a.severity_score,
            explanation: a.explanation,
            recommended_hospital: a.recommended_hospital,
            hospital_info: a.hospital_info,
            timestamp: a.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Wraps a projected history list into its response message.
pub fn history_res(history: Vec<TriageAssessment>) -> pb::HistoryRes {
    pb::HistoryRes {
        assessments: history.into_iter().map(Into::into).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdentityId;
    use crate::identity::SignInMethod;
    use crate::scoring::score;

    #[test]
    fn score_request_without_vitals_defaults_to_empty() {
        let form: TriageForm = pb::ScoreReq {
            symptoms: "fever".into(),
            vitals: None,
        }
        .into();
        assert_eq!(form.vitals, VitalSigns::default());
    }

    #[test]
    fn submit_response_reports_missing_record() {
        let outcome = SubmissionOutcome {
            result: score("mild headache", &VitalSigns::default()),
            record_id: None,
            submitted_at: chrono::Utc::now(),
        };
        let res: pb::SubmitRes = outcome.into();

        assert!(!res.persisted);
        assert_eq!(res.record_id, "");
        assert_eq!(res.result.map(|r| r.recommended_hospital).as_deref(), Some("General Hospital"));
        assert!(res.timestamp.ends_with('Z'));
    }

    #[test]
    fn sign_in_response_uses_canonical_id() {
        let identity = IdentityId::from_token("tok");
        let res: pb::SignInRes = Session {
            identity,
            method: SignInMethod::Token,
        }
        .into();
        assert_eq!(res.user_id.len(), 32);
        assert_eq!(res.method, "token");
    }
}
