//! Stored assessment documents.
//!
//! Documents are read tolerantly: every field has a default and `null` or wrong-typed values
//! fall back to it, so a record written by an older client (or by hand) still loads.
//! Timestamps may be an RFC 3339 string, a `{ "seconds": .., "nanoseconds": .. }` object or a
//! number of epoch milliseconds; anything else is kept as unparseable text.

use crate::ids::RecordId;
use crate::lenient;
use crate::triage::{TriageForm, TriageResult, VitalSigns};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Creation time as found in a stored document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTimestamp {
    Text(String),
    Epoch { seconds: i64, nanoseconds: u32 },
    Millis(i64),
}

impl RecordTimestamp {
    /// The RFC 3339 form written for new records (millisecond precision, `Z` suffix).
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        RecordTimestamp::Text(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Converts to a point in time; `None` when the stored value is not a valid instant.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            RecordTimestamp::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            RecordTimestamp::Epoch {
                seconds,
                nanoseconds,
            } => DateTime::<Utc>::from_timestamp(*seconds, *nanoseconds),
            RecordTimestamp::Millis(millis) => DateTime::<Utc>::from_timestamp_millis(*millis),
        }
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<RecordTimestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_i64() {
            Some(millis) => RecordTimestamp::Millis(millis),
            None => match n.as_f64() {
                Some(millis) if millis.is_finite() && millis.abs() < i64::MAX as f64 => {
                    RecordTimestamp::Millis(millis.round() as i64)
                }
                _ => RecordTimestamp::Text(n.to_string()),
            },
        }),
        other => Some(
            RecordTimestamp::deserialize(&other)
                .unwrap_or_else(|_| RecordTimestamp::Text(other.to_string())),
        ),
    })
}

/// Body of one persisted assessment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssessmentDocument {
    #[serde(deserialize_with = "lenient::string")]
    pub symptoms: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub vitals: VitalSigns,
    #[serde(deserialize_with = "lenient::score")]
    pub severity_score: u32,
    #[serde(deserialize_with = "lenient::string")]
    pub explanation: String,
    #[serde(deserialize_with = "lenient::string")]
    pub recommended_hospital: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hospital_info: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<RecordTimestamp>,
}

impl AssessmentDocument {
    /// Combines a submission, its scoring result and the submission time.
    pub fn new(form: TriageForm, result: &TriageResult, submitted_at: DateTime<Utc>) -> Self {
        Self {
            symptoms: form.symptoms,
            vitals: form.vitals,
            severity_score: result.severity_score,
            explanation: result.explanation.clone(),
            recommended_hospital: result.recommended_hospital.clone(),
            hospital_info: result.hospital_info.clone(),
            timestamp: Some(RecordTimestamp::from_datetime(submitted_at)),
        }
    }
}

/// A document together with the id the store assigned to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub document: AssessmentDocument,
}
