//! History projection.
//!
//! Turns raw store snapshots into the display list: each record's timestamp is normalised to a
//! point in time and the whole collection is re-sorted newest first. Every snapshot replaces the
//! previous list outright.
//!
//! Timestamp normalisation:
//! - RFC 3339 text, `{seconds, nanoseconds}` or epoch milliseconds → that instant
//! - missing → the time of projection
//! - present but unparseable → the Unix epoch, so such records sort last

use crate::constants::SYMPTOM_PREVIEW_CHARS;
use crate::ids::RecordId;
use crate::store::{StoredRecord, Subscription};
use crate::triage::VitalSigns;
use chrono::{DateTime, Utc};

/// One past assessment, ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriageAssessment {
    pub id: RecordId,
    pub symptoms: String,
    pub vitals: VitalSigns,
    pub severity_score: u32,
    pub explanation: String,
    pub recommended_hospital: String,
    pub hospital_info: String,
    pub timestamp: DateTime<Utc>,
}

impl TriageAssessment {
    fn from_record(record: &StoredRecord, now: DateTime<Utc>) -> Self {
        let doc = &record.document;
        let timestamp = match &doc.timestamp {
            None => now,
            Some(ts) => ts.to_datetime().unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        };

        Self {
            id: record.id,
            symptoms: doc.symptoms.clone(),
            vitals: doc.vitals.clone(),
            severity_score: doc.severity_score,
            explanation: doc.explanation.clone(),
            recommended_hospital: doc.recommended_hospital.clone(),
            hospital_info: doc.hospital_info.clone(),
            timestamp,
        }
    }

    /// Symptom text cut to 50 characters, with `...` appended when cut.
    pub fn symptom_preview(&self) -> String {
        if self.symptoms.chars().count() > SYMPTOM_PREVIEW_CHARS {
            let cut: String = self.symptoms.chars().take(SYMPTOM_PREVIEW_CHARS).collect();
            format!("{cut}...")
        } else {
            self.symptoms.clone()
        }
    }
}

/// Projects a snapshot into the display list, newest first.
///
/// Records with equal timestamps keep their snapshot order.
pub fn project<'a>(
    records: impl IntoIterator<Item = &'a StoredRecord>,
    now: DateTime<Utc>,
) -> Vec<TriageAssessment> {
    let mut history: Vec<TriageAssessment> = records
        .into_iter()
        .map(|r| TriageAssessment::from_record(r, now))
        .collect();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history
}

/// A store subscription that yields projected history lists.
#[derive(Debug)]
pub struct HistoryFeed {
    subscription: Subscription,
}

impl HistoryFeed {
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Waits for the next snapshot and projects it. `None` once the feed is closed.
    pub async fn next(&mut self) -> Option<Vec<TriageAssessment>> {
        let snapshot = self.subscription.next().await?;
        Some(project(snapshot.iter(), Utc::now()))
    }

    /// Stops the feed; no further lists are delivered.
    pub fn cancel(&mut self) {
        self.subscription.cancel();
    }
}
