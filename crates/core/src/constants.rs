//! Constants used throughout the triage core crate.
//!
//! Scoring thresholds and the fixed explanation/facility text live here so the exact strings
//! stay in one place; tests compare against them byte for byte.

/// Default root directory of the file-backed record store.
pub const DEFAULT_DATA_DIR: &str = "triage_data";

/// Default pause before a submission resolves, in milliseconds.
pub const DEFAULT_PROCESSING_LATENCY_MS: u64 = 1500;

/// Top-level directory of every record collection path.
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";

/// Directory holding one sub-directory per identity.
pub const USERS_DIR_NAME: &str = "users";

/// Collection name for triage assessments.
pub const TRIAGE_RECORDS_COLLECTION: &str = "triage_records";

/// Extension of stored record documents.
pub const RECORD_FILE_EXTENSION: &str = "json";

/// Symptom phrases that mark a critical presentation.
pub const CRITICAL_SYMPTOMS: [&str; 2] = ["chest pain", "difficulty breathing"];

/// Symptom phrases that suggest a common illness.
pub const COMMON_ILLNESS_SYMPTOMS: [&str; 2] = ["fever", "vomiting"];

pub const CRITICAL_SYMPTOM_POINTS: u32 = 5;
pub const COMMON_ILLNESS_POINTS: u32 = 2;
pub const ELEVATED_HEART_RATE_POINTS: u32 = 3;
pub const LOW_OXYGEN_POINTS: u32 = 4;

/// Heart rates strictly above this value add points.
pub const HEART_RATE_THRESHOLD_BPM: i64 = 120;

/// SpO2 readings strictly below this value add points and force the trauma center.
pub const SPO2_THRESHOLD_PERCENT: f64 = 95.0;

pub const MIN_SEVERITY_SCORE: u32 = 1;
pub const MAX_SEVERITY_SCORE: u32 = 10;

pub const EXPLANATION_PREAMBLE: &str = "Based on your reported symptoms.";
pub const CRITICAL_SYMPTOM_SENTENCE: &str = " Critical symptoms indicate a high priority.";
pub const COMMON_ILLNESS_SENTENCE: &str = " Symptoms suggest a common illness.";
pub const ELEVATED_HEART_RATE_SENTENCE: &str = " Elevated heart rate is a significant concern.";
pub const LOW_OXYGEN_SENTENCE: &str = " Low oxygen saturation requires immediate attention.";

pub const GENERAL_HOSPITAL_NAME: &str = "General Hospital";
pub const GENERAL_HOSPITAL_INFO: &str = "A local hospital with a standard emergency department.";
pub const TRAUMA_CENTER_NAME: &str = "City Trauma Center";
pub const TRAUMA_CENTER_INFO: &str =
    "A major trauma center with advanced cardiac and respiratory care.";

/// Symptom previews in history listings are cut to this many characters.
pub const SYMPTOM_PREVIEW_CHARS: usize = 50;

/// Sessions that have not saved a record yet; past this many the oldest is forgotten.
pub const MAX_PENDING_SESSIONS: usize = 10_000;
